//! RFC-6901 JSON pointers and their CBOR form.
//!
//! A CBOR-pointer is an array of tag-37 byte strings, one per segment, each holding the
//! segment's text JSON-escaped. [`json_to_cbor_pointer`] emits the indefinite framing
//! (`9f ... ff`); readers accept either framing and plain text segments as well.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::error::{err, Error, ErrorCode};
use crate::json::{escape, unescape};
use crate::json_cbor::encode_json_string;
use crate::pool::{Offsets, Scratch};
use crate::sink::{Sink, SliceSink, VecSink};
use crate::utf8;
use crate::value::tag;
use crate::wire::{
    read_len, read_string, read_u8, read_uint, split, BREAK, MAJOR_ARRAY, MAJOR_TAG, MAJOR_TEXT,
};

const INDEFINITE_ARRAY: u8 = 0x9f;

/// A parsed RFC-6901 pointer: the list of reference tokens, unescaped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    /// The empty pointer, addressing the whole document.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse pointer text such as `/a/0/b~1c`.
    ///
    /// # Errors
    ///
    /// Returns `PointerSyntax` when non-empty text does not start with `/` or contains
    /// a `~` not followed by `0` or `1`.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut segments = Vec::new();
        for_each_segment(text.as_bytes(), |seg, off| {
            let mut s = String::with_capacity(seg.len());
            unescape_segment(seg, off, |chunk| s.push_str(chunk))?;
            segments.push(s);
            Ok(())
        })?;
        Ok(Self { segments })
    }

    /// Reference tokens in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` for the root pointer.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a reference token.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Remove and return the last reference token.
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// Encode as a CBOR-pointer into `out`; returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `BufferFull` when `out` is too small.
    pub fn to_cbor(&self, out: &mut [u8]) -> Result<usize, Error> {
        let mut sink = SliceSink::new(out);
        let mut escaped = Scratch::acquire();
        sink.write_u8(INDEFINITE_ARRAY)?;
        for seg in &self.segments {
            escaped.clear();
            escape(&mut VecSink::new(&mut escaped), seg.as_bytes())?;
            encode_json_string(&mut sink, &escaped)?;
        }
        sink.write_u8(BREAK)?;
        Ok(sink.position())
    }

    /// Decode a CBOR-pointer at the start of `data`; returns it with the bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns `PointerSyntax` when `data` is not an array of text or tag-37 strings.
    pub fn from_cbor(data: &[u8]) -> Result<(Self, usize), Error> {
        let mut buf = Scratch::acquire();
        let mut ends = Offsets::acquire();
        let used = cbor_segments(data, &mut buf, &mut ends)?;
        let mut segments = Vec::with_capacity(ends.len());
        let mut start = 0;
        for &end in ends.iter() {
            segments.push(String::from(utf8::validate(&buf[start..end], start)?));
            start = end;
        }
        Ok((Self { segments }, used))
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.segments {
            f.write_str("/")?;
            let mut run = 0;
            for (i, c) in seg.char_indices() {
                let esc = match c {
                    '~' => "~0",
                    '/' => "~1",
                    _ => continue,
                };
                f.write_str(&seg[run..i])?;
                f.write_str(esc)?;
                run = i + 1;
            }
            f.write_str(&seg[run..])?;
        }
        Ok(())
    }
}

impl FromStr for JsonPointer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Self::parse(s)
    }
}

/// Call `f` with every raw (still `~`-escaped) segment of pointer text and its offset.
fn for_each_segment<F>(text: &[u8], mut f: F) -> Result<(), Error>
where
    F: FnMut(&[u8], usize) -> Result<(), Error>,
{
    if text.is_empty() {
        return Ok(());
    }
    if text[0] != b'/' {
        return Err(err(ErrorCode::PointerSyntax, 0));
    }
    let mut start = 1;
    loop {
        let end = text[start..]
            .iter()
            .position(|&b| b == b'/')
            .map_or(text.len(), |i| start + i);
        f(&text[start..end], start)?;
        if end == text.len() {
            return Ok(());
        }
        start = end + 1;
    }
}

/// Undo `~0` and `~1`, passing unescaped UTF-8 chunks to `out`.
fn unescape_segment<F>(seg: &[u8], offset: usize, mut out: F) -> Result<(), Error>
where
    F: FnMut(&str),
{
    let text = utf8::validate(seg, offset)?;
    let mut run = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'~' {
            i += 1;
            continue;
        }
        out(&text[run..i]);
        match bytes.get(i + 1) {
            Some(b'0') => out("~"),
            Some(b'1') => out("/"),
            _ => return Err(err(ErrorCode::PointerSyntax, offset + i)),
        }
        i += 2;
        run = i;
    }
    out(&text[run..]);
    Ok(())
}

/// Convert RFC-6901 pointer text to a CBOR-pointer in `out`; returns bytes written.
///
/// # Errors
///
/// Returns `PointerSyntax` for invalid pointer text and `BufferFull` when `out` is too
/// small.
pub fn json_to_cbor_pointer(text: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    let mut sink = SliceSink::new(out);
    let mut seg_text = Scratch::acquire();
    let mut escaped = Scratch::acquire();
    sink.write_u8(INDEFINITE_ARRAY)?;
    for_each_segment(text, |seg, off| {
        seg_text.clear();
        unescape_segment(seg, off, |chunk| seg_text.extend_from_slice(chunk.as_bytes()))?;
        escaped.clear();
        escape(&mut VecSink::new(&mut escaped), &seg_text)?;
        encode_json_string(&mut sink, &escaped)
    })?;
    sink.write_u8(BREAK)?;
    Ok(sink.position())
}

/// Convert a CBOR-pointer at the start of `data` to RFC-6901 text in `out`.
///
/// Returns `(read, written)`.
///
/// # Errors
///
/// Returns `PointerSyntax` when `data` is not a CBOR-pointer and `BufferFull` when `out`
/// is too small.
pub fn cbor_to_json_pointer(data: &[u8], out: &mut [u8]) -> Result<(usize, usize), Error> {
    let mut buf = Scratch::acquire();
    let mut ends = Offsets::acquire();
    let used = cbor_segments(data, &mut buf, &mut ends)?;
    let mut sink = SliceSink::new(out);
    let mut start = 0;
    for &end in ends.iter() {
        sink.write_u8(b'/')?;
        let seg = &buf[start..end];
        let mut run = 0;
        for (i, &b) in seg.iter().enumerate() {
            let esc: &[u8] = match b {
                b'~' => b"~0",
                b'/' => b"~1",
                _ => continue,
            };
            sink.write(&seg[run..i])?;
            sink.write(esc)?;
            run = i + 1;
        }
        sink.write(&seg[run..])?;
        start = end;
    }
    Ok((used, sink.position()))
}

/// Decode the segments of a CBOR-pointer, unescaped, into `buf`; `ends` receives the
/// end offset of each segment. Returns the bytes consumed from `data`.
pub(crate) fn cbor_segments(
    data: &[u8],
    buf: &mut Vec<u8>,
    ends: &mut Vec<usize>,
) -> Result<usize, Error> {
    let syntax = |e: Error| err(ErrorCode::PointerSyntax, e.offset);
    let mut pos = 0;
    let (major, ai) = split(read_u8(data, &mut pos).map_err(syntax)?);
    if major != MAJOR_ARRAY {
        return Err(err(ErrorCode::PointerSyntax, 0));
    }
    let mut remaining = read_len(data, &mut pos, ai, 0).map_err(syntax)?;
    loop {
        match remaining {
            Some(0) => break,
            Some(ref mut n) => *n -= 1,
            None if data.get(pos) == Some(&BREAK) => {
                pos += 1;
                break;
            }
            None => {}
        }
        let off = pos;
        let ib = *data
            .get(pos)
            .ok_or_else(|| err(ErrorCode::PointerSyntax, pos))?;
        let (major, ai) = split(ib);
        match major {
            MAJOR_TEXT => {
                let text = read_string(data, &mut pos).map_err(syntax)?;
                buf.extend_from_slice(utf8::validate(text, off)?.as_bytes());
            }
            MAJOR_TAG => {
                pos += 1;
                let number = read_uint(data, &mut pos, ai, off).map_err(syntax)?;
                if number != tag::JSON_STRING {
                    return Err(err(ErrorCode::PointerSyntax, off));
                }
                let raw = read_string(data, &mut pos).map_err(syntax)?;
                unescape(&mut VecSink::new(buf), utf8::validate(raw, off)?.as_bytes(), off)?;
            }
            _ => return Err(err(ErrorCode::PointerSyntax, off)),
        }
        ends.push(buf.len());
    }
    Ok(pos)
}

/// Segments of a CBOR-pointer, decoded once into pooled scratch.
pub(crate) struct Segments {
    buf: Scratch,
    ends: Offsets,
}

impl Segments {
    pub(crate) fn decode(cptr: &[u8]) -> Result<Self, Error> {
        let mut buf = Scratch::acquire();
        let mut ends = Offsets::acquire();
        let used = cbor_segments(cptr, &mut buf, &mut ends)?;
        if used != cptr.len() {
            return Err(err(ErrorCode::PointerSyntax, used));
        }
        Ok(Self { buf, ends })
    }

    pub(crate) fn len(&self) -> usize {
        self.ends.len()
    }

    pub(crate) fn get(&self, i: usize) -> &[u8] {
        let start = if i == 0 { 0 } else { self.ends[i - 1] };
        &self.buf[start..self.ends[i]]
    }
}
