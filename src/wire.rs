//! Byte-level CBOR primitives: big-endian readers, the minimal-width header writer and
//! the item-length walk used by the pointer walker.

use alloc::vec::Vec;

use crate::error::{err, Error, ErrorCode};
use crate::sink::Sink;

/// CBOR major types.
pub const MAJOR_UINT: u8 = 0;
pub const MAJOR_NINT: u8 = 1;
pub const MAJOR_BYTES: u8 = 2;
pub const MAJOR_TEXT: u8 = 3;
pub const MAJOR_ARRAY: u8 = 4;
pub const MAJOR_MAP: u8 = 5;
pub const MAJOR_TAG: u8 = 6;

/// Additional-info value announcing indefinite length.
pub const INFO_INDEFINITE: u8 = 31;
/// The break-stop byte.
pub const BREAK: u8 = 0xff;

const INLINE_DEPTH: usize = 64;
const INDEFINITE_FRAME: usize = usize::MAX;

pub fn read_u8(data: &[u8], pos: &mut usize) -> Result<u8, Error> {
    let off = *pos;
    let b = *data
        .get(*pos)
        .ok_or_else(|| err(ErrorCode::UnexpectedEof, off))?;
    *pos += 1;
    Ok(b)
}

pub fn read_exact<'a>(data: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8], Error> {
    let off = *pos;
    let end = pos
        .checked_add(n)
        .ok_or_else(|| err(ErrorCode::LengthOverflow, off))?;
    if end > data.len() {
        return Err(err(ErrorCode::UnexpectedEof, off));
    }
    let s = &data[*pos..end];
    *pos = end;
    Ok(s)
}

pub fn read_be_u16(data: &[u8], pos: &mut usize) -> Result<u16, Error> {
    let s = read_exact(data, pos, 2)?;
    Ok(u16::from_be_bytes([s[0], s[1]]))
}

pub fn read_be_u32(data: &[u8], pos: &mut usize) -> Result<u32, Error> {
    let s = read_exact(data, pos, 4)?;
    Ok(u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
}

pub fn read_be_u64(data: &[u8], pos: &mut usize) -> Result<u64, Error> {
    let s = read_exact(data, pos, 8)?;
    Ok(u64::from_be_bytes([
        s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7],
    ]))
}

/// Read the argument announced by `ai`. Non-minimal widths are accepted.
pub fn read_uint(data: &[u8], pos: &mut usize, ai: u8, off: usize) -> Result<u64, Error> {
    match ai {
        0..=23 => Ok(u64::from(ai)),
        24 => Ok(u64::from(read_u8(data, pos)?)),
        25 => Ok(u64::from(read_be_u16(data, pos)?)),
        26 => Ok(u64::from(read_be_u32(data, pos)?)),
        27 => read_be_u64(data, pos),
        INFO_INDEFINITE => Err(err(ErrorCode::IndefiniteInvalid, off)),
        _ => Err(err(ErrorCode::ReservedAdditionalInfo, off)),
    }
}

/// Read a container or string length; `None` means indefinite.
pub fn read_len(data: &[u8], pos: &mut usize, ai: u8, off: usize) -> Result<Option<usize>, Error> {
    if ai == INFO_INDEFINITE {
        return Ok(None);
    }
    let len = read_uint(data, pos, ai, off)?;
    len_to_usize(len, off).map(Some)
}

/// Read a definite-length byte or text string item at `*pos`; returns its body.
///
/// # Errors
///
/// Returns `MalformedTag` for any other item and `IndefiniteChunks` for chunked strings.
pub fn read_string<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a [u8], Error> {
    let off = *pos;
    let (major, ai) = split(read_u8(data, pos)?);
    if major != MAJOR_BYTES && major != MAJOR_TEXT {
        return Err(err(ErrorCode::MalformedTag, off));
    }
    let len = read_len(data, pos, ai, off)?.ok_or_else(|| err(ErrorCode::IndefiniteChunks, off))?;
    read_exact(data, pos, len)
}

pub fn len_to_usize(len: u64, off: usize) -> Result<usize, Error> {
    usize::try_from(len).map_err(|_| err(ErrorCode::LengthOverflow, off))
}

/// Split a header byte into `(major, additional info)`.
#[inline]
#[must_use]
pub const fn split(ib: u8) -> (u8, u8) {
    (ib >> 5, ib & 0x1f)
}

/// Encode a minimal-width header into a stack buffer; returns the buffer and its used length.
#[must_use]
pub fn header_bytes(major: u8, value: u64) -> ([u8; 9], usize) {
    debug_assert!(major <= 7);
    let mut out = [0u8; 9];
    let m = major << 5;
    if let Ok(v8) = u8::try_from(value) {
        if v8 < 24 {
            out[0] = m | v8;
            return (out, 1);
        }
        out[0] = m | 24;
        out[1] = v8;
        return (out, 2);
    }
    if let Ok(v16) = u16::try_from(value) {
        out[0] = m | 25;
        out[1..3].copy_from_slice(&v16.to_be_bytes());
        return (out, 3);
    }
    if let Ok(v32) = u32::try_from(value) {
        out[0] = m | 26;
        out[1..5].copy_from_slice(&v32.to_be_bytes());
        return (out, 5);
    }
    out[0] = m | 27;
    out[1..9].copy_from_slice(&value.to_be_bytes());
    (out, 9)
}

/// Write a minimal-width header.
pub fn write_header<S: Sink>(sink: &mut S, major: u8, value: u64) -> Result<(), Error> {
    let (buf, n) = header_bytes(major, value);
    sink.write(&buf[..n])
}

/// Write a minimal-width header for a `usize` length.
pub fn write_len<S: Sink>(sink: &mut S, major: u8, len: usize) -> Result<(), Error> {
    let len = u64::try_from(len).map_err(|_| err(ErrorCode::LengthOverflow, sink.position()))?;
    write_header(sink, major, len)
}

struct SmallStack<const N: usize> {
    inline: [usize; N],
    len: usize,
    overflow: Vec<usize>,
}

impl<const N: usize> SmallStack<N> {
    const fn new() -> Self {
        Self {
            inline: [0; N],
            len: 0,
            overflow: Vec::new(),
        }
    }

    fn push(&mut self, value: usize) {
        if !self.overflow.is_empty() || self.len == N {
            self.overflow.push(value);
            return;
        }
        self.inline[self.len] = value;
        self.len += 1;
    }

    fn peek_mut(&mut self) -> Option<&mut usize> {
        if let Some(v) = self.overflow.last_mut() {
            return Some(v);
        }
        if self.len == 0 {
            None
        } else {
            Some(&mut self.inline[self.len - 1])
        }
    }

    fn pop(&mut self) -> Option<usize> {
        if let Some(v) = self.overflow.pop() {
            return Some(v);
        }
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            Some(self.inline[self.len])
        }
    }
}

/// Return the offset one past the data item starting at `start`.
///
/// Nested containers are walked header by header without decoding leaves; both
/// length-prefixed and indefinite framings are accepted.
///
/// # Errors
///
/// Returns `Malformed` for truncated items, reserved headers and misplaced break-stops.
pub fn item_end(data: &[u8], start: usize) -> Result<usize, Error> {
    let mut pos = start;
    let mut stack = SmallStack::<INLINE_DEPTH>::new();
    stack.push(1);

    while let Some(remaining) = stack.peek_mut() {
        if *remaining == INDEFINITE_FRAME {
            if data.get(pos) == Some(&BREAK) {
                pos += 1;
                stack.pop();
                continue;
            }
        } else if *remaining == 0 {
            stack.pop();
            continue;
        } else {
            *remaining -= 1;
        }

        let off = pos;
        let (major, ai) = split(read_u8(data, &mut pos)?);
        match major {
            MAJOR_UINT | MAJOR_NINT => {
                read_uint(data, &mut pos, ai, off)?;
            }
            MAJOR_BYTES | MAJOR_TEXT => match read_len(data, &mut pos, ai, off)? {
                Some(len) => {
                    read_exact(data, &mut pos, len)?;
                }
                None => stack.push(INDEFINITE_FRAME),
            },
            MAJOR_ARRAY => match read_len(data, &mut pos, ai, off)? {
                Some(len) => stack.push(frame_len(len, off)?),
                None => stack.push(INDEFINITE_FRAME),
            },
            MAJOR_MAP => match read_len(data, &mut pos, ai, off)? {
                Some(len) => {
                    let items = len
                        .checked_mul(2)
                        .ok_or_else(|| err(ErrorCode::LengthOverflow, off))?;
                    stack.push(frame_len(items, off)?);
                }
                None => stack.push(INDEFINITE_FRAME),
            },
            MAJOR_TAG => {
                read_uint(data, &mut pos, ai, off)?;
                stack.push(1);
            }
            _ => match ai {
                0..=23 => {}
                24 => {
                    read_u8(data, &mut pos)?;
                }
                25 => {
                    read_be_u16(data, &mut pos)?;
                }
                26 => {
                    read_be_u32(data, &mut pos)?;
                }
                27 => {
                    read_be_u64(data, &mut pos)?;
                }
                INFO_INDEFINITE => return Err(err(ErrorCode::UnexpectedBreak, off)),
                _ => return Err(err(ErrorCode::ReservedAdditionalInfo, off)),
            },
        }
    }

    Ok(pos)
}

fn frame_len(len: usize, off: usize) -> Result<usize, Error> {
    if len == INDEFINITE_FRAME {
        return Err(err(ErrorCode::LengthOverflow, off));
    }
    Ok(len)
}
