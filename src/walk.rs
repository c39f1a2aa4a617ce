//! Locating the item a CBOR-pointer addresses, without decoding the document.
//!
//! Each step reads one container header, then skips children with [`item_end`] until
//! the segment's index or key is reached. Tag 55799 in front of a container is
//! transparent.

use crate::error::{err, Error, ErrorCode};
use crate::json::unescape;
use crate::pointer::Segments;
use crate::pool::Scratch;
use crate::sink::VecSink;
use crate::value::tag;
use crate::wire::{
    item_end, read_len, read_string, read_u8, read_uint, split, BREAK, MAJOR_ARRAY, MAJOR_MAP,
    MAJOR_TAG, MAJOR_TEXT,
};

/// The shape of a container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Array,
    Map,
}

/// A container located in the document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Container {
    pub kind: Kind,
    /// Offset of the header byte.
    pub header: usize,
    /// Offset of the first child.
    pub body: usize,
    /// Element count for arrays, pair count for maps; `None` when indefinite.
    pub count: Option<usize>,
}

impl Container {
    /// Read the container header at `at`, skipping self-describe tags.
    pub(crate) fn read(doc: &[u8], at: usize) -> Result<Self, Error> {
        let mut pos = at;
        loop {
            let off = pos;
            let (major, ai) = split(read_u8(doc, &mut pos)?);
            let kind = match major {
                MAJOR_ARRAY => Kind::Array,
                MAJOR_MAP => Kind::Map,
                MAJOR_TAG if read_uint(doc, &mut pos, ai, off)? == tag::SELF_DESCRIBE => continue,
                _ => return Err(err(ErrorCode::NotAContainer, off)),
            };
            let count = read_len(doc, &mut pos, ai, off)?;
            return Ok(Self {
                kind,
                header: off,
                body: pos,
                count,
            });
        }
    }

    /// Offset where the next child would be appended: the break-stop of an indefinite
    /// container, or the end of the last child.
    pub(crate) fn items_end(&self, doc: &[u8]) -> Result<usize, Error> {
        let end = item_end(doc, self.header)?;
        Ok(if self.count.is_none() { end - 1 } else { end })
    }

    /// Whether `pos` sits past the last child.
    fn at_end(&self, doc: &[u8], pos: usize, seen: usize) -> Result<bool, Error> {
        match self.count {
            Some(n) => Ok(seen == n),
            None => match doc.get(pos) {
                Some(&BREAK) => Ok(true),
                Some(_) => Ok(false),
                None => Err(err(ErrorCode::UnexpectedEof, pos)),
            },
        }
    }
}

/// The child slot a pointer resolved to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    /// The directly enclosing container; `None` for the root.
    pub parent: Option<Container>,
    /// Start of the entry: the key for map pairs, the value for array elements.
    pub entry: usize,
    pub value_start: usize,
    pub value_end: usize,
}

/// The outcome of a walk.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target {
    Found(Slot),
    /// The final segment names a key absent from `parent`.
    MissingKey { parent: Container },
}

/// Parse an array index segment; `-` resolves to `None`.
pub(crate) fn parse_index(seg: &[u8], off: usize) -> Result<Option<usize>, Error> {
    match seg {
        b"-" => Ok(None),
        [b'0'] => Ok(Some(0)),
        [b'1'..=b'9', rest @ ..] if rest.iter().all(u8::is_ascii_digit) => {
            let mut n: usize = 0;
            for &d in seg {
                n = n
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(usize::from(d - b'0')))
                    .ok_or_else(|| err(ErrorCode::IndexOutOfRange, off))?;
            }
            Ok(Some(n))
        }
        _ => Err(err(ErrorCode::BadIndex, off)),
    }
}

/// Compare a map key item at `*pos` with `seg`, advancing past the key.
fn key_matches(
    doc: &[u8],
    pos: &mut usize,
    seg: &[u8],
    scratch: &mut Scratch,
) -> Result<bool, Error> {
    let off = *pos;
    let ib = *doc
        .get(off)
        .ok_or_else(|| err(ErrorCode::UnexpectedEof, off))?;
    let (major, ai) = split(ib);
    match major {
        MAJOR_TEXT => Ok(read_string(doc, pos)? == seg),
        MAJOR_TAG => {
            *pos += 1;
            if read_uint(doc, pos, ai, off)? != tag::JSON_STRING {
                return Err(err(ErrorCode::MapKeyMustBeText, off));
            }
            let raw = read_string(doc, pos)?;
            if !raw.contains(&b'\\') {
                return Ok(raw == seg);
            }
            scratch.clear();
            unescape(&mut VecSink::new(scratch), raw, off)?;
            Ok(scratch.as_slice() == seg)
        }
        _ => Err(err(ErrorCode::MapKeyMustBeText, off)),
    }
}

fn find_in_array(doc: &[u8], c: Container, seg: &[u8], off: usize) -> Result<Slot, Error> {
    let index = parse_index(seg, off)?;
    let mut pos = c.body;
    let mut seen = 0;
    let mut last = None;
    while !c.at_end(doc, pos, seen)? {
        let end = item_end(doc, pos)?;
        if index == Some(seen) {
            return Ok(Slot {
                parent: Some(c),
                entry: pos,
                value_start: pos,
                value_end: end,
            });
        }
        last = Some((pos, end));
        pos = end;
        seen += 1;
    }
    match (index, last) {
        (None, Some((start, end))) => Ok(Slot {
            parent: Some(c),
            entry: start,
            value_start: start,
            value_end: end,
        }),
        _ => Err(err(ErrorCode::IndexOutOfRange, off)),
    }
}

fn find_in_map(
    doc: &[u8],
    c: Container,
    seg: &[u8],
    scratch: &mut Scratch,
) -> Result<Option<Slot>, Error> {
    let mut pos = c.body;
    let mut seen = 0;
    while !c.at_end(doc, pos, seen)? {
        let entry = pos;
        let hit = key_matches(doc, &mut pos, seg, scratch)?;
        let end = item_end(doc, pos)?;
        if hit {
            return Ok(Some(Slot {
                parent: Some(c),
                entry,
                value_start: pos,
                value_end: end,
            }));
        }
        pos = end;
        seen += 1;
    }
    Ok(None)
}

/// Resolve `segs` against the document item starting at offset 0.
///
/// With `upsert`, an absent final map key yields [`Target::MissingKey`] instead of
/// `KeyNotFound`.
pub(crate) fn locate(doc: &[u8], segs: &Segments, upsert: bool) -> Result<Target, Error> {
    let mut slot = Slot {
        parent: None,
        entry: 0,
        value_start: 0,
        value_end: item_end(doc, 0)?,
    };
    let mut scratch = Scratch::acquire();
    for i in 0..segs.len() {
        let seg = segs.get(i);
        let at = slot.value_start;
        let c = Container::read(doc, at)?;
        slot = match c.kind {
            Kind::Array => find_in_array(doc, c, seg, at)?,
            Kind::Map => match find_in_map(doc, c, seg, &mut scratch)? {
                Some(found) => found,
                None if upsert && i + 1 == segs.len() => {
                    return Ok(Target::MissingKey { parent: c })
                }
                None => return Err(err(ErrorCode::KeyNotFound, at)),
            },
        };
    }
    Ok(Target::Found(slot))
}
