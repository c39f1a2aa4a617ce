//! Pointer operations on raw CBOR: `get`, `set`, `delete`, `prepend` and `append`.
//!
//! Every mutation writes a new document into a separate output buffer by splicing the
//! input around the addressed slot. Only the directly enclosing container's header
//! changes: a length-prefixed header is rewritten with the new count in minimal width,
//! an indefinite header is kept as is.

use crate::encode::encode_text;
use crate::error::{err, Error, ErrorCode};
use crate::pointer::Segments;
use crate::pool::Scratch;
use crate::sink::{Sink, SliceSink, VecSink};
use crate::walk::{locate, Container, Kind, Slot, Target};
use crate::wire::{item_end, write_len, MAJOR_ARRAY, MAJOR_MAP};

#[cold]
#[inline(never)]
const fn root_not_removable() -> Error {
    err(ErrorCode::PointerSyntax, 0)
}

#[cold]
#[inline(never)]
const fn not_an_array(offset: usize) -> Error {
    err(ErrorCode::NotAnArray, offset)
}

/// One splice of the input: `doc[cut_start..cut_end]` is replaced by `insert`, and the
/// header of `resize.0` is rewritten for `resize.1` children.
struct Splice<'a> {
    resize: Option<(Container, usize)>,
    cut_start: usize,
    cut_end: usize,
    insert: [&'a [u8]; 2],
}

impl Splice<'_> {
    fn apply(&self, doc: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        let mut sink = SliceSink::new(out);
        let mut pos = 0;
        if let Some((c, count)) = self.resize {
            let major = match c.kind {
                Kind::Array => MAJOR_ARRAY,
                Kind::Map => MAJOR_MAP,
            };
            sink.write(&doc[..c.header])?;
            write_len(&mut sink, major, count)?;
            pos = c.body;
        }
        sink.write(&doc[pos..self.cut_start])?;
        for part in self.insert {
            sink.write(part)?;
        }
        sink.write(&doc[self.cut_end..])?;
        Ok(sink.position())
    }
}

/// Header rewrite for a container gaining or losing one child; indefinite headers stay.
fn resize(c: Container, grow: bool) -> Option<(Container, usize)> {
    c.count
        .map(|n| (c, if grow { n + 1 } else { n.saturating_sub(1) }))
}

/// Require `item` to be exactly one well-formed data item.
fn check_item(item: &[u8]) -> Result<(), Error> {
    let end = item_end(item, 0)?;
    if end != item.len() {
        return Err(err(ErrorCode::TrailingBytes, end));
    }
    Ok(())
}

fn copy_out(src: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    let mut sink = SliceSink::new(out);
    sink.write(src)?;
    Ok(src.len())
}

fn found(doc: &[u8], segs: &Segments) -> Result<Slot, Error> {
    match locate(doc, segs, false)? {
        Target::Found(slot) => Ok(slot),
        Target::MissingKey { parent } => Err(err(ErrorCode::KeyNotFound, parent.header)),
    }
}

/// Copy the item addressed by `cptr` into `item`; returns the bytes written.
///
/// # Errors
///
/// Returns `KeyNotFound` for an absent map key, `IndexOutOfRange` past the end of an
/// array, `InvalidPointer` errors when a segment descends into a scalar or is not an
/// index, and `BufferFull` when `item` is too small.
pub fn cbor_get(doc: &[u8], cptr: &[u8], item: &mut [u8]) -> Result<usize, Error> {
    let segs = Segments::decode(cptr)?;
    let slot = found(doc, &segs)?;
    copy_out(&doc[slot.value_start..slot.value_end], item)
}

/// Replace the item addressed by `cptr` with `item`, writing the new document to
/// `newdoc` and the replaced item to `old`.
///
/// A final segment naming an absent map key inserts a new pair at the end of that map;
/// `old` is then left empty. Returns `(newdoc_len, old_len)`.
///
/// # Errors
///
/// As [`cbor_get`], plus `TrailingBytes` when `item` is not exactly one data item.
pub fn cbor_set(
    doc: &[u8],
    cptr: &[u8],
    item: &[u8],
    newdoc: &mut [u8],
    old: &mut [u8],
) -> Result<(usize, usize), Error> {
    check_item(item)?;
    let segs = Segments::decode(cptr)?;
    match locate(doc, &segs, true)? {
        Target::Found(slot) => {
            let old_len = copy_out(&doc[slot.value_start..slot.value_end], old)?;
            let n = Splice {
                resize: None,
                cut_start: slot.value_start,
                cut_end: slot.value_end,
                insert: [item, &[]],
            }
            .apply(doc, newdoc)?;
            Ok((n, old_len))
        }
        Target::MissingKey { parent } => {
            let mut key = Scratch::acquire();
            encode_text(&mut VecSink::new(&mut key), segs.get(segs.len() - 1))?;
            let at = parent.items_end(doc)?;
            let n = Splice {
                resize: resize(parent, true),
                cut_start: at,
                cut_end: at,
                insert: [key.as_slice(), item],
            }
            .apply(doc, newdoc)?;
            Ok((n, 0))
        }
    }
}

/// Remove the item addressed by `cptr`, writing the new document to `newdoc` and the
/// removed item to `removed`. Returns `(newdoc_len, removed_len)`.
///
/// Array elements after the removed one shift down; map pairs are excised whole.
///
/// # Errors
///
/// As [`cbor_get`]; the root pointer cannot be removed (`PointerSyntax`).
pub fn cbor_delete(
    doc: &[u8],
    cptr: &[u8],
    newdoc: &mut [u8],
    removed: &mut [u8],
) -> Result<(usize, usize), Error> {
    let segs = Segments::decode(cptr)?;
    let slot = found(doc, &segs)?;
    let parent = slot.parent.ok_or_else(root_not_removable)?;
    let removed_len = copy_out(&doc[slot.value_start..slot.value_end], removed)?;
    let n = Splice {
        resize: resize(parent, false),
        cut_start: slot.entry,
        cut_end: slot.value_end,
        insert: [&[], &[]],
    }
    .apply(doc, newdoc)?;
    Ok((n, removed_len))
}

/// The array addressed by `cptr`.
fn target_array(doc: &[u8], cptr: &[u8], item: &[u8]) -> Result<Container, Error> {
    check_item(item)?;
    let segs = Segments::decode(cptr)?;
    let slot = found(doc, &segs)?;
    let c = Container::read(doc, slot.value_start)?;
    if c.kind != Kind::Array {
        return Err(not_an_array(c.header));
    }
    Ok(c)
}

/// Insert `item` as the first element of the array addressed by `cptr`; returns the
/// length of the new document written to `newdoc`.
///
/// # Errors
///
/// As [`cbor_get`], plus `NotAnArray` when the target is a map and `NotAContainer` when
/// it is a scalar.
pub fn cbor_prepend(
    doc: &[u8],
    cptr: &[u8],
    item: &[u8],
    newdoc: &mut [u8],
) -> Result<usize, Error> {
    let c = target_array(doc, cptr, item)?;
    Splice {
        resize: resize(c, true),
        cut_start: c.body,
        cut_end: c.body,
        insert: [item, &[]],
    }
    .apply(doc, newdoc)
}

/// Insert `item` as the last element of the array addressed by `cptr`; returns the
/// length of the new document written to `newdoc`.
///
/// For indefinite arrays the item lands before the break-stop.
///
/// # Errors
///
/// As [`cbor_prepend`].
pub fn cbor_append(
    doc: &[u8],
    cptr: &[u8],
    item: &[u8],
    newdoc: &mut [u8],
) -> Result<usize, Error> {
    let c = target_array(doc, cptr, item)?;
    let at = c.items_end(doc)?;
    Splice {
        resize: resize(c, true),
        cut_start: at,
        cut_end: at,
        insert: [item, &[]],
    }
    .apply(doc, newdoc)
}
