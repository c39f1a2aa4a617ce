//! Pointer operations on [`Value`] trees.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::mem;

use crate::error::{err, Error, ErrorCode};
use crate::pointer::JsonPointer;
use crate::value::Value;
use crate::walk::parse_index;

/// Anything that names a pointer: a parsed [`JsonPointer`] or RFC-6901 text.
pub trait ToPointer {
    /// Borrow or parse the pointer.
    ///
    /// # Errors
    ///
    /// Returns `PointerSyntax` for invalid pointer text.
    fn to_pointer(&self) -> Result<Cow<'_, JsonPointer>, Error>;
}

impl ToPointer for JsonPointer {
    fn to_pointer(&self) -> Result<Cow<'_, JsonPointer>, Error> {
        Ok(Cow::Borrowed(self))
    }
}

impl ToPointer for str {
    fn to_pointer(&self) -> Result<Cow<'_, JsonPointer>, Error> {
        JsonPointer::parse(self).map(Cow::Owned)
    }
}

impl ToPointer for String {
    fn to_pointer(&self) -> Result<Cow<'_, JsonPointer>, Error> {
        self.as_str().to_pointer()
    }
}

/// Look through self-describe wrappers.
fn described(v: &Value) -> &Value {
    match v {
        Value::CborPrefix(inner) => described(inner),
        other => other,
    }
}

fn described_mut(v: &mut Value) -> &mut Value {
    match v {
        Value::CborPrefix(inner) => described_mut(inner),
        other => other,
    }
}

/// Resolve an array segment against a length; `-` is the last element.
fn element(seg: &str, len: usize) -> Result<usize, Error> {
    match parse_index(seg.as_bytes(), 0)? {
        Some(i) if i < len => Ok(i),
        None if len > 0 => Ok(len - 1),
        _ => Err(err(ErrorCode::IndexOutOfRange, 0)),
    }
}

fn child<'v>(v: &'v Value, seg: &str) -> Result<&'v Value, Error> {
    match described(v) {
        Value::Array(items) => Ok(&items[element(seg, items.len())?]),
        Value::Map(entries) => entries
            .iter()
            .find(|(k, _)| k == seg)
            .map(|(_, v)| v)
            .ok_or_else(|| err(ErrorCode::KeyNotFound, 0)),
        _ => Err(err(ErrorCode::NotAContainer, 0)),
    }
}

fn child_mut<'v>(v: &'v mut Value, seg: &str) -> Result<&'v mut Value, Error> {
    match described_mut(v) {
        Value::Array(items) => {
            let i = element(seg, items.len())?;
            Ok(&mut items[i])
        }
        Value::Map(entries) => entries
            .iter_mut()
            .find(|(k, _)| k == seg)
            .map(|(_, v)| v)
            .ok_or_else(|| err(ErrorCode::KeyNotFound, 0)),
        _ => Err(err(ErrorCode::NotAContainer, 0)),
    }
}

fn walk_mut<'v>(mut v: &'v mut Value, segs: &[String]) -> Result<&'v mut Value, Error> {
    for seg in segs {
        v = child_mut(v, seg)?;
    }
    Ok(v)
}

/// Borrow the value `ptr` addresses.
///
/// # Errors
///
/// Returns `KeyNotFound`, `IndexOutOfRange`, or an `InvalidPointer` error when a
/// segment descends into a scalar or is not an index.
pub fn get_ptr<'v, P: ToPointer + ?Sized>(value: &'v Value, ptr: &P) -> Result<&'v Value, Error> {
    let ptr = ptr.to_pointer()?;
    let mut v = value;
    for seg in ptr.segments() {
        v = child(v, seg)?;
    }
    Ok(v)
}

/// Replace the value `ptr` addresses with `new`, returning the old one.
///
/// A final segment naming an absent map key inserts a new pair and returns `None`.
///
/// # Errors
///
/// As [`get_ptr`].
pub fn set_ptr<P: ToPointer + ?Sized>(
    value: &mut Value,
    ptr: &P,
    new: Value,
) -> Result<Option<Value>, Error> {
    let ptr = ptr.to_pointer()?;
    let Some((last, parents)) = ptr.segments().split_last() else {
        return Ok(Some(mem::replace(value, new)));
    };
    match described_mut(walk_mut(value, parents)?) {
        Value::Array(items) => {
            let i = element(last, items.len())?;
            Ok(Some(mem::replace(&mut items[i], new)))
        }
        Value::Map(entries) => match entries.iter_mut().find(|(k, _)| k == last) {
            Some((_, slot)) => Ok(Some(mem::replace(slot, new))),
            None => {
                entries.push((last.clone(), new));
                Ok(None)
            }
        },
        _ => Err(err(ErrorCode::NotAContainer, 0)),
    }
}

/// Remove and return the value `ptr` addresses.
///
/// # Errors
///
/// As [`get_ptr`]; the root cannot be removed (`PointerSyntax`).
pub fn delete_ptr<P: ToPointer + ?Sized>(value: &mut Value, ptr: &P) -> Result<Value, Error> {
    let ptr = ptr.to_pointer()?;
    let Some((last, parents)) = ptr.segments().split_last() else {
        return Err(err(ErrorCode::PointerSyntax, 0));
    };
    match described_mut(walk_mut(value, parents)?) {
        Value::Array(items) => {
            let i = element(last, items.len())?;
            Ok(items.remove(i))
        }
        Value::Map(entries) => entries
            .iter()
            .position(|(k, _)| k == last)
            .map(|i| entries.remove(i).1)
            .ok_or_else(|| err(ErrorCode::KeyNotFound, 0)),
        _ => Err(err(ErrorCode::NotAContainer, 0)),
    }
}

fn target_array<'v>(
    value: &'v mut Value,
    ptr: &JsonPointer,
) -> Result<&'v mut Vec<Value>, Error> {
    match described_mut(walk_mut(value, ptr.segments())?) {
        Value::Array(items) => Ok(items),
        Value::Map(_) => Err(err(ErrorCode::NotAnArray, 0)),
        _ => Err(err(ErrorCode::NotAContainer, 0)),
    }
}

/// Insert `item` as the first element of the array `ptr` addresses.
///
/// # Errors
///
/// As [`get_ptr`], plus `NotAnArray` when the target is a map.
pub fn prepend_ptr<P: ToPointer + ?Sized>(
    value: &mut Value,
    ptr: &P,
    item: Value,
) -> Result<(), Error> {
    let ptr = ptr.to_pointer()?;
    target_array(value, &ptr)?.insert(0, item);
    Ok(())
}

/// Insert `item` as the last element of the array `ptr` addresses.
///
/// # Errors
///
/// As [`prepend_ptr`].
pub fn append_ptr<P: ToPointer + ?Sized>(
    value: &mut Value,
    ptr: &P,
    item: Value,
) -> Result<(), Error> {
    let ptr = ptr.to_pointer()?;
    target_array(value, &ptr)?.push(item);
    Ok(())
}
