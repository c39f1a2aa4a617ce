//! Fixed-capacity buffers for each wire form.
//!
//! [`Json`], [`Cbor`] and [`Collate`] own a zero-filled region of fixed capacity plus a
//! length, and carry the [`Config`] they were made with. Conversions append to the
//! destination's free tail and advance its length only when the whole conversion
//! succeeds, so a failed call leaves both buffers as they were.

use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;

use crate::cbor_collate::{cbor_to_collate, collate_to_cbor};
use crate::collate::{collate_to_value, value_to_collate};
use crate::config::Config;
use crate::decode::cbor_to_value;
use crate::edit::{cbor_append, cbor_delete, cbor_get, cbor_prepend, cbor_set};
use crate::encode::value_to_cbor;
use crate::error::{err, Error, ErrorCode};
use crate::json::{json_to_value, value_to_json};
use crate::json_cbor::{cbor_to_json, json_to_cbor};
use crate::json_collate::{collate_to_json, json_to_collate};
use crate::pointer::JsonPointer;
use crate::sink::{Sink, SliceSink};
use crate::value::Value;

macro_rules! buffer_common {
    ($name:ident) => {
        impl $name {
            /// An empty buffer holding at most `capacity` bytes.
            #[must_use]
            pub fn new(capacity: usize, config: Config) -> Self {
                Self {
                    data: vec![0; capacity],
                    len: 0,
                    config,
                }
            }

            /// A buffer holding a copy of `bytes`, with no spare capacity.
            #[must_use]
            pub fn from_bytes(bytes: &[u8], config: Config) -> Self {
                Self {
                    data: bytes.to_vec(),
                    len: bytes.len(),
                    config,
                }
            }

            /// The filled part of the buffer.
            #[inline]
            #[must_use]
            pub fn bytes(&self) -> &[u8] {
                &self.data[..self.len]
            }

            /// Number of filled bytes.
            #[inline]
            #[must_use]
            pub const fn len(&self) -> usize {
                self.len
            }

            /// Returns `true` when nothing has been written.
            #[inline]
            #[must_use]
            pub const fn is_empty(&self) -> bool {
                self.len == 0
            }

            /// Total number of bytes the buffer can hold.
            #[inline]
            #[must_use]
            pub fn capacity(&self) -> usize {
                self.data.len()
            }

            /// The configuration conversions out of this buffer use.
            #[inline]
            #[must_use]
            pub const fn config(&self) -> &Config {
                &self.config
            }

            /// Forget the contents; capacity is kept.
            pub fn reset(&mut self) {
                self.len = 0;
            }

            /// Append raw bytes.
            ///
            /// # Errors
            ///
            /// Returns `BufferFull` when `bytes` do not fit; nothing is written then.
            pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), Error> {
                self.fill(|out| {
                    let mut sink = SliceSink::new(out);
                    sink.write(bytes)?;
                    Ok(sink.position())
                })
            }

            /// Run `f` on the free tail and advance by what it reports written.
            fn fill<F>(&mut self, f: F) -> Result<(), Error>
            where
                F: FnOnce(&mut [u8]) -> Result<usize, Error>,
            {
                let n = f(&mut self.data[self.len..])?;
                self.len += n;
                Ok(())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                self.bytes()
            }
        }
    };
}

/// Require that a J-side conversion consumed the whole text.
fn consumed_all(read: usize, len: usize) -> Result<(), Error> {
    if read != len {
        return Err(err(ErrorCode::TrailingBytes, read));
    }
    Ok(())
}

/// A JSON text buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json {
    data: Vec<u8>,
    len: usize,
    config: Config,
}

buffer_common!(Json);

impl Json {
    /// Append the CBOR form of this text to `out`.
    ///
    /// # Errors
    ///
    /// As [`json_to_cbor`], plus `TrailingBytes` when anything but whitespace follows
    /// the value.
    pub fn to_cbor(&self, out: &mut Cbor) -> Result<(), Error> {
        let text = self.bytes();
        out.fill(|tail| {
            let (read, written) = json_to_cbor(text, tail, &self.config)?;
            consumed_all(read, text.len())?;
            Ok(written)
        })
    }

    /// Append the collation of this text to `out`.
    ///
    /// # Errors
    ///
    /// As [`json_to_collate`], plus `TrailingBytes`.
    pub fn to_collate(&self, out: &mut Collate) -> Result<(), Error> {
        let text = self.bytes();
        out.fill(|tail| {
            let (read, written) = json_to_collate(text, tail, &self.config)?;
            consumed_all(read, text.len())?;
            Ok(written)
        })
    }

    /// Parse the text into a [`Value`].
    ///
    /// # Errors
    ///
    /// As [`json_to_value`], plus `TrailingBytes`.
    pub fn to_value(&self) -> Result<Value, Error> {
        let (value, read) = json_to_value(self.bytes(), &self.config)?;
        consumed_all(read, self.len)?;
        Ok(value)
    }

    /// Append the JSON rendering of `value`.
    ///
    /// # Errors
    ///
    /// As [`value_to_json`].
    pub fn from_value(&mut self, value: &Value) -> Result<(), Error> {
        let config = self.config;
        self.fill(|tail| value_to_json(value, tail, &config))
    }

    /// Append the RFC-6901 text of `ptr`.
    ///
    /// # Errors
    ///
    /// Returns `BufferFull` when the text does not fit.
    pub fn from_pointer(&mut self, ptr: &JsonPointer) -> Result<(), Error> {
        self.extend_from_slice(ptr.to_string().as_bytes())
    }
}

/// A CBOR document buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cbor {
    data: Vec<u8>,
    len: usize,
    config: Config,
}

buffer_common!(Cbor);

impl Cbor {
    /// Append the JSON form of the document to `out`.
    ///
    /// # Errors
    ///
    /// As [`cbor_to_json`].
    pub fn to_json(&self, out: &mut Json) -> Result<(), Error> {
        let data = self.bytes();
        out.fill(|tail| cbor_to_json(data, tail, &self.config).map(|(_, n)| n))
    }

    /// Append the collation of the document to `out`.
    ///
    /// # Errors
    ///
    /// As [`cbor_to_collate`].
    pub fn to_collate(&self, out: &mut Collate) -> Result<(), Error> {
        let data = self.bytes();
        out.fill(|tail| cbor_to_collate(data, tail, &self.config).map(|(_, n)| n))
    }

    /// Decode the document into a [`Value`].
    ///
    /// # Errors
    ///
    /// As [`cbor_to_value`].
    pub fn to_value(&self) -> Result<Value, Error> {
        cbor_to_value(self.bytes(), &self.config).map(|(v, _)| v)
    }

    /// Append the CBOR encoding of `value`.
    ///
    /// # Errors
    ///
    /// As [`value_to_cbor`].
    pub fn from_value(&mut self, value: &Value) -> Result<(), Error> {
        let config = self.config;
        self.fill(|tail| value_to_cbor(value, tail, &config))
    }

    /// Append the CBOR-pointer form of `ptr`.
    ///
    /// # Errors
    ///
    /// Returns `BufferFull` when the pointer does not fit.
    pub fn from_pointer(&mut self, ptr: &JsonPointer) -> Result<(), Error> {
        self.fill(|tail| ptr.to_cbor(tail))
    }

    /// Append the item addressed by the CBOR-pointer `cptr` to `item`.
    ///
    /// # Errors
    ///
    /// As [`cbor_get`].
    pub fn get(&self, cptr: &[u8], item: &mut Self) -> Result<(), Error> {
        let doc = self.bytes();
        item.fill(|tail| cbor_get(doc, cptr, tail))
    }

    /// Write the document with the addressed item replaced by `item` to `newdoc`, and the
    /// replaced item to `old`.
    ///
    /// # Errors
    ///
    /// As [`cbor_set`].
    pub fn set(
        &self,
        cptr: &[u8],
        item: &Self,
        newdoc: &mut Self,
        old: &mut Self,
    ) -> Result<(), Error> {
        let (n, o) = cbor_set(
            self.bytes(),
            cptr,
            item.bytes(),
            &mut newdoc.data[newdoc.len..],
            &mut old.data[old.len..],
        )?;
        newdoc.len += n;
        old.len += o;
        Ok(())
    }

    /// Write the document without the addressed item to `newdoc`, and the removed item
    /// to `removed`.
    ///
    /// # Errors
    ///
    /// As [`cbor_delete`].
    pub fn delete(&self, cptr: &[u8], newdoc: &mut Self, removed: &mut Self) -> Result<(), Error> {
        let (n, r) = cbor_delete(
            self.bytes(),
            cptr,
            &mut newdoc.data[newdoc.len..],
            &mut removed.data[removed.len..],
        )?;
        newdoc.len += n;
        removed.len += r;
        Ok(())
    }

    /// Write the document with `item` inserted first in the addressed array to `newdoc`.
    ///
    /// # Errors
    ///
    /// As [`cbor_prepend`].
    pub fn prepend(&self, cptr: &[u8], item: &Self, newdoc: &mut Self) -> Result<(), Error> {
        let (doc, item) = (self.bytes(), item.bytes());
        newdoc.fill(|tail| cbor_prepend(doc, cptr, item, tail))
    }

    /// Write the document with `item` inserted last in the addressed array to `newdoc`.
    ///
    /// # Errors
    ///
    /// As [`cbor_append`].
    pub fn append(&self, cptr: &[u8], item: &Self, newdoc: &mut Self) -> Result<(), Error> {
        let (doc, item) = (self.bytes(), item.bytes());
        newdoc.fill(|tail| cbor_append(doc, cptr, item, tail))
    }
}

/// A collation buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collate {
    data: Vec<u8>,
    len: usize,
    config: Config,
}

buffer_common!(Collate);

impl Collate {
    /// Append the JSON form of the collated value to `out`.
    ///
    /// # Errors
    ///
    /// As [`collate_to_json`].
    pub fn to_json(&self, out: &mut Json) -> Result<(), Error> {
        let code = self.bytes();
        out.fill(|tail| collate_to_json(code, tail, &self.config).map(|(_, n)| n))
    }

    /// Append the CBOR form of the collated value to `out`.
    ///
    /// # Errors
    ///
    /// As [`collate_to_cbor`].
    pub fn to_cbor(&self, out: &mut Cbor) -> Result<(), Error> {
        let code = self.bytes();
        out.fill(|tail| collate_to_cbor(code, tail, &self.config).map(|(_, n)| n))
    }

    /// Decode the collated value into a [`Value`].
    ///
    /// # Errors
    ///
    /// As [`collate_to_value`].
    pub fn to_value(&self) -> Result<Value, Error> {
        collate_to_value(self.bytes(), &self.config).map(|(v, _)| v)
    }

    /// Append the collation of `value`.
    ///
    /// # Errors
    ///
    /// As [`value_to_collate`].
    pub fn from_value(&mut self, value: &Value) -> Result<(), Error> {
        let config = self.config;
        self.fill(|tail| value_to_collate(value, tail, &config))
    }
}

impl Config {
    /// An empty [`Json`] buffer of `capacity` bytes using this configuration.
    #[must_use]
    pub fn new_json(&self, capacity: usize) -> Json {
        Json::new(capacity, *self)
    }

    /// An empty [`Cbor`] buffer of `capacity` bytes using this configuration.
    #[must_use]
    pub fn new_cbor(&self, capacity: usize) -> Cbor {
        Cbor::new(capacity, *self)
    }

    /// An empty [`Collate`] buffer of `capacity` bytes using this configuration.
    #[must_use]
    pub fn new_collate(&self, capacity: usize) -> Collate {
        Collate::new(capacity, *self)
    }

    /// Parse RFC-6901 pointer text.
    ///
    /// # Errors
    ///
    /// Returns `PointerSyntax` for invalid pointer text.
    pub fn new_json_pointer(&self, text: &str) -> Result<JsonPointer, Error> {
        JsonPointer::parse(text)
    }
}
