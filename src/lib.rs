//! # cbor-collate
//!
//! Transcoding among four forms of the same semi-structured data:
//!
//! - **JSON** text (RFC 7159),
//! - **CBOR** (RFC 7049), with length-prefixed or indefinite-length containers,
//! - an in-memory [`Value`],
//! - a **collation**: binary keys whose `memcmp` order is the document order across
//!   JSON types (`missing < null < false < true < number < string < array < object`).
//!
//! Every pairwise direction is a dedicated routine that writes into a caller-owned
//! output slice; nothing goes through an intermediate tree unless a [`Value`] is one end.
//! On top of CBOR sit RFC-6901 pointers and the five pointer operations (`get`, `set`,
//! `delete`, `prepend`, `append`) that splice a raw document without decoding it.
//!
//! ## Conventions
//!
//! - Bytes-to-bytes transcoders return `(read, written)`; encoders from a [`Value`]
//!   return `written`; decoders into a [`Value`] return `(value, read)`.
//! - There is no partial success. On error the returned [`Error`] carries a stable
//!   [`ErrorCode`] and the byte offset where the problem was detected.
//! - All behaviour is selected by a [`Config`], which is `Copy` and borrowed by every
//!   call.
//!
//! ## Private tags
//!
//! Tag 37 wraps the raw content of a JSON string literal and tag 38 the raw text of a
//! JSON number, so `JSON -> CBOR -> JSON` under [`NumberKind::JsonNumber`] reproduces
//! the input modulo whitespace.
//!
//! ## Feature flags
//!
//! - `std` *(default)*: implements `std::error::Error` for [`Error`].
//! - `serde`: `Serialize`/`Deserialize` for [`Value`] and [`JsonPointer`].
//! - `simdutf8`: SIMD-accelerated UTF-8 validation where supported.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

extern crate alloc;

mod buffer;
mod cbor_collate;
mod collate;
mod config;
mod decode;
mod edit;
mod encode;
mod error;
mod json;
mod json_cbor;
mod json_collate;
mod number;
pub mod numeric;
mod pointer;
mod pool;
#[cfg(feature = "serde")]
mod serde_impl;
mod sink;
mod suffix;
pub(crate) mod utf8;
mod value;
mod value_ptr;
mod walk;
mod wire;

pub use crate::buffer::{Cbor, Collate, Json};
pub use crate::cbor_collate::{cbor_to_collate, collate_to_cbor};
pub use crate::collate::{collate_to_value, value_to_collate};
pub use crate::config::{
    Config, ContainerEncoding, NumberKind, SpaceKind, DEFAULT_MAX_DEPTH, DEFAULT_MAX_KEYS,
    MISSING_LITERAL,
};
pub use crate::decode::{cbor_to_value, decode_item};
pub use crate::edit::{cbor_append, cbor_delete, cbor_get, cbor_prepend, cbor_set};
pub use crate::encode::value_to_cbor;
pub use crate::error::{Error, ErrorCode, ErrorKind};
pub use crate::json::{json_to_value, value_to_json};
pub use crate::json_cbor::{cbor_to_json, json_to_cbor};
pub use crate::json_collate::{collate_to_json, json_to_collate};
pub use crate::number::Num;
pub use crate::pointer::{cbor_to_json_pointer, json_to_cbor_pointer, JsonPointer};
pub use crate::value::{tag, IndefiniteKind, Regexp, Value};
pub use crate::value_ptr::{append_ptr, delete_ptr, get_ptr, prepend_ptr, set_ptr, ToPointer};
pub use crate::wire::item_end;
