use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use chrono::{DateTime, FixedOffset};
use num_bigint::BigInt;

use crate::config::MISSING_LITERAL;
use crate::number::Num;

/// CBOR tag numbers recognised by this crate.
pub mod tag {
    /// RFC-3339 date-time text.
    pub const DATE_TIME: u64 = 0;
    /// Seconds since the epoch, integer or float.
    pub const EPOCH: u64 = 1;
    /// Positive bignum.
    pub const POS_BIGNUM: u64 = 2;
    /// Negative bignum.
    pub const NEG_BIGNUM: u64 = 3;
    /// Decimal fraction `[exp, mantissa]`.
    pub const DECIMAL_FRACTION: u64 = 4;
    /// Big float `[exp, mantissa]`.
    pub const BIG_FLOAT: u64 = 5;
    /// Embedded CBOR data item in a byte string.
    pub const CBOR: u64 = 24;
    /// URI text.
    pub const URI: u64 = 32;
    /// base64url text.
    pub const BASE64_URL: u64 = 33;
    /// base64 text.
    pub const BASE64: u64 = 34;
    /// Regular expression text.
    pub const REGEXP: u64 = 35;
    /// MIME message text.
    pub const MIME: u64 = 36;
    /// Raw JSON string literal (content between the quotes, escapes intact).
    pub const JSON_STRING: u64 = 37;
    /// Raw JSON number text.
    pub const JSON_NUMBER: u64 = 38;
    /// Self-describe CBOR prefix.
    pub const SELF_DESCRIBE: u64 = 55799;
}

/// The kind of an indefinite-length CBOR header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndefiniteKind {
    /// Byte string chunks (`0x5f`).
    Bytes,
    /// Text string chunks (`0x7f`).
    Text,
    /// Array (`0x9f`).
    Array,
    /// Map (`0xbf`).
    Map,
}

impl IndefiniteKind {
    /// The CBOR header byte that opens this kind.
    #[must_use]
    pub const fn header(self) -> u8 {
        match self {
            Self::Bytes => 0x5f,
            Self::Text => 0x7f,
            Self::Array => 0x9f,
            Self::Map => 0xbf,
        }
    }
}

/// A compiled regular expression carried by CBOR tag 35.
///
/// Two expressions are equal when their source patterns are equal.
#[derive(Clone)]
pub struct Regexp(pub regex::Regex);

impl Regexp {
    /// Returns the source pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Regexp {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Debug for Regexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regexp").field(&self.as_str()).finish()
    }
}

/// An in-memory semi-structured value.
///
/// `Int` and `Uint` compare equal when they denote the same integer, so values survive
/// a CBOR round trip regardless of which integer variant built them.
#[derive(Debug, Clone)]
pub enum Value {
    /// JSON / CBOR null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Unsigned integer, used above `i64::MAX`.
    Uint(u64),
    /// Signed integer.
    Int(i64),
    /// IEEE-754 single.
    Float32(f32),
    /// IEEE-754 double.
    Float64(f64),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Text string.
    Text(String),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Ordered key/value pairs; keys need not be unique.
    Map(Vec<(String, Value)>),
    /// CBOR simple value 23.
    Undefined,
    /// CBOR simple values 0..19 and 32..255.
    Simple(u8),
    /// Indefinite-length header; only produced by [`decode_item`](crate::decode_item).
    Indefinite(IndefiniteKind),
    /// Break-stop; only produced by [`decode_item`](crate::decode_item).
    Break,
    /// Tag 0.
    DateTime(DateTime<FixedOffset>),
    /// Tag 1 with an integer payload, which may be any CBOR unsigned integer.
    EpochSeconds(i128),
    /// Tag 1 with a float payload: fractional seconds since the epoch.
    EpochMicros(f64),
    /// Tags 2 and 3.
    BigNum(BigInt),
    /// Tag 4: `mantissa * 10^exp`.
    DecimalFraction {
        /// Base-10 exponent.
        exp: i64,
        /// Mantissa.
        mantissa: i64,
    },
    /// Tag 5: `mantissa * 2^exp`.
    BigFloat {
        /// Base-2 exponent.
        exp: i64,
        /// Mantissa.
        mantissa: i64,
    },
    /// Tag 24: an opaque embedded CBOR item.
    Cbor(Vec<u8>),
    /// Tag 35.
    Regexp(Regexp),
    /// Tag 55799 followed by the described item.
    CborPrefix(Box<Value>),
    /// Any other tag number with its payload.
    Tag(u64, Box<Value>),
    /// The missing-field sentinel; collates below `Null`.
    Missing,
}

impl Value {
    /// Build a map from `(key, value)` pairs.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns `true` for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text if this is `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is `Int`, or `Uint` within `i64` range.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            Self::Uint(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Returns the elements if this is `Array`.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the first value stored under `key` if this is `Map`.
    #[must_use]
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns `true` when the text equals the missing literal.
    pub(crate) fn is_missing_text(bytes: &[u8]) -> bool {
        bytes == MISSING_LITERAL.as_bytes()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null)
            | (Self::Undefined, Self::Undefined)
            | (Self::Break, Self::Break)
            | (Self::Missing, Self::Missing) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Uint(a), Self::Uint(b)) => a == b,
            (Self::Int(a), Self::Uint(b)) | (Self::Uint(b), Self::Int(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            (Self::Float32(a), Self::Float32(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) | (Self::Cbor(a), Self::Cbor(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Simple(a), Self::Simple(b)) => a == b,
            (Self::Indefinite(a), Self::Indefinite(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::EpochSeconds(a), Self::EpochSeconds(b)) => a == b,
            (Self::EpochMicros(a), Self::EpochMicros(b)) => a == b,
            (Self::BigNum(a), Self::BigNum(b)) => a == b,
            (
                Self::DecimalFraction {
                    exp: e1,
                    mantissa: m1,
                },
                Self::DecimalFraction {
                    exp: e2,
                    mantissa: m2,
                },
            )
            | (
                Self::BigFloat {
                    exp: e1,
                    mantissa: m1,
                },
                Self::BigFloat {
                    exp: e2,
                    mantissa: m2,
                },
            ) => e1 == e2 && m1 == m2,
            (Self::Regexp(a), Self::Regexp(b)) => a == b,
            (Self::CborPrefix(a), Self::CborPrefix(b)) => a == b,
            (Self::Tag(t1, a), Self::Tag(t2, b)) => t1 == t2 && a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Self::Uint(v), Self::Int)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float32(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        Self::BigNum(v)
    }
}

impl From<Num> for Value {
    fn from(v: Num) -> Self {
        match v {
            Num::Int(v) => Self::Int(v),
            Num::Uint(v) => Self::Uint(v),
            Num::Float(v) => Self::Float64(v),
            Num::Float32(v) => Self::Float32(v),
        }
    }
}
