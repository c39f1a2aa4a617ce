//! CBOR decoding: a 256-entry dispatch table keyed by the initial byte, and
//! `CBOR -> Value`.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use chrono::DateTime;
use num_bigint::{BigInt, Sign};

use crate::config::Config;
use crate::error::{err, Error, ErrorCode};
use crate::json::unescape_to_string;
use crate::number::parse_number;
use crate::utf8;
use crate::value::{tag, IndefiniteKind, Regexp, Value};
use crate::wire::{
    len_to_usize, read_be_u32, read_be_u64, read_exact, read_u8, read_uint, split, BREAK,
};

/// What an initial byte announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Head {
    Uint,
    Nint,
    Bytes,
    Text,
    Array,
    Map,
    Tag,
    False,
    True,
    Null,
    Undefined,
    Simple,
    Float16,
    Float32,
    Float64,
    Break,
    IndefiniteBytes,
    IndefiniteText,
    IndefiniteArray,
    IndefiniteMap,
    IndefiniteInvalid,
    Reserved,
}

const fn head_of(ib: u8) -> Head {
    let (major, ai) = split(ib);
    match (major, ai) {
        (_, 28..=30) => Head::Reserved,
        (0 | 1 | 6, 31) => Head::IndefiniteInvalid,
        (2, 31) => Head::IndefiniteBytes,
        (3, 31) => Head::IndefiniteText,
        (4, 31) => Head::IndefiniteArray,
        (5, 31) => Head::IndefiniteMap,
        (0, _) => Head::Uint,
        (1, _) => Head::Nint,
        (2, _) => Head::Bytes,
        (3, _) => Head::Text,
        (4, _) => Head::Array,
        (5, _) => Head::Map,
        (6, _) => Head::Tag,
        (_, 20) => Head::False,
        (_, 21) => Head::True,
        (_, 22) => Head::Null,
        (_, 23) => Head::Undefined,
        (_, 25) => Head::Float16,
        (_, 26) => Head::Float32,
        (_, 27) => Head::Float64,
        (_, 31) => Head::Break,
        _ => Head::Simple,
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn build_heads() -> [Head; 256] {
    let mut table = [Head::Reserved; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = head_of(i as u8);
        i += 1;
    }
    table
}

/// Dispatch table indexed by the initial byte.
pub(crate) static HEADS: [Head; 256] = build_heads();

#[inline]
pub(crate) fn head(ib: u8) -> Head {
    HEADS[usize::from(ib)]
}

/// Decoder over one input buffer.
struct Decoder<'a, 'c> {
    data: &'a [u8],
    pos: usize,
    config: &'c Config,
}

impl Decoder<'_, '_> {
    fn definite_len(&mut self, ai: u8, off: usize) -> Result<usize, Error> {
        let len = read_uint(self.data, &mut self.pos, ai, off)?;
        len_to_usize(len, off)
    }

    /// Decode one item; break-stops and indefinite string headers come back as markers.
    fn item(&mut self, depth: usize) -> Result<Value, Error> {
        let off = self.pos;
        let ib = read_u8(self.data, &mut self.pos)?;
        let (_, ai) = split(ib);
        match head(ib) {
            Head::Uint => {
                let v = read_uint(self.data, &mut self.pos, ai, off)?;
                Ok(Value::from(v))
            }
            Head::Nint => {
                let n = read_uint(self.data, &mut self.pos, ai, off)?;
                let n = i64::try_from(n).map_err(|_| err(ErrorCode::IntegerOverflow, off))?;
                Ok(Value::Int(-1 - n))
            }
            Head::Bytes => {
                let len = self.definite_len(ai, off)?;
                Ok(Value::Bytes(read_exact(self.data, &mut self.pos, len)?.to_vec()))
            }
            Head::Text => {
                let len = self.definite_len(ai, off)?;
                let start = self.pos;
                let raw = read_exact(self.data, &mut self.pos, len)?;
                Ok(Value::Text(String::from(utf8::validate(raw, start)?)))
            }
            Head::Array => {
                let depth = self.config.descend(depth, off)?;
                let len = self.definite_len(ai, off)?;
                let mut items = Vec::with_capacity(len.min(self.data.len() - self.pos));
                for _ in 0..len {
                    items.push(self.child(depth)?);
                }
                Ok(Value::Array(items))
            }
            Head::IndefiniteArray => {
                let depth = self.config.descend(depth, off)?;
                let mut items = Vec::new();
                while !self.at_break()? {
                    items.push(self.child(depth)?);
                }
                Ok(Value::Array(items))
            }
            Head::Map => {
                let depth = self.config.descend(depth, off)?;
                let len = self.definite_len(ai, off)?;
                let mut entries = Vec::with_capacity(len.min(self.data.len() - self.pos));
                for _ in 0..len {
                    let key = self.key(depth)?;
                    entries.push((key, self.child(depth)?));
                }
                Ok(Value::Map(entries))
            }
            Head::IndefiniteMap => {
                let depth = self.config.descend(depth, off)?;
                let mut entries = Vec::new();
                while !self.at_break()? {
                    let key = self.key(depth)?;
                    entries.push((key, self.child(depth)?));
                }
                Ok(Value::Map(entries))
            }
            Head::Tag => {
                let depth = self.config.descend(depth, off)?;
                let number = read_uint(self.data, &mut self.pos, ai, off)?;
                let payload = self.child(depth)?;
                tagged(number, payload, self.config, off)
            }
            Head::False => Ok(Value::Bool(false)),
            Head::True => Ok(Value::Bool(true)),
            Head::Null => Ok(Value::Null),
            Head::Undefined => Ok(Value::Undefined),
            Head::Simple => {
                if ai < 24 {
                    return Ok(Value::Simple(ai));
                }
                let v = read_u8(self.data, &mut self.pos)?;
                if v < 32 {
                    return Err(err(ErrorCode::InvalidSimpleValue, off));
                }
                Ok(Value::Simple(v))
            }
            Head::Float16 => Err(err(ErrorCode::Float16, off)),
            Head::Float32 => Ok(Value::Float32(f32::from_bits(read_be_u32(
                self.data,
                &mut self.pos,
            )?))),
            Head::Float64 => Ok(Value::Float64(f64::from_bits(read_be_u64(
                self.data,
                &mut self.pos,
            )?))),
            Head::Break => Ok(Value::Break),
            Head::IndefiniteBytes => Ok(Value::Indefinite(IndefiniteKind::Bytes)),
            Head::IndefiniteText => Ok(Value::Indefinite(IndefiniteKind::Text)),
            Head::IndefiniteInvalid => Err(err(ErrorCode::IndefiniteInvalid, off)),
            Head::Reserved => Err(err(ErrorCode::ReservedAdditionalInfo, off)),
        }
    }

    /// Decode one complete item; markers are errors here.
    fn child(&mut self, depth: usize) -> Result<Value, Error> {
        let off = self.pos;
        match self.item(depth)? {
            Value::Break => Err(err(ErrorCode::UnexpectedBreak, off)),
            Value::Indefinite(_) => Err(err(ErrorCode::IndefiniteChunks, off)),
            v => Ok(v),
        }
    }

    fn key(&mut self, depth: usize) -> Result<String, Error> {
        let off = self.pos;
        match self.child(depth)? {
            Value::Text(s) => Ok(s),
            _ => Err(err(ErrorCode::MapKeyMustBeText, off)),
        }
    }

    fn at_break(&mut self) -> Result<bool, Error> {
        match self.data.get(self.pos) {
            Some(&BREAK) => {
                self.pos += 1;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(err(ErrorCode::UnexpectedEof, self.pos)),
        }
    }
}

fn payload_bytes(payload: Value, off: usize) -> Result<Vec<u8>, Error> {
    match payload {
        Value::Bytes(b) => Ok(b),
        Value::Text(s) => Ok(s.into_bytes()),
        _ => Err(err(ErrorCode::MalformedTag, off)),
    }
}

fn exp_mantissa(payload: &Value, off: usize) -> Result<(i64, i64), Error> {
    match payload.as_array() {
        Some([exp, mantissa]) => match (exp.as_i64(), mantissa.as_i64()) {
            (Some(e), Some(m)) => Ok((e, m)),
            _ => Err(err(ErrorCode::MalformedTag, off)),
        },
        _ => Err(err(ErrorCode::MalformedTag, off)),
    }
}

/// Interpret a recognised tag's payload.
fn tagged(number: u64, payload: Value, config: &Config, off: usize) -> Result<Value, Error> {
    match number {
        tag::DATE_TIME => match payload {
            Value::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(Value::DateTime)
                .map_err(|_| err(ErrorCode::InvalidDateTime, off)),
            _ => Err(err(ErrorCode::MalformedTag, off)),
        },
        tag::EPOCH => match payload {
            Value::Int(v) => Ok(Value::EpochSeconds(i128::from(v))),
            Value::Uint(v) => Ok(Value::EpochSeconds(i128::from(v))),
            Value::Float64(f) => Ok(Value::EpochMicros(f)),
            Value::Float32(f) => Ok(Value::EpochMicros(f64::from(f))),
            _ => Err(err(ErrorCode::MalformedTag, off)),
        },
        tag::POS_BIGNUM | tag::NEG_BIGNUM => match payload {
            Value::Bytes(b) => {
                let n = BigInt::from_bytes_be(Sign::Plus, &b);
                Ok(Value::BigNum(if number == tag::NEG_BIGNUM {
                    -n - 1u8
                } else {
                    n
                }))
            }
            _ => Err(err(ErrorCode::MalformedTag, off)),
        },
        tag::DECIMAL_FRACTION => {
            let (exp, mantissa) = exp_mantissa(&payload, off)?;
            Ok(Value::DecimalFraction { exp, mantissa })
        }
        tag::BIG_FLOAT => {
            let (exp, mantissa) = exp_mantissa(&payload, off)?;
            Ok(Value::BigFloat { exp, mantissa })
        }
        tag::CBOR => match payload {
            Value::Bytes(b) => Ok(Value::Cbor(b)),
            _ => Err(err(ErrorCode::MalformedTag, off)),
        },
        tag::URI | tag::BASE64_URL | tag::BASE64 | tag::MIME => {
            payload_bytes(payload, off).map(Value::Bytes)
        }
        tag::REGEXP => match payload {
            Value::Text(s) => regex::Regex::new(&s)
                .map(|re| Value::Regexp(Regexp(re)))
                .map_err(|_| err(ErrorCode::InvalidRegex, off)),
            _ => Err(err(ErrorCode::MalformedTag, off)),
        },
        tag::JSON_STRING => {
            let raw = payload_bytes(payload, off)?;
            unescape_to_string(&raw, off).map(Value::Text)
        }
        tag::JSON_NUMBER => {
            let raw = payload_bytes(payload, off)?;
            parse_number(&raw, config.number_kind, config.strict, off).map(Value::from)
        }
        tag::SELF_DESCRIBE => Ok(Value::CborPrefix(Box::new(payload))),
        _ => Ok(Value::Tag(number, Box::new(payload))),
    }
}

/// Decode the data item at the start of `data`; returns it with the bytes consumed.
///
/// This is the low-level entry point: a break-stop decodes to [`Value::Break`] and an
/// indefinite-length byte or text string header to [`Value::Indefinite`], each
/// consuming one byte, so callers can drive chunked input themselves.
///
/// # Errors
///
/// Returns `Malformed` for truncated or ill-formed input, `Unsupported` for float16 and
/// indefinite-length integers or tags, and `NumberOutOfRange` for negative integers below
/// `i64::MIN`.
pub fn decode_item(data: &[u8], config: &Config) -> Result<(Value, usize), Error> {
    let mut d = Decoder {
        data,
        pos: 0,
        config,
    };
    let value = d.item(0)?;
    Ok((value, d.pos))
}

/// Decode one complete data item from the start of `data`; returns it with the bytes
/// consumed. Trailing bytes are left to the caller.
///
/// Tags are interpreted as documented on [`Value`]; tag 37 unwraps to `Text` and tag 38
/// parses per [`Config::number_kind`].
///
/// # Errors
///
/// As [`decode_item`], plus `UnexpectedBreak` for a top-level break-stop and
/// `IndefiniteChunks` for indefinite-length strings.
pub fn cbor_to_value(data: &[u8], config: &Config) -> Result<(Value, usize), Error> {
    let mut d = Decoder {
        data,
        pos: 0,
        config,
    };
    let value = d.child(0)?;
    Ok((value, d.pos))
}
