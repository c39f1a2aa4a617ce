//! CBOR encoding: header primitives shared by every transcoder, and `Value -> CBOR`.

use chrono::SecondsFormat;
use num_bigint::Sign;

use crate::config::{Config, ContainerEncoding, MISSING_LITERAL};
use crate::error::{err, Error, ErrorCode};
use crate::number::Num;
use crate::sink::{Sink, SliceSink};
use crate::value::{tag, Value};
use crate::wire::{
    header_bytes, write_header, write_len, BREAK, INFO_INDEFINITE, MAJOR_ARRAY, MAJOR_BYTES,
    MAJOR_MAP, MAJOR_NINT, MAJOR_TAG, MAJOR_TEXT, MAJOR_UINT,
};

pub(crate) const FALSE: u8 = 0xf4;
pub(crate) const TRUE: u8 = 0xf5;
pub(crate) const NULL: u8 = 0xf6;
pub(crate) const UNDEFINED: u8 = 0xf7;
const SIMPLE_U8: u8 = 0xf8;
const FLOAT32: u8 = 0xfa;
const FLOAT64: u8 = 0xfb;

pub(crate) fn encode_uint<S: Sink>(sink: &mut S, v: u64) -> Result<(), Error> {
    write_header(sink, MAJOR_UINT, v)
}

pub(crate) fn encode_int<S: Sink>(sink: &mut S, v: i64) -> Result<(), Error> {
    match u64::try_from(v) {
        Ok(u) => write_header(sink, MAJOR_UINT, u),
        // -1 - v is non-negative and fits u64 for every negative i64.
        Err(_) => write_header(sink, MAJOR_NINT, (-1_i64 - v).unsigned_abs()),
    }
}

pub(crate) fn encode_bool<S: Sink>(sink: &mut S, v: bool) -> Result<(), Error> {
    sink.write_u8(if v { TRUE } else { FALSE })
}

pub(crate) fn encode_f32<S: Sink>(sink: &mut S, v: f32) -> Result<(), Error> {
    let mut buf = [0u8; 5];
    buf[0] = FLOAT32;
    buf[1..].copy_from_slice(&v.to_bits().to_be_bytes());
    sink.write(&buf)
}

pub(crate) fn encode_f64<S: Sink>(sink: &mut S, v: f64) -> Result<(), Error> {
    let mut buf = [0u8; 9];
    buf[0] = FLOAT64;
    buf[1..].copy_from_slice(&v.to_bits().to_be_bytes());
    sink.write(&buf)
}

pub(crate) fn encode_num<S: Sink>(sink: &mut S, num: Num) -> Result<(), Error> {
    match num {
        Num::Int(v) => encode_int(sink, v),
        Num::Uint(v) => encode_uint(sink, v),
        Num::Float(v) => encode_f64(sink, v),
        Num::Float32(v) => encode_f32(sink, v),
    }
}

pub(crate) fn encode_bytes<S: Sink>(sink: &mut S, bytes: &[u8]) -> Result<(), Error> {
    write_len(sink, MAJOR_BYTES, bytes.len())?;
    sink.write(bytes)
}

pub(crate) fn encode_text<S: Sink>(sink: &mut S, text: &[u8]) -> Result<(), Error> {
    write_len(sink, MAJOR_TEXT, text.len())?;
    sink.write(text)
}

pub(crate) fn encode_tag<S: Sink>(sink: &mut S, tag: u64) -> Result<(), Error> {
    write_header(sink, MAJOR_TAG, tag)
}

/// Simple values 20..=31 are either spelled out by their own variants or reserved.
pub(crate) fn encode_simple<S: Sink>(sink: &mut S, v: u8) -> Result<(), Error> {
    match v {
        0..=19 => sink.write_u8(0xe0 | v),
        20..=31 => Err(err(ErrorCode::InvalidSimpleValue, sink.position())),
        _ => sink.write(&[SIMPLE_U8, v]),
    }
}

/// Open a container whose element count is known up front.
pub(crate) fn begin_container<S: Sink>(
    sink: &mut S,
    major: u8,
    count: usize,
    encoding: ContainerEncoding,
) -> Result<(), Error> {
    match encoding {
        ContainerEncoding::LengthPrefix => write_len(sink, major, count),
        ContainerEncoding::Stream => sink.write_u8((major << 5) | INFO_INDEFINITE),
    }
}

pub(crate) fn end_container<S: Sink>(
    sink: &mut S,
    encoding: ContainerEncoding,
) -> Result<(), Error> {
    match encoding {
        ContainerEncoding::LengthPrefix => Ok(()),
        ContainerEncoding::Stream => sink.write_u8(BREAK),
    }
}

/// A container whose element count is only known after its items are written.
///
/// Length-prefixed headers are inserted in front of the items once the count is known.
pub(crate) struct Pending {
    at: usize,
    major: u8,
    encoding: ContainerEncoding,
}

impl Pending {
    pub(crate) fn open<S: Sink>(
        sink: &mut S,
        major: u8,
        encoding: ContainerEncoding,
    ) -> Result<Self, Error> {
        if encoding == ContainerEncoding::Stream {
            sink.write_u8((major << 5) | INFO_INDEFINITE)?;
        }
        Ok(Self {
            at: sink.position(),
            major,
            encoding,
        })
    }

    pub(crate) fn close<S: Sink>(self, sink: &mut S, count: usize) -> Result<(), Error> {
        match self.encoding {
            ContainerEncoding::Stream => sink.write_u8(BREAK),
            ContainerEncoding::LengthPrefix => {
                let count = u64::try_from(count)
                    .map_err(|_| err(ErrorCode::LengthOverflow, self.at))?;
                let (buf, n) = header_bytes(self.major, count);
                sink.insert(self.at, &buf[..n])
            }
        }
    }
}

/// Encode one value at nesting level `depth`.
pub(crate) fn encode_value<S: Sink>(
    sink: &mut S,
    value: &Value,
    config: &Config,
    depth: usize,
) -> Result<(), Error> {
    match value {
        Value::Null => sink.write_u8(NULL),
        Value::Bool(v) => encode_bool(sink, *v),
        Value::Uint(v) => encode_uint(sink, *v),
        Value::Int(v) => encode_int(sink, *v),
        Value::Float32(v) => encode_f32(sink, *v),
        Value::Float64(v) => encode_f64(sink, *v),
        Value::Bytes(b) => encode_bytes(sink, b),
        Value::Text(s) => encode_text(sink, s.as_bytes()),
        Value::Array(items) => {
            let depth = config.descend(depth, sink.position())?;
            begin_container(sink, MAJOR_ARRAY, items.len(), config.container_encoding)?;
            for item in items {
                encode_value(sink, item, config, depth)?;
            }
            end_container(sink, config.container_encoding)
        }
        Value::Map(entries) => {
            let depth = config.descend(depth, sink.position())?;
            begin_container(sink, MAJOR_MAP, entries.len(), config.container_encoding)?;
            for (k, v) in entries {
                encode_text(sink, k.as_bytes())?;
                encode_value(sink, v, config, depth)?;
            }
            end_container(sink, config.container_encoding)
        }
        Value::Undefined => sink.write_u8(UNDEFINED),
        Value::Simple(v) => encode_simple(sink, *v),
        Value::Indefinite(kind) => sink.write_u8(kind.header()),
        Value::Break => sink.write_u8(BREAK),
        Value::DateTime(dt) => {
            encode_tag(sink, tag::DATE_TIME)?;
            let text = dt.to_rfc3339_opts(SecondsFormat::AutoSi, true);
            encode_text(sink, text.as_bytes())
        }
        Value::EpochSeconds(v) => {
            let num = Num::from_i128(*v)
                .ok_or_else(|| err(ErrorCode::IntegerOverflow, sink.position()))?;
            encode_tag(sink, tag::EPOCH)?;
            encode_num(sink, num)
        }
        Value::EpochMicros(v) => {
            encode_tag(sink, tag::EPOCH)?;
            encode_f64(sink, *v)
        }
        Value::BigNum(n) => {
            let (number, magnitude) = if n.sign() == Sign::Minus {
                (tag::NEG_BIGNUM, (-n - 1u8).to_bytes_be().1)
            } else {
                (tag::POS_BIGNUM, n.to_bytes_be().1)
            };
            let start = magnitude
                .iter()
                .position(|&b| b != 0)
                .unwrap_or(magnitude.len());
            encode_tag(sink, number)?;
            encode_bytes(sink, &magnitude[start..])
        }
        Value::DecimalFraction { exp, mantissa } => {
            encode_tag(sink, tag::DECIMAL_FRACTION)?;
            write_len(sink, MAJOR_ARRAY, 2)?;
            encode_int(sink, *exp)?;
            encode_int(sink, *mantissa)
        }
        Value::BigFloat { exp, mantissa } => {
            encode_tag(sink, tag::BIG_FLOAT)?;
            write_len(sink, MAJOR_ARRAY, 2)?;
            encode_int(sink, *exp)?;
            encode_int(sink, *mantissa)
        }
        Value::Cbor(bytes) => {
            encode_tag(sink, tag::CBOR)?;
            encode_bytes(sink, bytes)
        }
        Value::Regexp(re) => {
            encode_tag(sink, tag::REGEXP)?;
            encode_text(sink, re.as_str().as_bytes())
        }
        Value::CborPrefix(inner) => {
            let depth = config.descend(depth, sink.position())?;
            encode_tag(sink, tag::SELF_DESCRIBE)?;
            encode_value(sink, inner, config, depth)
        }
        Value::Tag(t, inner) => {
            let depth = config.descend(depth, sink.position())?;
            encode_tag(sink, *t)?;
            encode_value(sink, inner, config, depth)
        }
        Value::Missing => encode_text(sink, MISSING_LITERAL.as_bytes()),
    }
}

/// Encode `value` as CBOR into `out`; returns the number of bytes written.
///
/// Arrays and maps are framed per [`Config::container_encoding`]. Map keys are emitted
/// as text strings in entry order. `Missing` encodes as the missing literal text.
///
/// # Errors
///
/// Returns `BufferFull` when `out` is too small, `InvalidSimpleValue` for simple values
/// 20..=31 and `DepthLimitExceeded` past [`Config::max_depth`].
pub fn value_to_cbor(value: &Value, out: &mut [u8], config: &Config) -> Result<usize, Error> {
    let mut sink = SliceSink::new(out);
    encode_value(&mut sink, value, config, 0)?;
    Ok(sink.position())
}
