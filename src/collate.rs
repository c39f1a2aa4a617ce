//! Collation: binary keys whose byte order is the JSON document order.
//!
//! Every datum is a type byte, a body and a `0x00` terminator. Type bytes ascend in
//! document order, so values of different kinds compare by kind alone:
//!
//! | byte | datum     | body                                              |
//! |------|-----------|---------------------------------------------------|
//! | `01` | missing   | none                                              |
//! | `02` | null      | none                                              |
//! | `03` | false     | none                                              |
//! | `04` | true      | none                                              |
//! | `05` | number    | integer or float layout from [`numeric`]          |
//! | `06` | string    | suffix-encoded bytes                              |
//! | `07` | length    | integer layout; only as an array or map prefix    |
//! | `08` | array     | optional length datum, items, then `00`           |
//! | `09` | map       | optional length datum, sorted pairs, then `00`    |
//! | `0a` | binary    | suffix-encoded bytes                              |
//!
//! [`numeric`]: crate::numeric

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::{Config, NumberKind, MISSING_LITERAL};
use crate::encode::{encode_num, encode_tag, encode_text};
use crate::error::{err, Error, ErrorCode};
use crate::number::{
    decimal_from_bigint, decimal_from_f32, decimal_from_f64, decimal_from_fraction,
    decimal_from_i64, decimal_from_text, decimal_from_u64, parse_number, stack_format,
    truncate_to_int, write_num, Decimal, Num,
};
use crate::numeric;
use crate::pool::{MapScratch, Scratch};
use crate::sink::{Sink, SliceSink, VecSink};
use crate::suffix;
use crate::value::{tag, Value};

pub(crate) const TERMINATOR: u8 = 0x00;
pub(crate) const TYPE_MISSING: u8 = 0x01;
pub(crate) const TYPE_NULL: u8 = 0x02;
pub(crate) const TYPE_FALSE: u8 = 0x03;
pub(crate) const TYPE_TRUE: u8 = 0x04;
pub(crate) const TYPE_NUMBER: u8 = 0x05;
pub(crate) const TYPE_STRING: u8 = 0x06;
pub(crate) const TYPE_LENGTH: u8 = 0x07;
pub(crate) const TYPE_ARRAY: u8 = 0x08;
pub(crate) const TYPE_MAP: u8 = 0x09;
pub(crate) const TYPE_BINARY: u8 = 0x0a;

/// Integer collation refuses magnitudes longer than this many digits.
const MAX_INT_DIGITS: usize = 1024;

/// Per-call collation state: the configuration plus pooled digit and text scratch.
pub(crate) struct Collator<'c> {
    pub config: &'c Config,
    digits: Scratch,
    text: Scratch,
}

impl<'c> Collator<'c> {
    pub(crate) fn new(config: &'c Config) -> Self {
        Self {
            config,
            digits: Scratch::acquire(),
            text: Scratch::acquire(),
        }
    }

    pub(crate) fn missing<S: Sink>(sink: &mut S) -> Result<(), Error> {
        sink.write(&[TYPE_MISSING, TERMINATOR])
    }

    pub(crate) fn null<S: Sink>(sink: &mut S) -> Result<(), Error> {
        sink.write(&[TYPE_NULL, TERMINATOR])
    }

    pub(crate) fn boolean<S: Sink>(sink: &mut S, v: bool) -> Result<(), Error> {
        sink.write(&[if v { TYPE_TRUE } else { TYPE_FALSE }, TERMINATOR])
    }

    /// Collate text; the missing literal becomes `Missing` when `do_missing` is set.
    pub(crate) fn string<S: Sink>(&self, sink: &mut S, text: &[u8]) -> Result<(), Error> {
        if self.config.do_missing && Value::is_missing_text(text) {
            return Self::missing(sink);
        }
        sink.write_u8(TYPE_STRING)?;
        suffix::encode(sink, text)?;
        sink.write_u8(TERMINATOR)
    }

    pub(crate) fn binary<S: Sink>(sink: &mut S, bytes: &[u8]) -> Result<(), Error> {
        sink.write_u8(TYPE_BINARY)?;
        suffix::encode(sink, bytes)?;
        sink.write_u8(TERMINATOR)
    }

    /// Write a length datum for a container prefix.
    pub(crate) fn length<S: Sink>(sink: &mut S, n: usize) -> Result<(), Error> {
        let t = stack_format(format_args!("{n}"), sink.position())?;
        sink.write_u8(TYPE_LENGTH)?;
        numeric::write_int(sink, false, t.as_bytes())?;
        sink.write_u8(TERMINATOR)
    }

    /// Length datum bytes for inserting a prefix after the container's items.
    pub(crate) fn length_bytes(n: usize, buf: &mut [u8; 48]) -> Result<usize, Error> {
        let mut sink = SliceSink::new(buf);
        Self::length(&mut sink, n)?;
        Ok(sink.position())
    }

    /// Collate a JSON number text.
    pub(crate) fn number_text<S: Sink>(
        &mut self,
        sink: &mut S,
        text: &[u8],
        off: usize,
    ) -> Result<(), Error> {
        let kind = self.config.number_kind;
        match kind {
            NumberKind::JsonNumber | NumberKind::SmartNumber | NumberKind::SmartNumber32 => {
                let dec = decimal_from_text(text, &mut self.digits, off)?;
                if kind == NumberKind::JsonNumber || dec.is_integral() {
                    return write_number(sink, &dec, self.config, &mut self.text, off);
                }
                let num = parse_number(text, kind, self.config.strict, off)?;
                self.num(sink, num, off)
            }
            NumberKind::IntNumber | NumberKind::FloatNumber | NumberKind::FloatNumber32 => {
                let num = parse_number(text, kind, self.config.strict, off)?;
                self.num(sink, num, off)
            }
        }
    }

    /// Collate a parsed number.
    pub(crate) fn num<S: Sink>(&mut self, sink: &mut S, num: Num, off: usize) -> Result<(), Error> {
        let dec = decimal_of_num(num, self.config, &mut self.digits, off)?;
        write_number(sink, &dec, self.config, &mut self.text, off)
    }

    fn decimal<S: Sink>(&mut self, sink: &mut S, value: &Value, off: usize) -> Result<(), Error> {
        let dec = match value {
            Value::BigNum(n) => decimal_from_bigint(n, &mut self.digits)?,
            Value::DecimalFraction { exp, mantissa } => {
                decimal_from_fraction(*exp, *mantissa, &mut self.digits)?
            }
            _ => return Err(err(ErrorCode::NotCollatable, off)),
        };
        write_number(sink, &dec, self.config, &mut self.text, off)
    }

    /// Collate a value at nesting level `depth`.
    pub(crate) fn value<S: Sink>(
        &mut self,
        sink: &mut S,
        value: &Value,
        depth: usize,
    ) -> Result<(), Error> {
        let off = sink.position();
        match value {
            Value::Missing => Self::missing(sink),
            Value::Null => Self::null(sink),
            Value::Bool(v) => Self::boolean(sink, *v),
            Value::Int(v) => self.num(sink, Num::Int(*v), off),
            Value::EpochSeconds(v) => {
                let num = Num::from_i128(*v).ok_or_else(|| err(ErrorCode::IntegerOverflow, off))?;
                self.num(sink, num, off)
            }
            Value::Uint(v) => self.num(sink, Num::Uint(*v), off),
            Value::Float64(v) | Value::EpochMicros(v) => self.num(sink, Num::Float(*v), off),
            Value::Float32(v) => self.num(sink, Num::Float32(*v), off),
            Value::BigNum(_) | Value::DecimalFraction { .. } => self.decimal(sink, value, off),
            Value::Text(s) => self.string(sink, s.as_bytes()),
            Value::Regexp(re) => self.string(sink, re.as_str().as_bytes()),
            Value::DateTime(dt) => {
                let text = dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true);
                self.string(sink, text.as_bytes())
            }
            Value::Bytes(b) => Self::binary(sink, b),
            Value::Array(items) => {
                let depth = self.config.descend(depth, off)?;
                sink.write_u8(TYPE_ARRAY)?;
                if self.config.array_len_prefix {
                    Self::length(sink, items.len())?;
                }
                for item in items {
                    self.value(sink, item, depth)?;
                }
                sink.write_u8(TERMINATOR)
            }
            Value::Map(entries) => {
                let depth = self.config.descend(depth, off)?;
                let mut scratch = MapScratch::acquire(self.config.max_keys);
                for (k, v) in entries {
                    let start = scratch.position();
                    self.string(&mut VecSink::new(scratch.bytes_mut()), k.as_bytes())?;
                    let key_end = scratch.position();
                    self.value(&mut VecSink::new(scratch.bytes_mut()), v, depth)?;
                    scratch.push(start, key_end, off)?;
                }
                self.write_map(sink, &mut scratch)
            }
            Value::CborPrefix(inner) => self.value(sink, inner, depth),
            Value::Cbor(_)
            | Value::BigFloat { .. }
            | Value::Tag(..)
            | Value::Undefined
            | Value::Simple(_) => Err(err(ErrorCode::NotCollatable, off)),
            Value::Indefinite(_) | Value::Break => Err(err(ErrorCode::UnexpectedMarker, off)),
        }
    }

    /// Emit a map whose pairs are collated in `scratch`, sorted.
    pub(crate) fn write_map<S: Sink>(
        &self,
        sink: &mut S,
        scratch: &mut MapScratch,
    ) -> Result<(), Error> {
        scratch.sort();
        sink.write_u8(TYPE_MAP)?;
        if self.config.property_len_prefix {
            Self::length(sink, scratch.len())?;
        }
        for (k, v) in scratch.iter() {
            sink.write(k)?;
            sink.write(v)?;
        }
        sink.write_u8(TERMINATOR)
    }

    /// Decode a number body into the representation the number kind asks for.
    pub(crate) fn read_num(&mut self, body: &[u8], off: usize) -> Result<Num, Error> {
        let kind = self.config.number_kind;
        if kind == NumberKind::IntNumber {
            let negative = numeric::read_int(body, &mut self.digits, off)?;
            return int_digits(negative, &self.digits)
                .to_int()
                .ok_or_else(|| err(ErrorCode::IntegerOverflow, off));
        }
        let dec = numeric::read_float(body, &mut self.digits, off)?;
        match kind {
            NumberKind::FloatNumber => dec.to_f64(&mut self.text, off).map(Num::Float),
            NumberKind::FloatNumber32 => dec.to_f32(&mut self.text, off).map(Num::Float32),
            NumberKind::SmartNumber32 => match dec.to_int() {
                Some(n) => Ok(n),
                None => dec.to_f32(&mut self.text, off).map(Num::Float32),
            },
            _ => match dec.to_int() {
                Some(n) => Ok(n),
                None => dec.to_f64(&mut self.text, off).map(Num::Float),
            },
        }
    }

    /// Write a number body as JSON number text; `JsonNumber` keeps the exact digits.
    pub(crate) fn number_to_json<S: Sink>(
        &mut self,
        sink: &mut S,
        body: &[u8],
        off: usize,
    ) -> Result<(), Error> {
        match self.config.number_kind {
            NumberKind::JsonNumber => {
                numeric::read_float(body, &mut self.digits, off)?.write_text(sink)
            }
            NumberKind::IntNumber => {
                let negative = numeric::read_int(body, &mut self.digits, off)?;
                int_digits(negative, &self.digits).write_text(sink)
            }
            _ => {
                let num = self.read_num(body, off)?;
                write_num(sink, num)
            }
        }
    }

    /// Write a number body as CBOR; `JsonNumber` emits a tag-38 text carrier.
    pub(crate) fn number_to_cbor<S: Sink>(
        &mut self,
        sink: &mut S,
        body: &[u8],
        off: usize,
    ) -> Result<(), Error> {
        if self.config.number_kind == NumberKind::JsonNumber {
            let dec = numeric::read_float(body, &mut self.digits, off)?;
            self.text.clear();
            dec.write_text(&mut VecSink::new(&mut self.text))?;
            encode_tag(sink, tag::JSON_NUMBER)?;
            return encode_text(sink, &self.text);
        }
        let num = self.read_num(body, off)?;
        encode_num(sink, num)
    }

    /// Decode a string or binary body into `self.text`, returning it.
    pub(crate) fn unsuffix(&mut self, body: &[u8], off: usize) -> Result<&[u8], Error> {
        self.text.clear();
        suffix::decode(body, &mut self.text, off)?;
        Ok(&self.text)
    }

    /// Collate a map key given as a string datum or missing datum.
    fn read_key(&mut self, rd: &mut Reader<'_>) -> Result<String, Error> {
        let off = rd.position();
        match rd.next()? {
            Datum::String(body) => {
                let bytes = self.unsuffix(body, off + 1)?.to_vec();
                String::from_utf8(bytes).map_err(|_| err(ErrorCode::Utf8Invalid, off))
            }
            Datum::Missing => Ok(String::from(MISSING_LITERAL)),
            _ => Err(err(ErrorCode::MapKeyMustBeText, off)),
        }
    }

    fn read_value(&mut self, rd: &mut Reader<'_>, depth: usize) -> Result<Value, Error> {
        let off = rd.position();
        match rd.next()? {
            Datum::Missing => Ok(Value::Missing),
            Datum::Null => Ok(Value::Null),
            Datum::False => Ok(Value::Bool(false)),
            Datum::True => Ok(Value::Bool(true)),
            Datum::Number(body) => self.read_num(body, off + 1).map(Value::from),
            Datum::String(body) => {
                let bytes = self.unsuffix(body, off + 1)?.to_vec();
                String::from_utf8(bytes)
                    .map(Value::Text)
                    .map_err(|_| err(ErrorCode::Utf8Invalid, off))
            }
            Datum::Binary(body) => Ok(Value::Bytes(self.unsuffix(body, off + 1)?.to_vec())),
            Datum::Array(prefix) => {
                let depth = self.config.descend(depth, off)?;
                let mut items = Vec::new();
                while !rd.at_end()? {
                    items.push(self.read_value(rd, depth)?);
                }
                self.check_len(prefix, items.len(), off)?;
                Ok(Value::Array(items))
            }
            Datum::Map(prefix) => {
                let depth = self.config.descend(depth, off)?;
                let mut entries = Vec::new();
                while !rd.at_end()? {
                    let key = self.read_key(rd)?;
                    entries.push((key, self.read_value(rd, depth)?));
                }
                self.check_len(prefix, entries.len(), off)?;
                Ok(Value::Map(entries))
            }
            Datum::End => Err(err(ErrorCode::UnexpectedTerminator, off)),
        }
    }

    /// In strict mode a length prefix must match the element count.
    pub(crate) fn check_len(
        &self,
        prefix: Option<usize>,
        count: usize,
        off: usize,
    ) -> Result<(), Error> {
        match prefix {
            Some(n) if self.config.strict && n != count => {
                Err(err(ErrorCode::LengthPrefixMismatch, off))
            }
            _ => Ok(()),
        }
    }
}

/// Integer magnitude digits read as a decimal.
#[allow(clippy::cast_possible_wrap)]
fn int_digits(negative: bool, digits: &[u8]) -> Decimal<'_> {
    Decimal {
        negative,
        digits,
        exp: digits.len() as i64 - 1,
    }
}

/// Exact or shortest digits of `num` at the precision the number kind uses.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn decimal_of_num<'a>(
    num: Num,
    config: &Config,
    digits: &'a mut Vec<u8>,
    off: usize,
) -> Result<Decimal<'a>, Error> {
    match (config.number_kind, num) {
        (NumberKind::FloatNumber, Num::Int(v)) => decimal_from_f64(v as f64, digits, off),
        (NumberKind::FloatNumber, Num::Uint(v)) => decimal_from_f64(v as f64, digits, off),
        (NumberKind::FloatNumber, Num::Float32(v)) => decimal_from_f64(f64::from(v), digits, off),
        (NumberKind::FloatNumber32, Num::Int(v)) => decimal_from_f32(v as f32, digits, off),
        (NumberKind::FloatNumber32, Num::Uint(v)) => decimal_from_f32(v as f32, digits, off),
        (NumberKind::FloatNumber32 | NumberKind::SmartNumber32, Num::Float(v)) => {
            decimal_from_f32(v as f32, digits, off)
        }
        (NumberKind::IntNumber, Num::Float(v)) => {
            int_of_float(v, config, off).and_then(|i| decimal_from_i64(i, digits))
        }
        (NumberKind::IntNumber, Num::Float32(v)) => {
            int_of_float(f64::from(v), config, off).and_then(|i| decimal_from_i64(i, digits))
        }
        (_, Num::Int(v)) => decimal_from_i64(v, digits),
        (_, Num::Uint(v)) => decimal_from_u64(v, digits),
        (_, Num::Float(v)) => decimal_from_f64(v, digits, off),
        (_, Num::Float32(v)) => decimal_from_f32(v, digits, off),
    }
}

fn int_of_float(v: f64, config: &Config, off: usize) -> Result<i64, Error> {
    if !v.is_finite() {
        return Err(err(ErrorCode::NonFiniteNumber, off));
    }
    if config.strict && v.fract() != 0.0 {
        return Err(err(ErrorCode::FractionalInteger, off));
    }
    truncate_to_int(v, off)
}

/// Write a number datum: integer layout under `IntNumber`, float layout otherwise.
fn write_number<S: Sink>(
    sink: &mut S,
    dec: &Decimal<'_>,
    config: &Config,
    tmp: &mut Vec<u8>,
    off: usize,
) -> Result<(), Error> {
    sink.write_u8(TYPE_NUMBER)?;
    if config.number_kind == NumberKind::IntNumber {
        if config.strict && !dec.is_integral() {
            return Err(err(ErrorCode::FractionalInteger, off));
        }
        if dec.exp >= 0 && usize::try_from(dec.exp).map_or(true, |e| e >= MAX_INT_DIGITS) {
            return Err(err(ErrorCode::IntegerOverflow, off));
        }
        let negative = dec.truncated_digits(tmp);
        numeric::write_int(sink, negative, tmp)?;
    } else {
        numeric::write_float(sink, dec)?;
    }
    sink.write_u8(TERMINATOR)
}

/// One collated datum as read by [`Reader`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum Datum<'a> {
    Missing,
    Null,
    False,
    True,
    /// Number body without its terminator.
    Number(&'a [u8]),
    /// Suffix-encoded body without its terminator.
    String(&'a [u8]),
    /// Suffix-encoded body without its terminator.
    Binary(&'a [u8]),
    /// Array opener with its length prefix, if any.
    Array(Option<usize>),
    /// Map opener with its length prefix, if any.
    Map(Option<usize>),
    /// Container terminator.
    End,
}

/// Pull reader over collated bytes.
pub(crate) struct Reader<'a> {
    code: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) const fn new(code: &'a [u8]) -> Self {
        Self { code, pos: 0 }
    }

    #[inline]
    pub(crate) const fn position(&self) -> usize {
        self.pos
    }

    fn body(&mut self) -> Result<&'a [u8], Error> {
        let start = self.pos;
        let len = suffix::body_len(&self.code[start..], start)?;
        self.pos = start + len + 1;
        Ok(&self.code[start..start + len])
    }

    fn empty_body(&mut self, datum: Datum<'a>) -> Result<Datum<'a>, Error> {
        match self.code.get(self.pos) {
            Some(&TERMINATOR) => {
                self.pos += 1;
                Ok(datum)
            }
            _ => Err(err(ErrorCode::Unterminated, self.pos)),
        }
    }

    fn length_prefix(&mut self) -> Result<Option<usize>, Error> {
        if self.code.get(self.pos) != Some(&TYPE_LENGTH) {
            return Ok(None);
        }
        self.pos += 1;
        let off = self.pos;
        let body = self.body()?;
        let mut digits = Scratch::acquire();
        let negative = numeric::read_int(body, &mut digits, off)?;
        match int_digits(negative, &digits).to_int() {
            Some(Num::Int(n)) => usize::try_from(n)
                .map(Some)
                .map_err(|_| err(ErrorCode::LengthOverflow, off)),
            _ => Err(err(ErrorCode::LengthOverflow, off)),
        }
    }

    /// Read the next datum.
    pub(crate) fn next(&mut self) -> Result<Datum<'a>, Error> {
        let off = self.pos;
        let t = *self
            .code
            .get(off)
            .ok_or_else(|| err(ErrorCode::UnexpectedEof, off))?;
        self.pos += 1;
        match t {
            TERMINATOR => Ok(Datum::End),
            TYPE_MISSING => self.empty_body(Datum::Missing),
            TYPE_NULL => self.empty_body(Datum::Null),
            TYPE_FALSE => self.empty_body(Datum::False),
            TYPE_TRUE => self.empty_body(Datum::True),
            TYPE_NUMBER => self.body().map(Datum::Number),
            TYPE_STRING => self.body().map(Datum::String),
            TYPE_BINARY => self.body().map(Datum::Binary),
            TYPE_ARRAY => self.length_prefix().map(Datum::Array),
            TYPE_MAP => self.length_prefix().map(Datum::Map),
            _ => Err(err(ErrorCode::UnknownCollationType, off)),
        }
    }

    /// Consume a container terminator if one is next.
    pub(crate) fn at_end(&mut self) -> Result<bool, Error> {
        match self.code.get(self.pos) {
            Some(&TERMINATOR) => {
                self.pos += 1;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(err(ErrorCode::Unterminated, self.pos)),
        }
    }
}

/// Collate `value` into `out`; returns the number of bytes written.
///
/// Map pairs are sorted by collated key, then collated value. Numbers are normalized
/// per [`Config::number_kind`].
///
/// # Errors
///
/// Returns `NotCollatable` for undefined, simple values, big floats, embedded CBOR and
/// unrecognised tags; `NonFiniteNumber` for NaN and infinities; `TooManyKeys` for maps
/// larger than [`Config::max_keys`]; `BufferFull` when `out` is too small.
pub fn value_to_collate(value: &Value, out: &mut [u8], config: &Config) -> Result<usize, Error> {
    let mut sink = SliceSink::new(out);
    Collator::new(config).value(&mut sink, value, 0)?;
    Ok(sink.position())
}

/// Decode one collated value from the start of `code`; returns it with the bytes consumed.
///
/// Numbers decode per [`Config::number_kind`]: integers under `IntNumber`, doubles under
/// `FloatNumber`, and integers where exact otherwise doubles under the smart kinds.
///
/// # Errors
///
/// Returns `Malformed` for unknown type bytes, unterminated datums and, in strict mode,
/// length prefixes that disagree with the element count.
pub fn collate_to_value(code: &[u8], config: &Config) -> Result<(Value, usize), Error> {
    let mut rd = Reader::new(code);
    let value = Collator::new(config).read_value(&mut rd, 0)?;
    Ok((value, rd.position()))
}
