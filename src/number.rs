//! Number text: the JSON number grammar, per-[`NumberKind`] parsing, exact decimal
//! digit extraction and JSON rendering.
//!
//! Exact digits are carried as a [`Decimal`]: a sign, the significant digits without
//! leading or trailing zeros, and the base-10 exponent of the first digit, so the value
//! is `d1.d2d3... * 10^exp`. Zero has no digits.

use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt::{self, Write as _};

use num_bigint::BigInt;

use crate::config::NumberKind;
use crate::error::{err, Error, ErrorCode};
use crate::sink::{Sink, VecSink};

/// A parsed number in its target representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer above `i64::MAX`.
    Uint(u64),
    /// Double.
    Float(f64),
    /// Single.
    Float32(f32),
}

impl Num {
    /// An integer as `Int`, or as `Uint` above `i64::MAX`; `None` outside both.
    pub(crate) fn from_i128(v: i128) -> Option<Self> {
        i64::try_from(v)
            .map(Self::Int)
            .ok()
            .or_else(|| u64::try_from(v).ok().map(Self::Uint))
    }
}

/// Fixed-capacity text buffer for `core::fmt` output.
pub(crate) struct StackText<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> StackText<N> {
    pub(crate) const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl<const N: usize> fmt::Write for StackText<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len.checked_add(s.len()).ok_or(fmt::Error)?;
        if end > N {
            return Err(fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

/// Format `args` into a stack buffer.
pub(crate) fn stack_format(
    args: fmt::Arguments<'_>,
    offset: usize,
) -> Result<StackText<48>, Error> {
    let mut t = StackText::new();
    t.write_fmt(args)
        .map_err(|_| err(ErrorCode::InvalidNumber, offset))?;
    Ok(t)
}

/// Scan a JSON number starting at `start`.
///
/// Returns the offset one past the number and whether it used integer syntax (no
/// fraction, no exponent).
///
/// # Errors
///
/// Returns `InvalidNumber` at the first byte that breaks the grammar.
pub(crate) fn scan_number(text: &[u8], start: usize) -> Result<(usize, bool), Error> {
    let mut pos = start;
    if text.get(pos) == Some(&b'-') {
        pos += 1;
    }
    match text.get(pos) {
        Some(b'0') => pos += 1,
        Some(b'1'..=b'9') => pos = skip_digits(text, pos + 1),
        _ => return Err(err(ErrorCode::InvalidNumber, pos)),
    }
    let mut integer = true;
    if text.get(pos) == Some(&b'.') {
        integer = false;
        let digits = pos + 1;
        pos = skip_digits(text, digits);
        if pos == digits {
            return Err(err(ErrorCode::InvalidNumber, pos));
        }
    }
    if matches!(text.get(pos), Some(b'e' | b'E')) {
        integer = false;
        pos += 1;
        if matches!(text.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let digits = pos;
        pos = skip_digits(text, digits);
        if pos == digits {
            return Err(err(ErrorCode::InvalidNumber, pos));
        }
    }
    Ok((pos, integer))
}

#[inline]
fn skip_digits(text: &[u8], mut pos: usize) -> usize {
    while matches!(text.get(pos), Some(b'0'..=b'9')) {
        pos += 1;
    }
    pos
}

/// Check that `text` is exactly one JSON number; returns whether it is integer syntax.
fn whole_number(text: &[u8], offset: usize) -> Result<bool, Error> {
    let (end, integer) = scan_number(text, 0).map_err(|e| err(e.code, offset + e.offset))?;
    if end != text.len() {
        return Err(err(ErrorCode::InvalidNumber, offset + end));
    }
    Ok(integer)
}

fn ascii(text: &[u8], offset: usize) -> Result<&str, Error> {
    core::str::from_utf8(text).map_err(|_| err(ErrorCode::InvalidNumber, offset))
}

fn parse_f64(s: &str, offset: usize) -> Result<f64, Error> {
    let f: f64 = s
        .parse()
        .map_err(|_| err(ErrorCode::InvalidNumber, offset))?;
    if f.is_finite() {
        Ok(f)
    } else {
        Err(err(ErrorCode::NonFiniteNumber, offset))
    }
}

fn parse_f32(s: &str, offset: usize) -> Result<f32, Error> {
    let f: f32 = s
        .parse()
        .map_err(|_| err(ErrorCode::InvalidNumber, offset))?;
    if f.is_finite() {
        Ok(f)
    } else {
        Err(err(ErrorCode::NonFiniteNumber, offset))
    }
}

fn parse_integer(s: &str) -> Option<Num> {
    s.parse::<i64>()
        .map(Num::Int)
        .ok()
        .or_else(|| s.parse::<u64>().ok().map(Num::Uint))
}

/// Truncate a finite double toward zero into `i64`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn truncate_to_int(f: f64, offset: usize) -> Result<i64, Error> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if !f.is_finite() {
        return Err(err(ErrorCode::NonFiniteNumber, offset));
    }
    let t = f.trunc();
    if t >= LIMIT || t < -LIMIT {
        return Err(err(ErrorCode::IntegerOverflow, offset));
    }
    Ok(t as i64)
}

/// Parse one complete JSON number text into the representation `kind` asks for.
///
/// `JsonNumber` parses like `SmartNumber`: callers that keep raw text never get here.
///
/// # Errors
///
/// Returns `InvalidNumber` for text outside the grammar, `IntegerOverflow` when an
/// integer kind cannot hold the value, `FractionalInteger` for a fraction under
/// `IntNumber` in strict mode, and `NonFiniteNumber` when a float overflows.
pub(crate) fn parse_number(
    text: &[u8],
    kind: NumberKind,
    strict: bool,
    offset: usize,
) -> Result<Num, Error> {
    let integer = whole_number(text, offset)?;
    let s = ascii(text, offset)?;
    match kind {
        NumberKind::IntNumber => {
            if integer {
                parse_integer(s).ok_or_else(|| err(ErrorCode::IntegerOverflow, offset))
            } else if strict {
                Err(err(ErrorCode::FractionalInteger, offset))
            } else {
                truncate_to_int(parse_f64(s, offset)?, offset).map(Num::Int)
            }
        }
        NumberKind::FloatNumber => parse_f64(s, offset).map(Num::Float),
        NumberKind::FloatNumber32 => parse_f32(s, offset).map(Num::Float32),
        NumberKind::SmartNumber | NumberKind::JsonNumber => match integer
            .then(|| parse_integer(s))
            .flatten()
        {
            Some(n) => Ok(n),
            None => parse_f64(s, offset).map(Num::Float),
        },
        NumberKind::SmartNumber32 => match integer.then(|| parse_integer(s)).flatten() {
            Some(n) => Ok(n),
            None => parse_f32(s, offset).map(Num::Float32),
        },
    }
}

/// Exact decimal form of a number; see the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Decimal<'a> {
    pub negative: bool,
    pub digits: &'a [u8],
    pub exp: i64,
}

impl<'a> Decimal<'a> {
    pub(crate) const ZERO: Decimal<'static> = Decimal {
        negative: false,
        digits: &[],
        exp: 0,
    };

    #[inline]
    pub(crate) const fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Returns `true` when no digit lies right of the decimal point.
    #[allow(clippy::cast_possible_wrap)]
    pub(crate) const fn is_integral(&self) -> bool {
        if self.is_zero() {
            return true;
        }
        match self.exp.checked_add(1) {
            Some(whole) => self.exp >= 0 && (self.digits.len() as i64) <= whole,
            None => true,
        }
    }

    /// The integer value when it is integral and fits `i64` or `u64`.
    pub(crate) fn to_int(&self) -> Option<Num> {
        if self.is_zero() {
            return Some(Num::Int(0));
        }
        if !self.is_integral() || self.exp >= 20 {
            return None;
        }
        let mut acc: u128 = 0;
        for &d in self.digits {
            acc = acc * 10 + u128::from(d - b'0');
        }
        for _ in self.digits.len()..=usize::try_from(self.exp).ok()? {
            acc *= 10;
        }
        if self.negative {
            let v = i128::try_from(acc).ok()?;
            i64::try_from(-v).ok().map(Num::Int)
        } else if let Ok(v) = i64::try_from(acc) {
            Some(Num::Int(v))
        } else {
            u64::try_from(acc).ok().map(Num::Uint)
        }
    }

    /// Integer digits of this value truncated toward zero, written to `out`.
    ///
    /// Returns the sign; a zero result yields no digits.
    pub(crate) fn truncated_digits(&self, out: &mut Vec<u8>) -> bool {
        out.clear();
        if self.is_zero() || self.exp < 0 {
            return false;
        }
        let whole = usize::try_from(self.exp)
            .unwrap_or(usize::MAX)
            .saturating_add(1);
        if whole <= self.digits.len() {
            out.extend_from_slice(&self.digits[..whole]);
        } else {
            out.extend_from_slice(self.digits);
            out.resize(whole, b'0');
        }
        self.negative
    }

    /// Render as JSON number text.
    pub(crate) fn write_text<S: Sink>(&self, sink: &mut S) -> Result<(), Error> {
        if self.is_zero() {
            return sink.write_u8(b'0');
        }
        if self.negative {
            sink.write_u8(b'-')?;
        }
        let n = self.digits.len();
        match usize::try_from(self.exp) {
            Ok(e) if e < 21 => {
                if n <= e + 1 {
                    sink.write(self.digits)?;
                    for _ in n..=e {
                        sink.write_u8(b'0')?;
                    }
                } else {
                    sink.write(&self.digits[..=e])?;
                    sink.write_u8(b'.')?;
                    sink.write(&self.digits[e + 1..])?;
                }
                Ok(())
            }
            _ if self.exp < 0 && self.exp > -7 => {
                sink.write(b"0.")?;
                for _ in 1..-self.exp {
                    sink.write_u8(b'0')?;
                }
                sink.write(self.digits)
            }
            _ => {
                sink.write_u8(self.digits[0])?;
                if n > 1 {
                    sink.write_u8(b'.')?;
                    sink.write(&self.digits[1..])?;
                }
                let e = stack_format(format_args!("e{}", self.exp), sink.position())?;
                sink.write(e.as_bytes())
            }
        }
    }

    /// Nearest double, using `tmp` for the intermediate text.
    pub(crate) fn to_f64(&self, tmp: &mut Vec<u8>, offset: usize) -> Result<f64, Error> {
        tmp.clear();
        self.write_text(&mut VecSink::new(tmp))?;
        parse_f64(ascii(tmp, offset)?, offset)
    }

    /// Nearest single, using `tmp` for the intermediate text.
    pub(crate) fn to_f32(&self, tmp: &mut Vec<u8>, offset: usize) -> Result<f32, Error> {
        tmp.clear();
        self.write_text(&mut VecSink::new(tmp))?;
        parse_f32(ascii(tmp, offset)?, offset)
    }
}

/// Extract the exact decimal digits of a JSON number text into `digits`.
///
/// # Errors
///
/// Returns `InvalidNumber` when `text` is not exactly one JSON number.
pub(crate) fn decimal_from_text<'a>(
    text: &[u8],
    digits: &'a mut Vec<u8>,
    offset: usize,
) -> Result<Decimal<'a>, Error> {
    whole_number(text, offset)?;
    digits.clear();
    let mut pos = 0;
    let negative = text.first() == Some(&b'-');
    if negative {
        pos = 1;
    }

    // Position of the decimal point counted in mantissa digits, and of the first
    // significant digit.
    let mut point: i64 = 0;
    let mut index: i64 = 0;
    let mut first: Option<i64> = None;
    let mut in_fraction = false;
    while let Some(&b) = text.get(pos) {
        match b {
            b'0'..=b'9' => {
                if first.is_some() || b != b'0' {
                    first.get_or_insert(index);
                    digits.push(b);
                }
                index += 1;
                if !in_fraction {
                    point += 1;
                }
            }
            b'.' => in_fraction = true,
            _ => break,
        }
        pos += 1;
    }

    let mut exp10: i64 = 0;
    if matches!(text.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        let neg_exp = text.get(pos) == Some(&b'-');
        if matches!(text.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let overflow = || err(ErrorCode::ExponentOverflow, offset);
        for &b in &text[pos..] {
            exp10 = exp10
                .checked_mul(10)
                .and_then(|e| e.checked_add(i64::from(b - b'0')))
                .ok_or_else(overflow)?;
        }
        if neg_exp {
            exp10 = -exp10;
        }
    }

    let Some(first) = first else {
        return Ok(Decimal::ZERO);
    };
    while digits.last() == Some(&b'0') {
        digits.pop();
    }
    // i64::MIN has no integer encoding in the collation
    let exp = (point - 1 - first)
        .checked_add(exp10)
        .filter(|&e| e != i64::MIN)
        .ok_or_else(|| err(ErrorCode::ExponentOverflow, offset))?;
    Ok(Decimal {
        negative,
        digits,
        exp,
    })
}

/// Shortest round-trip digits of a finite double.
///
/// # Errors
///
/// Returns `NonFiniteNumber` for NaN and infinities.
pub(crate) fn decimal_from_f64(
    value: f64,
    digits: &mut Vec<u8>,
    offset: usize,
) -> Result<Decimal<'_>, Error> {
    if !value.is_finite() {
        return Err(err(ErrorCode::NonFiniteNumber, offset));
    }
    let t = stack_format(format_args!("{value:e}"), offset)?;
    decimal_from_text(t.as_bytes(), digits, offset)
}

/// Shortest round-trip digits of a finite single.
///
/// # Errors
///
/// Returns `NonFiniteNumber` for NaN and infinities.
pub(crate) fn decimal_from_f32(
    value: f32,
    digits: &mut Vec<u8>,
    offset: usize,
) -> Result<Decimal<'_>, Error> {
    if !value.is_finite() {
        return Err(err(ErrorCode::NonFiniteNumber, offset));
    }
    let t = stack_format(format_args!("{value:e}"), offset)?;
    decimal_from_text(t.as_bytes(), digits, offset)
}

pub(crate) fn decimal_from_i64(value: i64, digits: &mut Vec<u8>) -> Result<Decimal<'_>, Error> {
    let t = stack_format(format_args!("{value}"), 0)?;
    decimal_from_text(t.as_bytes(), digits, 0)
}

pub(crate) fn decimal_from_u64(value: u64, digits: &mut Vec<u8>) -> Result<Decimal<'_>, Error> {
    let t = stack_format(format_args!("{value}"), 0)?;
    decimal_from_text(t.as_bytes(), digits, 0)
}

pub(crate) fn decimal_from_bigint<'a>(
    value: &BigInt,
    digits: &'a mut Vec<u8>,
) -> Result<Decimal<'a>, Error> {
    let s = value.to_string();
    decimal_from_text(s.as_bytes(), digits, 0)
}

/// Digits of `mantissa * 10^exp`.
pub(crate) fn decimal_from_fraction(
    exp: i64,
    mantissa: i64,
    digits: &mut Vec<u8>,
) -> Result<Decimal<'_>, Error> {
    let t = stack_format(format_args!("{mantissa}e{exp}"), 0)?;
    decimal_from_text(t.as_bytes(), digits, 0)
}

/// Write a double as JSON number text.
///
/// Magnitudes in `[1e-6, 1e21)` use plain notation, others scientific.
///
/// # Errors
///
/// Returns `NonFiniteNumber` for NaN and infinities.
pub(crate) fn write_f64<S: Sink>(sink: &mut S, value: f64) -> Result<(), Error> {
    let off = sink.position();
    if !value.is_finite() {
        return Err(err(ErrorCode::NonFiniteNumber, off));
    }
    let a = value.abs();
    let t = if a == 0.0 || (1e-6..1e21).contains(&a) {
        stack_format(format_args!("{value}"), off)
    } else {
        stack_format(format_args!("{value:e}"), off)
    };
    match t {
        Ok(t) => sink.write(t.as_bytes()),
        // Plain notation of small values can exceed the stack buffer.
        Err(_) => sink.write(stack_format(format_args!("{value:e}"), off)?.as_bytes()),
    }
}

/// Write a single as JSON number text.
///
/// # Errors
///
/// Returns `NonFiniteNumber` for NaN and infinities.
pub(crate) fn write_f32<S: Sink>(sink: &mut S, value: f32) -> Result<(), Error> {
    let off = sink.position();
    if !value.is_finite() {
        return Err(err(ErrorCode::NonFiniteNumber, off));
    }
    let a = value.abs();
    let t = if a == 0.0 || (1e-6..1e21).contains(&a) {
        stack_format(format_args!("{value}"), off)
    } else {
        stack_format(format_args!("{value:e}"), off)
    };
    match t {
        Ok(t) => sink.write(t.as_bytes()),
        Err(_) => sink.write(stack_format(format_args!("{value:e}"), off)?.as_bytes()),
    }
}

pub(crate) fn write_i64<S: Sink>(sink: &mut S, value: i64) -> Result<(), Error> {
    let t = stack_format(format_args!("{value}"), sink.position())?;
    sink.write(t.as_bytes())
}

pub(crate) fn write_u64<S: Sink>(sink: &mut S, value: u64) -> Result<(), Error> {
    let t = stack_format(format_args!("{value}"), sink.position())?;
    sink.write(t.as_bytes())
}

/// Write a [`Num`] as JSON number text.
pub(crate) fn write_num<S: Sink>(sink: &mut S, num: Num) -> Result<(), Error> {
    match num {
        Num::Int(v) => write_i64(sink, v),
        Num::Uint(v) => write_u64(sink, v),
        Num::Float(v) => write_f64(sink, v),
        Num::Float32(v) => write_f32(sink, v),
    }
}
