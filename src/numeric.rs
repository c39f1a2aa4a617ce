//! Order-preserving text encodings for numbers.
//!
//! Every encoding is built from the alphabet `-` < `0`..`9` < `>`, so byte-wise
//! comparison of two encodings agrees with numeric comparison of their values.
//!
//! * **Integers** write a sign marker, then the digit count encoded recursively the same
//!   way, then the digits: `0` is `"0"`, `7` is `">7"`, `10` is `">>210"`. Negative
//!   integers use `-` markers and nine's-complement digits, so `-1` is `"-8"` and `-10`
//!   is `"--789"`.
//! * **Floats** write `>` then the integer encoding of the decimal exponent then the
//!   significant digits: `1.5` is `">015"`, `20` is `">>12"`. Negative floats write `-`,
//!   the complement of the positive body, then a closing `>`.
//! * **Small decimals** (`|x| < 1`) write `>` then the fraction digits, or `-` then the
//!   complemented digits then `>`.

use alloc::vec::Vec;

use crate::error::{err, Error, ErrorCode};
use crate::number::{decimal_from_f64, stack_format, Decimal};
use crate::pool::Scratch;
use crate::sink::{Sink, SliceSink};

const POS: u8 = b'>';
const NEG: u8 = b'-';
const ZERO: u8 = b'0';
const MAX_LENGTH_NESTING: usize = 8;

#[inline]
const fn invert(b: u8) -> u8 {
    match b {
        NEG => POS,
        POS => NEG,
        b'0'..=b'9' => b'9' - (b - b'0'),
        other => other,
    }
}

/// Sink adapter writing the complement of every byte.
struct Inverted<'a, S: Sink>(&'a mut S);

impl<S: Sink> Sink for Inverted<'_, S> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &b in bytes {
            self.0.write_u8(invert(b))?;
        }
        Ok(())
    }

    fn position(&self) -> usize {
        self.0.position()
    }

    fn insert(&mut self, at: usize, bytes: &[u8]) -> Result<(), Error> {
        for (i, &b) in bytes.iter().enumerate() {
            self.0.insert(at + i, &[invert(b)])?;
        }
        Ok(())
    }
}

/// Write an integer whose magnitude is `digits` (no leading zeros; empty is zero).
pub(crate) fn write_int<S: Sink>(sink: &mut S, negative: bool, digits: &[u8]) -> Result<(), Error> {
    if digits.is_empty() || digits == b"0" {
        return sink.write_u8(ZERO);
    }
    if negative {
        sink.write_u8(NEG)?;
        write_magnitude(&mut Inverted(sink), digits)
    } else {
        sink.write_u8(POS)?;
        write_magnitude(sink, digits)
    }
}

/// Write the nested length prefix then `digits`; the leading marker is already written.
///
/// Negative magnitudes are written through [`Inverted`], which turns every `>` into `-`.
fn write_magnitude<S: Sink>(sink: &mut S, digits: &[u8]) -> Result<(), Error> {
    if digits.len() > 1 {
        let len = stack_format(format_args!("{}", digits.len()), sink.position())?;
        sink.write_u8(POS)?;
        write_magnitude(sink, len.as_bytes())?;
    }
    sink.write(digits)
}

fn write_exp<S: Sink>(sink: &mut S, exp: i64) -> Result<(), Error> {
    if exp == 0 {
        return sink.write_u8(ZERO);
    }
    let t = stack_format(format_args!("{}", exp.unsigned_abs()), sink.position())?;
    write_int(sink, exp < 0, t.as_bytes())
}

/// Write a decimal in the float layout.
pub(crate) fn write_float<S: Sink>(sink: &mut S, dec: &Decimal<'_>) -> Result<(), Error> {
    if dec.is_zero() {
        return sink.write_u8(ZERO);
    }
    if dec.negative {
        sink.write_u8(NEG)?;
        let mut inv = Inverted(&mut *sink);
        write_exp(&mut inv, dec.exp)?;
        inv.write(dec.digits)?;
        sink.write_u8(POS)
    } else {
        sink.write_u8(POS)?;
        write_exp(sink, dec.exp)?;
        sink.write(dec.digits)
    }
}

/// Write fraction digits of a value in `(-1, 1)` in the small-decimal layout.
pub(crate) fn write_small_decimal<S: Sink>(
    sink: &mut S,
    negative: bool,
    fraction: &[u8],
) -> Result<(), Error> {
    if fraction.iter().all(|&d| d == b'0') {
        return sink.write_u8(ZERO);
    }
    if negative {
        sink.write_u8(NEG)?;
        Inverted(&mut *sink).write(fraction)?;
        sink.write_u8(POS)
    } else {
        sink.write_u8(POS)?;
        sink.write(fraction)
    }
}

/// Location of an encoded integer's magnitude digits inside a code slice.
#[derive(Debug, Clone, Copy)]
struct IntSpan {
    negative: bool,
    start: usize,
    end: usize,
}

impl IntSpan {
    fn digits<'a>(&self, code: &'a [u8]) -> impl Iterator<Item = u8> + 'a {
        let negative = self.negative;
        code[self.start..self.end]
            .iter()
            .map(move |&b| if negative { invert(b) } else { b })
    }

    fn to_i64(self, code: &[u8], offset: usize) -> Result<i64, Error> {
        let m = self.magnitude(code, offset)?;
        Ok(if self.negative { -m } else { m })
    }

    fn magnitude(self, code: &[u8], offset: usize) -> Result<i64, Error> {
        let mut acc: i64 = 0;
        for d in self.digits(code) {
            acc = acc
                .checked_mul(10)
                .and_then(|a| a.checked_add(i64::from(d - b'0')))
                .ok_or_else(|| err(ErrorCode::IntegerOverflow, offset))?;
        }
        Ok(acc)
    }
}

fn read_int_span(code: &[u8], pos: &mut usize, offset: usize) -> Result<IntSpan, Error> {
    match code.get(*pos) {
        Some(&ZERO) => {
            *pos += 1;
            Ok(IntSpan {
                negative: false,
                start: *pos,
                end: *pos,
            })
        }
        Some(&POS) => {
            let (start, end) = read_run(code, pos, false, 0, offset)?;
            Ok(IntSpan {
                negative: false,
                start,
                end,
            })
        }
        Some(&NEG) => {
            let (start, end) = read_run(code, pos, true, 0, offset)?;
            Ok(IntSpan {
                negative: true,
                start,
                end,
            })
        }
        Some(_) => Err(err(ErrorCode::InvalidNumber, offset + *pos)),
        None => Err(err(ErrorCode::UnexpectedEof, offset + *pos)),
    }
}

fn read_run(
    code: &[u8],
    pos: &mut usize,
    negative: bool,
    nesting: usize,
    offset: usize,
) -> Result<(usize, usize), Error> {
    let marker = if negative { NEG } else { POS };
    if nesting > MAX_LENGTH_NESTING || code.get(*pos) != Some(&marker) {
        return Err(err(ErrorCode::InvalidNumber, offset + *pos));
    }
    *pos += 1;
    match code.get(*pos) {
        Some(b) if b.is_ascii_digit() => {
            *pos += 1;
            Ok((*pos - 1, *pos))
        }
        Some(&m) if m == marker => {
            let (s, e) = read_run(code, pos, negative, nesting + 1, offset)?;
            let len = IntSpan {
                negative,
                start: s,
                end: e,
            }
            .magnitude(code, offset + s)?;
            let len = usize::try_from(len).map_err(|_| err(ErrorCode::InvalidNumber, offset + s))?;
            let start = *pos;
            let end = start
                .checked_add(len)
                .ok_or_else(|| err(ErrorCode::LengthOverflow, offset + start))?;
            if end > code.len() {
                return Err(err(ErrorCode::UnexpectedEof, offset + code.len()));
            }
            if !code[start..end].iter().all(u8::is_ascii_digit) {
                return Err(err(ErrorCode::InvalidNumber, offset + start));
            }
            *pos = end;
            Ok((start, end))
        }
        _ => Err(err(ErrorCode::InvalidNumber, offset + *pos)),
    }
}

/// Decode an integer encoding that spans all of `code`, writing its magnitude digits
/// to `out`. Returns the sign; zero yields no digits.
pub(crate) fn read_int(code: &[u8], out: &mut Vec<u8>, offset: usize) -> Result<bool, Error> {
    let mut pos = 0;
    let span = read_int_span(code, &mut pos, offset)?;
    if pos != code.len() {
        return Err(err(ErrorCode::InvalidNumber, offset + pos));
    }
    out.clear();
    out.extend(span.digits(code));
    Ok(span.negative)
}

/// Decode a float-layout encoding that spans all of `code`, digits into `out`.
pub(crate) fn read_float<'a>(
    code: &[u8],
    out: &'a mut Vec<u8>,
    offset: usize,
) -> Result<Decimal<'a>, Error> {
    out.clear();
    let negative = match code {
        [ZERO] => return Ok(Decimal::ZERO),
        [POS, ..] => {
            out.extend_from_slice(&code[1..]);
            false
        }
        [NEG, body @ .., POS] => {
            out.extend(body.iter().map(|&b| invert(b)));
            true
        }
        [] => return Err(err(ErrorCode::UnexpectedEof, offset)),
        _ => return Err(err(ErrorCode::InvalidNumber, offset)),
    };
    let mut pos = 0;
    let span = read_int_span(out, &mut pos, offset + 1)?;
    let exp = span.to_i64(out, offset + 1)?;
    out.drain(..pos);
    let valid = out.first().is_some_and(|&d| d != b'0')
        && out.last().is_some_and(|&d| d != b'0')
        && out.iter().all(u8::is_ascii_digit);
    if !valid {
        return Err(err(ErrorCode::InvalidNumber, offset + 1 + pos));
    }
    Ok(Decimal {
        negative,
        digits: out,
        exp,
    })
}

/// Decode a small-decimal encoding; returns the sign, fraction digits go to `out`.
pub(crate) fn read_small_decimal(
    code: &[u8],
    out: &mut Vec<u8>,
    offset: usize,
) -> Result<bool, Error> {
    out.clear();
    let negative = match code {
        [ZERO] => return Ok(false),
        [POS, digits @ ..] => {
            out.extend_from_slice(digits);
            false
        }
        [NEG, digits @ .., POS] => {
            out.extend(digits.iter().map(|&b| invert(b)));
            true
        }
        [] => return Err(err(ErrorCode::UnexpectedEof, offset)),
        _ => return Err(err(ErrorCode::InvalidNumber, offset)),
    };
    if out.is_empty() || !out.iter().all(u8::is_ascii_digit) {
        return Err(err(ErrorCode::InvalidNumber, offset));
    }
    Ok(negative)
}

/// Split integer text (`-?[0-9]+`) into sign and magnitude without leading zeros.
fn int_text(text: &[u8]) -> Result<(bool, &[u8]), Error> {
    let (negative, digits) = match text {
        [b'-', rest @ ..] => (true, rest),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(err(ErrorCode::InvalidNumber, 0));
    }
    let first = digits.iter().position(|&d| d != b'0').unwrap_or(digits.len());
    Ok((negative, &digits[first..]))
}

/// Encode decimal integer text such as `-42` into `out`; returns the bytes written.
///
/// The integer may have any number of digits.
///
/// # Errors
///
/// Returns `InvalidNumber` for text other than an optional `-` followed by digits, and
/// `BufferFull` when `out` is too small.
pub fn encode_int(text: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    let (negative, digits) = int_text(text)?;
    let mut sink = SliceSink::new(out);
    write_int(&mut sink, negative, digits)?;
    Ok(sink.position())
}

/// Decode an integer encoding back to decimal text in `out`; returns the bytes written.
///
/// # Errors
///
/// Returns `Malformed` when `code` is not exactly one integer encoding, and `BufferFull`
/// when `out` is too small.
pub fn decode_int(code: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    let mut digits = Scratch::acquire();
    let negative = read_int(code, &mut digits, 0)?;
    let mut sink = SliceSink::new(out);
    if digits.is_empty() {
        sink.write_u8(b'0')?;
    } else {
        if negative {
            sink.write_u8(b'-')?;
        }
        sink.write(&digits)?;
    }
    Ok(sink.position())
}

/// Encode a finite double in the float layout; returns the bytes written.
///
/// # Errors
///
/// Returns `NonFiniteNumber` for NaN and infinities, and `BufferFull` when `out` is too
/// small.
pub fn encode_float(value: f64, out: &mut [u8]) -> Result<usize, Error> {
    let mut digits = Scratch::acquire();
    let dec = decimal_from_f64(value, &mut digits, 0)?;
    let mut sink = SliceSink::new(out);
    write_float(&mut sink, &dec)?;
    Ok(sink.position())
}

/// Decode a float-layout encoding to the nearest double.
///
/// # Errors
///
/// Returns `Malformed` when `code` is not exactly one float encoding.
pub fn decode_float(code: &[u8]) -> Result<f64, Error> {
    let mut digits = Scratch::acquire();
    let mut text = Scratch::acquire();
    read_float(code, &mut digits, 0)?.to_f64(&mut text, 0)
}

/// Encode a finite double with `|value| < 1` in the small-decimal layout.
///
/// # Errors
///
/// Returns `InvalidNumber` when `|value| >= 1`, `NonFiniteNumber` for NaN and
/// infinities, and `BufferFull` when `out` is too small.
pub fn encode_small_decimal(value: f64, out: &mut [u8]) -> Result<usize, Error> {
    if value.abs() >= 1.0 {
        return Err(err(ErrorCode::InvalidNumber, 0));
    }
    let mut digits = Scratch::acquire();
    let dec = decimal_from_f64(value, &mut digits, 0)?;
    let mut fraction = Scratch::acquire();
    if !dec.is_zero() {
        let zeros = usize::try_from(-dec.exp - 1).map_err(|_| err(ErrorCode::InvalidNumber, 0))?;
        fraction.resize(zeros, b'0');
        fraction.extend_from_slice(dec.digits);
    }
    let mut sink = SliceSink::new(out);
    write_small_decimal(&mut sink, dec.negative, &fraction)?;
    Ok(sink.position())
}

/// Decode a small-decimal encoding to the nearest double.
///
/// # Errors
///
/// Returns `Malformed` when `code` is not exactly one small-decimal encoding.
pub fn decode_small_decimal(code: &[u8]) -> Result<f64, Error> {
    let mut fraction = Scratch::acquire();
    let negative = read_small_decimal(code, &mut fraction, 0)?;
    if fraction.is_empty() {
        return Ok(0.0);
    }
    let mut text = Scratch::acquire();
    if negative {
        text.push(b'-');
    }
    text.extend_from_slice(b"0.");
    text.extend_from_slice(&fraction);
    let s = core::str::from_utf8(&text).map_err(|_| err(ErrorCode::InvalidNumber, 0))?;
    s.parse::<f64>()
        .map_err(|_| err(ErrorCode::InvalidNumber, 0))
}
