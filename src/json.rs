//! JSON text: a pull lexer shared by the `JSON -> *` transcoders, string escaping, and
//! `JSON <-> Value`.

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::{Config, SpaceKind, MISSING_LITERAL};
use crate::error::{err, Error, ErrorCode};
use crate::number::{
    decimal_from_bigint, decimal_from_fraction, parse_number, scan_number, write_f32, write_f64,
    write_i64, write_u64, Num,
};
use crate::pool::Scratch;
use crate::sink::{Sink, SliceSink, VecSink};
use crate::utf8;
use crate::value::Value;

/// A JSON string literal located in the input: `text[start..end]` is the content between
/// the quotes, escapes intact.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StrSpan {
    pub start: usize,
    pub end: usize,
    pub escaped: bool,
}

/// The start of one JSON value.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Token {
    Null,
    True,
    False,
    Number { start: usize, end: usize },
    String(StrSpan),
    ArrayStart,
    ObjectStart,
}

/// Pull lexer over JSON text.
pub(crate) struct Lexer<'a> {
    text: &'a [u8],
    pos: usize,
    space: SpaceKind,
}

impl<'a> Lexer<'a> {
    pub(crate) const fn new(text: &'a [u8], space: SpaceKind) -> Self {
        Self {
            text,
            pos: 0,
            space,
        }
    }

    #[inline]
    pub(crate) const fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.text[start..end]
    }

    fn skip_space(&mut self) {
        self.pos = skip_space(self.text, self.pos, self.space);
    }

    fn expect_literal(&mut self, lit: &[u8]) -> Result<(), Error> {
        let end = self.pos + lit.len();
        if self.text.get(self.pos..end) != Some(lit) {
            let code = if end > self.text.len() {
                ErrorCode::UnexpectedEof
            } else {
                ErrorCode::JsonSyntax
            };
            return Err(err(code, self.pos));
        }
        self.pos = end;
        Ok(())
    }

    /// Read the first token of the next value.
    pub(crate) fn value(&mut self) -> Result<Token, Error> {
        self.skip_space();
        let start = self.pos;
        match self.text.get(start) {
            None => Err(err(ErrorCode::UnexpectedEof, start)),
            Some(b'n') => self.expect_literal(b"null").map(|()| Token::Null),
            Some(b't') => self.expect_literal(b"true").map(|()| Token::True),
            Some(b'f') => self.expect_literal(b"false").map(|()| Token::False),
            Some(b'"') => self.string().map(Token::String),
            Some(b'[') => {
                self.pos += 1;
                Ok(Token::ArrayStart)
            }
            Some(b'{') => {
                self.pos += 1;
                Ok(Token::ObjectStart)
            }
            Some(b'-' | b'0'..=b'9') => {
                let (end, _) = scan_number(self.text, start)?;
                self.pos = end;
                Ok(Token::Number { start, end })
            }
            Some(_) => Err(err(ErrorCode::JsonSyntax, start)),
        }
    }

    fn string(&mut self) -> Result<StrSpan, Error> {
        let span = scan_string(self.text, self.pos)?;
        self.pos = span.end + 1;
        Ok(span)
    }

    /// Advance past `,` or the closing `]`; returns `false` at the end of the array.
    pub(crate) fn next_element(&mut self, first: bool) -> Result<bool, Error> {
        self.skip_space();
        match self.text.get(self.pos) {
            Some(b']') => {
                self.pos += 1;
                Ok(false)
            }
            Some(b',') if !first => {
                self.pos += 1;
                Ok(true)
            }
            _ if first => Ok(true),
            None => Err(err(ErrorCode::UnexpectedEof, self.pos)),
            Some(_) => Err(err(ErrorCode::JsonSyntax, self.pos)),
        }
    }

    /// Advance past `,` or the closing `}` and read the next key and its `:`.
    pub(crate) fn next_key(&mut self, first: bool) -> Result<Option<StrSpan>, Error> {
        self.skip_space();
        match self.text.get(self.pos) {
            Some(b'}') => {
                self.pos += 1;
                return Ok(None);
            }
            Some(b',') if !first => {
                self.pos += 1;
                self.skip_space();
            }
            _ if first => {}
            None => return Err(err(ErrorCode::UnexpectedEof, self.pos)),
            Some(_) => return Err(err(ErrorCode::JsonSyntax, self.pos)),
        }
        if self.text.get(self.pos) != Some(&b'"') {
            return Err(err(ErrorCode::JsonSyntax, self.pos));
        }
        let key = self.string()?;
        self.skip_space();
        if self.text.get(self.pos) != Some(&b':') {
            return Err(err(ErrorCode::JsonSyntax, self.pos));
        }
        self.pos += 1;
        Ok(Some(key))
    }

    /// Skip trailing whitespace; returns the offset one past the value.
    pub(crate) fn finish(&mut self) -> usize {
        self.skip_space();
        self.pos
    }
}

/// Skip whitespace of the given kind starting at `pos`.
#[must_use]
pub(crate) fn skip_space(text: &[u8], mut pos: usize, kind: SpaceKind) -> usize {
    loop {
        match text.get(pos) {
            Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c) => pos += 1,
            Some(0xc2..=0xe3) if kind == SpaceKind::UnicodeSpace => {
                let n = unicode_space_len(&text[pos..]);
                if n == 0 {
                    return pos;
                }
                pos += n;
            }
            _ => return pos,
        }
    }
}

/// Length of a multi-byte Unicode `White_Space` code point at the start of `s`, or 0.
fn unicode_space_len(s: &[u8]) -> usize {
    match s {
        // U+0085, U+00A0
        [0xc2, 0x85 | 0xa0, ..] => 2,
        // U+1680
        [0xe1, 0x9a, 0x80, ..] => 3,
        // U+2000..=U+200A, U+2028, U+2029, U+202F
        [0xe2, 0x80, 0x80..=0x8a | 0xa8 | 0xa9 | 0xaf, ..] => 3,
        // U+205F
        [0xe2, 0x81, 0x9f, ..] => 3,
        // U+3000
        [0xe3, 0x80, 0x80, ..] => 3,
        _ => 0,
    }
}

/// Scan string content from `start` up to the first unescaped quote or the end of
/// `text`, validating escapes. Returns the stop offset and whether an escape was seen.
fn scan_content(text: &[u8], start: usize) -> Result<(usize, bool), Error> {
    let mut i = start;
    let mut escaped = false;
    loop {
        match text.get(i) {
            None | Some(b'"') => return Ok((i, escaped)),
            Some(b'\\') => {
                escaped = true;
                match text.get(i + 1) {
                    Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => i += 2,
                    Some(b'u') => {
                        let hex = text
                            .get(i + 2..i + 6)
                            .ok_or_else(|| err(ErrorCode::UnexpectedEof, i))?;
                        if !hex.iter().all(u8::is_ascii_hexdigit) {
                            return Err(err(ErrorCode::InvalidEscape, i));
                        }
                        i += 6;
                    }
                    None => return Err(err(ErrorCode::UnexpectedEof, i + 1)),
                    Some(_) => return Err(err(ErrorCode::InvalidEscape, i)),
                }
            }
            Some(&b) if b < 0x20 => return Err(err(ErrorCode::JsonSyntax, i)),
            Some(_) => i += 1,
        }
    }
}

/// Scan the string literal whose opening quote is at `pos`, validating escapes.
pub(crate) fn scan_string(text: &[u8], pos: usize) -> Result<StrSpan, Error> {
    debug_assert_eq!(text.get(pos), Some(&b'"'));
    let start = pos + 1;
    let (end, escaped) = scan_content(text, start)?;
    if end == text.len() {
        return Err(err(ErrorCode::UnexpectedEof, end));
    }
    utf8::validate(&text[start..end], start)?;
    Ok(StrSpan {
        start,
        end,
        escaped,
    })
}

/// Check that `raw` is the content of a JSON string literal (escapes intact, no
/// quotes), so it can be written between quotes verbatim.
///
/// # Errors
///
/// Returns `JsonSyntax` for a bare quote or control byte and `InvalidEscape` for a bad
/// or truncated escape.
pub(crate) fn check_string_content(raw: &[u8], offset: usize) -> Result<(), Error> {
    let (end, _) = scan_content(raw, 0).map_err(|e| match e.code {
        ErrorCode::UnexpectedEof => err(ErrorCode::InvalidEscape, offset + e.offset),
        code => err(code, offset + e.offset),
    })?;
    if end != raw.len() {
        return Err(err(ErrorCode::JsonSyntax, offset + end));
    }
    utf8::validate(raw, offset).map(|_| ())
}

fn hex4(raw: &[u8], at: usize, offset: usize) -> Result<u32, Error> {
    let hex = raw
        .get(at..at + 4)
        .ok_or_else(|| err(ErrorCode::InvalidEscape, offset + at))?;
    let mut v = 0u32;
    for &h in hex {
        let d = char::from(h)
            .to_digit(16)
            .ok_or_else(|| err(ErrorCode::InvalidEscape, offset + at))?;
        v = (v << 4) | d;
    }
    Ok(v)
}

/// Decode JSON string content (escapes intact, no quotes) into raw UTF-8.
///
/// # Errors
///
/// Returns `InvalidEscape` for unknown escapes and unpaired surrogates.
pub(crate) fn unescape<S: Sink>(sink: &mut S, raw: &[u8], offset: usize) -> Result<(), Error> {
    let mut run = 0;
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != b'\\' {
            i += 1;
            continue;
        }
        sink.write(&raw[run..i])?;
        let esc = *raw
            .get(i + 1)
            .ok_or_else(|| err(ErrorCode::InvalidEscape, offset + i))?;
        let simple = match esc {
            b'"' => Some(b'"'),
            b'\\' => Some(b'\\'),
            b'/' => Some(b'/'),
            b'b' => Some(0x08),
            b'f' => Some(0x0c),
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            b'u' => None,
            _ => return Err(err(ErrorCode::InvalidEscape, offset + i)),
        };
        if let Some(b) = simple {
            sink.write_u8(b)?;
            i += 2;
        } else {
            let mut cp = hex4(raw, i + 2, offset)?;
            let mut len = 6;
            if (0xd800..0xdc00).contains(&cp) {
                if raw.get(i + 6..i + 8) != Some(b"\\u") {
                    return Err(err(ErrorCode::InvalidEscape, offset + i));
                }
                let low = hex4(raw, i + 8, offset)?;
                if !(0xdc00..0xe000).contains(&low) {
                    return Err(err(ErrorCode::InvalidEscape, offset + i));
                }
                cp = 0x10000 + ((cp - 0xd800) << 10) + (low - 0xdc00);
                len = 12;
            }
            let c = char::from_u32(cp).ok_or_else(|| err(ErrorCode::InvalidEscape, offset + i))?;
            let mut buf = [0u8; 4];
            sink.write(c.encode_utf8(&mut buf).as_bytes())?;
            i += len;
        }
        run = i;
    }
    sink.write(&raw[run..])
}

/// Decode JSON string content into an owned `String`.
pub(crate) fn unescape_to_string(raw: &[u8], offset: usize) -> Result<String, Error> {
    let mut out = Vec::with_capacity(raw.len());
    unescape(&mut VecSink::new(&mut out), raw, offset)?;
    String::from_utf8(out).map_err(|_| err(ErrorCode::Utf8Invalid, offset))
}

/// Write `text` JSON-escaped, without surrounding quotes.
pub(crate) fn escape<S: Sink>(sink: &mut S, text: &[u8]) -> Result<(), Error> {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut run = 0;
    for (i, &b) in text.iter().enumerate() {
        let short = match b {
            b'"' => b'"',
            b'\\' => b'\\',
            b'\n' => b'n',
            b'\r' => b'r',
            b'\t' => b't',
            0x08 => b'b',
            0x0c => b'f',
            0x00..=0x1f => 0,
            _ => continue,
        };
        sink.write(&text[run..i])?;
        if short == 0 {
            sink.write(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX[usize::from(b >> 4)],
                HEX[usize::from(b & 0xf)],
            ])?;
        } else {
            sink.write(&[b'\\', short])?;
        }
        run = i + 1;
    }
    sink.write(&text[run..])
}

/// Write `text` as a quoted JSON string literal.
pub(crate) fn write_string<S: Sink>(sink: &mut S, text: &[u8]) -> Result<(), Error> {
    sink.write_u8(b'"')?;
    escape(sink, text)?;
    sink.write_u8(b'"')
}

fn json_value(lx: &mut Lexer<'_>, config: &Config, depth: usize) -> Result<Value, Error> {
    let start = lx.position();
    match lx.value()? {
        Token::Null => Ok(Value::Null),
        Token::True => Ok(Value::Bool(true)),
        Token::False => Ok(Value::Bool(false)),
        Token::Number { start, end } => {
            parse_number(lx.slice(start, end), config.number_kind, config.strict, start)
                .map(Value::from)
        }
        Token::String(span) => string_value(lx, span).map(Value::Text),
        Token::ArrayStart => {
            let depth = config.descend(depth, start)?;
            let mut items = Vec::new();
            while lx.next_element(items.is_empty())? {
                items.push(json_value(lx, config, depth)?);
            }
            Ok(Value::Array(items))
        }
        Token::ObjectStart => {
            let depth = config.descend(depth, start)?;
            let mut entries = Vec::new();
            while let Some(key) = lx.next_key(entries.is_empty())? {
                let key = string_value(lx, key)?;
                entries.push((key, json_value(lx, config, depth)?));
            }
            Ok(Value::Map(entries))
        }
    }
}

fn string_value(lx: &Lexer<'_>, span: StrSpan) -> Result<String, Error> {
    let raw = lx.slice(span.start, span.end);
    if span.escaped {
        unescape_to_string(raw, span.start)
    } else {
        utf8::validate(raw, span.start).map(String::from)
    }
}

/// Parse one JSON value; returns it with the offset one past the value and any trailing
/// whitespace.
///
/// Numbers follow [`Config::number_kind`]; `JsonNumber` parses like `SmartNumber`.
///
/// # Errors
///
/// Returns `Malformed` with the byte offset of the first grammar violation.
pub fn json_to_value(text: &[u8], config: &Config) -> Result<(Value, usize), Error> {
    let mut lx = Lexer::new(text, config.space_kind);
    let value = json_value(&mut lx, config, 0)?;
    Ok((value, lx.finish()))
}

pub(crate) fn write_value<S: Sink>(
    sink: &mut S,
    value: &Value,
    config: &Config,
    depth: usize,
) -> Result<(), Error> {
    let off = sink.position();
    match value {
        Value::Null => sink.write(b"null"),
        Value::Bool(true) => sink.write(b"true"),
        Value::Bool(false) => sink.write(b"false"),
        Value::Int(v) => write_i64(sink, *v),
        Value::EpochSeconds(v) => match Num::from_i128(*v) {
            Some(Num::Int(v)) => write_i64(sink, v),
            Some(Num::Uint(v)) => write_u64(sink, v),
            _ => Err(err(ErrorCode::IntegerOverflow, off)),
        },
        Value::Uint(v) => write_u64(sink, *v),
        Value::Float32(v) => write_f32(sink, *v),
        Value::Float64(v) | Value::EpochMicros(v) => write_f64(sink, *v),
        Value::Text(s) => write_string(sink, s.as_bytes()),
        Value::Missing => write_string(sink, MISSING_LITERAL.as_bytes()),
        Value::Regexp(re) => write_string(sink, re.as_str().as_bytes()),
        Value::DateTime(dt) => {
            let text = dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true);
            write_string(sink, text.as_bytes())
        }
        Value::BigNum(n) => {
            let mut digits = Scratch::acquire();
            decimal_from_bigint(n, &mut digits)?.write_text(sink)
        }
        Value::DecimalFraction { exp, mantissa } => {
            let mut digits = Scratch::acquire();
            decimal_from_fraction(*exp, *mantissa, &mut digits)?.write_text(sink)
        }
        Value::Array(items) => {
            let depth = config.descend(depth, off)?;
            sink.write_u8(b'[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    sink.write_u8(b',')?;
                }
                write_value(sink, item, config, depth)?;
            }
            sink.write_u8(b']')
        }
        Value::Map(entries) => {
            let depth = config.descend(depth, off)?;
            sink.write_u8(b'{')?;
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    sink.write_u8(b',')?;
                }
                write_string(sink, k.as_bytes())?;
                sink.write_u8(b':')?;
                write_value(sink, v, config, depth)?;
            }
            sink.write_u8(b'}')
        }
        Value::CborPrefix(inner) => write_value(sink, inner, config, depth),
        Value::Bytes(_)
        | Value::Cbor(_)
        | Value::BigFloat { .. }
        | Value::Undefined
        | Value::Simple(_)
        | Value::Tag(..) => Err(err(ErrorCode::NotJsonRepresentable, off)),
        Value::Indefinite(_) | Value::Break => Err(err(ErrorCode::UnexpectedMarker, off)),
    }
}

/// Render `value` as compact JSON into `out`; returns the number of bytes written.
///
/// Date-times and regular expressions render as strings, bignums and decimal fractions
/// as exact number text, and `Missing` as the missing literal string.
///
/// # Errors
///
/// Returns `NotJsonRepresentable` for byte strings, undefined, simple values, big floats
/// and unrecognised tags; `NonFiniteNumber` for NaN and infinities; `BufferFull` when
/// `out` is too small.
pub fn value_to_json(value: &Value, out: &mut [u8], config: &Config) -> Result<usize, Error> {
    let mut sink = SliceSink::new(out);
    write_value(&mut sink, value, config, 0)?;
    Ok(sink.position())
}
