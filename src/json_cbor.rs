//! Direct `JSON <-> CBOR` transcoding.
//!
//! JSON strings travel as tag 37 wrapping a byte string of the literal's content with
//! its escapes intact, so `JSON -> CBOR -> JSON` reproduces strings byte for byte. Under
//! [`NumberKind::JsonNumber`] numbers travel as tag 38 wrapping their text.

use crate::config::{Config, NumberKind};
use crate::decode::{cbor_to_value, head, Head};
use crate::encode::{encode_bytes, encode_num, encode_tag, encode_text, Pending, FALSE, NULL, TRUE};
use crate::error::{err, Error, ErrorCode};
use crate::json::{check_string_content, write_string, write_value, Lexer, Token};
use crate::number::{parse_number, scan_number, write_f32, write_f64, write_i64, write_u64};
use crate::sink::{Sink, SliceSink};
use crate::utf8;
use crate::value::tag;
use crate::wire::{
    read_be_u32, read_be_u64, read_len, read_string, read_u8, read_uint, split, BREAK,
    MAJOR_ARRAY, MAJOR_MAP,
};

/// Emit the raw JSON string content as a tag-37 byte string.
pub(crate) fn encode_json_string<S: Sink>(sink: &mut S, raw: &[u8]) -> Result<(), Error> {
    encode_tag(sink, tag::JSON_STRING)?;
    encode_bytes(sink, raw)
}

fn json_value<S: Sink>(
    lx: &mut Lexer<'_>,
    sink: &mut S,
    config: &Config,
    depth: usize,
) -> Result<(), Error> {
    let start = lx.position();
    match lx.value()? {
        Token::Null => sink.write_u8(NULL),
        Token::True => sink.write_u8(TRUE),
        Token::False => sink.write_u8(FALSE),
        Token::Number { start, end } => {
            let text = lx.slice(start, end);
            if config.number_kind == NumberKind::JsonNumber {
                encode_tag(sink, tag::JSON_NUMBER)?;
                return encode_text(sink, text);
            }
            let num = parse_number(text, config.number_kind, config.strict, start)?;
            encode_num(sink, num)
        }
        Token::String(span) => encode_json_string(sink, lx.slice(span.start, span.end)),
        Token::ArrayStart => {
            let depth = config.descend(depth, start)?;
            let pending = Pending::open(sink, MAJOR_ARRAY, config.container_encoding)?;
            let mut count = 0;
            while lx.next_element(count == 0)? {
                json_value(lx, sink, config, depth)?;
                count += 1;
            }
            pending.close(sink, count)
        }
        Token::ObjectStart => {
            let depth = config.descend(depth, start)?;
            let pending = Pending::open(sink, MAJOR_MAP, config.container_encoding)?;
            let mut count = 0;
            while let Some(key) = lx.next_key(count == 0)? {
                encode_json_string(sink, lx.slice(key.start, key.end))?;
                json_value(lx, sink, config, depth)?;
                count += 1;
            }
            pending.close(sink, count)
        }
    }
}

/// Transcode one JSON value at the start of `text` into CBOR in `out`.
///
/// Returns `(read, written)`: the offset one past the value and any trailing whitespace,
/// and the number of bytes written.
///
/// # Errors
///
/// Returns `Malformed` at the first grammar violation, `NumberOutOfRange` when a number
/// does not fit the configured kind, and `BufferFull` when `out` is too small.
pub fn json_to_cbor(text: &[u8], out: &mut [u8], config: &Config) -> Result<(usize, usize), Error> {
    let mut lx = Lexer::new(text, config.space_kind);
    let mut sink = SliceSink::new(out);
    json_value(&mut lx, &mut sink, config, 0)?;
    Ok((lx.finish(), sink.position()))
}

/// Header-by-header CBOR reader writing JSON.
struct CborToJson<'a, 'c> {
    data: &'a [u8],
    pos: usize,
    config: &'c Config,
}

impl<'a> CborToJson<'a, '_> {
    fn string_body(&mut self) -> Result<&'a [u8], Error> {
        read_string(self.data, &mut self.pos)
    }

    /// Whether a break-stop closes the current container, consuming it.
    fn at_break(&mut self, remaining: Option<usize>) -> Result<bool, Error> {
        match remaining {
            Some(n) => Ok(n == 0),
            None => match self.data.get(self.pos) {
                Some(&BREAK) => {
                    self.pos += 1;
                    Ok(true)
                }
                Some(_) => Ok(false),
                None => Err(err(ErrorCode::UnexpectedEof, self.pos)),
            },
        }
    }

    fn key<S: Sink>(&mut self, sink: &mut S) -> Result<(), Error> {
        let off = self.pos;
        let ib = *self
            .data
            .get(off)
            .ok_or_else(|| err(ErrorCode::UnexpectedEof, off))?;
        match head(ib) {
            Head::Text => {
                let body = self.string_body()?;
                write_string(sink, utf8::validate(body, off)?.as_bytes())
            }
            Head::Tag => {
                self.pos += 1;
                let number = read_uint(self.data, &mut self.pos, split(ib).1, off)?;
                if number != tag::JSON_STRING {
                    return Err(err(ErrorCode::MapKeyMustBeText, off));
                }
                self.raw_string(sink)
            }
            _ => Err(err(ErrorCode::MapKeyMustBeText, off)),
        }
    }

    /// Re-quote a tag-37 payload.
    /// Write a tag-37 payload between quotes; it must already be valid string content.
    fn raw_string<S: Sink>(&mut self, sink: &mut S) -> Result<(), Error> {
        let raw = self.string_body()?;
        check_string_content(raw, self.pos - raw.len())?;
        sink.write_u8(b'"')?;
        sink.write(raw)?;
        sink.write_u8(b'"')
    }

    fn tagged<S: Sink>(
        &mut self,
        sink: &mut S,
        number: u64,
        off: usize,
        depth: usize,
    ) -> Result<(), Error> {
        match number {
            tag::JSON_STRING => self.raw_string(sink),
            tag::JSON_NUMBER => {
                let raw = self.string_body()?;
                match scan_number(raw, 0) {
                    Ok((end, _)) if end == raw.len() => sink.write(raw),
                    _ => Err(err(ErrorCode::InvalidNumber, off)),
                }
            }
            tag::SELF_DESCRIBE => self.item(sink, depth),
            tag::DATE_TIME
            | tag::EPOCH
            | tag::POS_BIGNUM
            | tag::NEG_BIGNUM
            | tag::DECIMAL_FRACTION => {
                let (value, used) = cbor_to_value(&self.data[off..], self.config)
                    .map_err(|e| err(e.code, off + e.offset))?;
                self.pos = off + used;
                write_value(sink, &value, self.config, depth)
            }
            _ => Err(err(ErrorCode::NotJsonRepresentable, off)),
        }
    }

    fn item<S: Sink>(&mut self, sink: &mut S, depth: usize) -> Result<(), Error> {
        let off = self.pos;
        let ib = read_u8(self.data, &mut self.pos)?;
        let (_, ai) = split(ib);
        match head(ib) {
            Head::Uint => write_u64(sink, read_uint(self.data, &mut self.pos, ai, off)?),
            Head::Nint => {
                let n = read_uint(self.data, &mut self.pos, ai, off)?;
                let n = i64::try_from(n).map_err(|_| err(ErrorCode::IntegerOverflow, off))?;
                write_i64(sink, -1 - n)
            }
            Head::Text => {
                self.pos = off;
                let body = self.string_body()?;
                write_string(sink, utf8::validate(body, off)?.as_bytes())
            }
            Head::Array | Head::IndefiniteArray => {
                let depth = self.config.descend(depth, off)?;
                let mut remaining = read_len(self.data, &mut self.pos, ai, off)?;
                sink.write_u8(b'[')?;
                let mut first = true;
                while !self.at_break(remaining)? {
                    if !first {
                        sink.write_u8(b',')?;
                    }
                    first = false;
                    self.item(sink, depth)?;
                    remaining = remaining.map(|n| n - 1);
                }
                sink.write_u8(b']')
            }
            Head::Map | Head::IndefiniteMap => {
                let depth = self.config.descend(depth, off)?;
                let mut remaining = read_len(self.data, &mut self.pos, ai, off)?;
                sink.write_u8(b'{')?;
                let mut first = true;
                while !self.at_break(remaining)? {
                    if !first {
                        sink.write_u8(b',')?;
                    }
                    first = false;
                    self.key(sink)?;
                    sink.write_u8(b':')?;
                    self.item(sink, depth)?;
                    remaining = remaining.map(|n| n - 1);
                }
                sink.write_u8(b'}')
            }
            Head::Tag => {
                let depth = self.config.descend(depth, off)?;
                let number = read_uint(self.data, &mut self.pos, ai, off)?;
                self.tagged(sink, number, off, depth)
            }
            Head::False => sink.write(b"false"),
            Head::True => sink.write(b"true"),
            Head::Null => sink.write(b"null"),
            Head::Float32 => {
                let bits = read_be_u32(self.data, &mut self.pos)?;
                write_f32(sink, f32::from_bits(bits))
            }
            Head::Float64 => {
                let bits = read_be_u64(self.data, &mut self.pos)?;
                write_f64(sink, f64::from_bits(bits))
            }
            Head::Bytes | Head::Undefined | Head::Simple => {
                Err(err(ErrorCode::NotJsonRepresentable, off))
            }
            Head::Float16 => Err(err(ErrorCode::Float16, off)),
            Head::Break => Err(err(ErrorCode::UnexpectedBreak, off)),
            Head::IndefiniteBytes | Head::IndefiniteText => {
                Err(err(ErrorCode::IndefiniteChunks, off))
            }
            Head::IndefiniteInvalid => Err(err(ErrorCode::IndefiniteInvalid, off)),
            Head::Reserved => Err(err(ErrorCode::ReservedAdditionalInfo, off)),
        }
    }
}

/// Transcode one CBOR data item at the start of `data` into JSON text in `out`.
///
/// Returns `(read, written)`. Tag 37 re-quotes its raw content, tag 38 writes its raw
/// number text, tag 0 renders as a string, tags 1 to 4 as numbers, and tag 55799 is
/// transparent.
///
/// # Errors
///
/// Returns `NotJsonRepresentable` for byte strings, undefined, simple values and other
/// tags; `Malformed` for ill-formed CBOR; `BufferFull` when `out` is too small.
pub fn cbor_to_json(data: &[u8], out: &mut [u8], config: &Config) -> Result<(usize, usize), Error> {
    let mut rd = CborToJson {
        data,
        pos: 0,
        config,
    };
    let mut sink = SliceSink::new(out);
    rd.item(&mut sink, 0)?;
    Ok((rd.pos, sink.position()))
}
