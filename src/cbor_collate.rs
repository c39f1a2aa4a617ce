//! Direct `CBOR <-> collation` transcoding.
//!
//! Tag 37 and tag 38 carriers are unwrapped: their JSON string content is unescaped and
//! their number text is normalized under the configured number kind, so a document
//! collates identically whether it came from JSON or from native CBOR.

use crate::collate::{Collator, Datum, Reader, TERMINATOR, TYPE_ARRAY};
use crate::config::{Config, MISSING_LITERAL};
use crate::decode::{cbor_to_value, head, Head};
use crate::encode::{encode_bytes, encode_text, Pending, FALSE, NULL, TRUE};
use crate::error::{err, Error, ErrorCode};
use crate::json::unescape;
use crate::number::Num;
use crate::pool::{MapScratch, Scratch};
use crate::sink::{Sink, SliceSink, VecSink};
use crate::utf8;
use crate::value::tag;
use crate::wire::{
    read_be_u32, read_be_u64, read_len, read_string, read_u8, read_uint, split, BREAK,
    MAJOR_ARRAY, MAJOR_MAP,
};

struct CborToCollate<'a, 'c> {
    data: &'a [u8],
    pos: usize,
    col: Collator<'c>,
    unescaped: Scratch,
}

impl CborToCollate<'_, '_> {
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

    /// Collate the tag-37 payload at the cursor as a string.
    fn json_string<S: Sink>(&mut self, sink: &mut S) -> Result<(), Error> {
        let off = self.pos;
        let raw = read_string(self.data, &mut self.pos)?;
        self.unescaped.clear();
        unescape(&mut VecSink::new(&mut self.unescaped), raw, off)?;
        self.col.string(sink, &self.unescaped)
    }

    fn key<S: Sink>(&mut self, sink: &mut S) -> Result<(), Error> {
        let off = self.pos;
        let ib = *self
            .data
            .get(off)
            .ok_or_else(|| err(ErrorCode::UnexpectedEof, off))?;
        match head(ib) {
            Head::Text => {
                let body = read_string(self.data, &mut self.pos)?;
                self.col.string(sink, utf8::validate(body, off)?.as_bytes())
            }
            Head::Tag => {
                self.pos += 1;
                let number = read_uint(self.data, &mut self.pos, split(ib).1, off)?;
                if number != tag::JSON_STRING {
                    return Err(err(ErrorCode::MapKeyMustBeText, off));
                }
                self.json_string(sink)
            }
            _ => Err(err(ErrorCode::MapKeyMustBeText, off)),
        }
    }

    fn item<S: Sink>(&mut self, sink: &mut S, depth: usize) -> Result<(), Error> {
        let off = self.pos;
        let ib = read_u8(self.data, &mut self.pos)?;
        let (_, ai) = split(ib);
        match head(ib) {
            Head::Uint => {
                let v = read_uint(self.data, &mut self.pos, ai, off)?;
                let num = i64::try_from(v).map_or(Num::Uint(v), Num::Int);
                self.col.num(sink, num, off)
            }
            Head::Nint => {
                let n = read_uint(self.data, &mut self.pos, ai, off)?;
                let n = i64::try_from(n).map_err(|_| err(ErrorCode::IntegerOverflow, off))?;
                self.col.num(sink, Num::Int(-1 - n), off)
            }
            Head::Bytes => {
                self.pos = off;
                let body = read_string(self.data, &mut self.pos)?;
                Collator::binary(sink, body)
            }
            Head::Text => {
                self.pos = off;
                let body = read_string(self.data, &mut self.pos)?;
                self.col.string(sink, utf8::validate(body, off)?.as_bytes())
            }
            Head::Array | Head::IndefiniteArray => {
                let depth = self.col.config.descend(depth, off)?;
                let mut remaining = read_len(self.data, &mut self.pos, ai, off)?;
                sink.write_u8(TYPE_ARRAY)?;
                let at = sink.position();
                let mut count = 0;
                while !self.at_break(remaining)? {
                    self.item(sink, depth)?;
                    count += 1;
                    remaining = remaining.map(|n| n - 1);
                }
                if self.col.config.array_len_prefix {
                    let mut buf = [0u8; 48];
                    let n = Collator::length_bytes(count, &mut buf)?;
                    sink.insert(at, &buf[..n])?;
                }
                sink.write_u8(TERMINATOR)
            }
            Head::Map | Head::IndefiniteMap => {
                let depth = self.col.config.descend(depth, off)?;
                let mut remaining = read_len(self.data, &mut self.pos, ai, off)?;
                let mut scratch = MapScratch::acquire(self.col.config.max_keys);
                while !self.at_break(remaining)? {
                    let key_off = self.pos;
                    let begin = scratch.position();
                    self.key(&mut VecSink::new(scratch.bytes_mut()))?;
                    let key_end = scratch.position();
                    self.item(&mut VecSink::new(scratch.bytes_mut()), depth)?;
                    scratch.push(begin, key_end, key_off)?;
                    remaining = remaining.map(|n| n - 1);
                }
                self.col.write_map(sink, &mut scratch)
            }
            Head::Tag => {
                let depth = self.col.config.descend(depth, off)?;
                let number = read_uint(self.data, &mut self.pos, ai, off)?;
                match number {
                    tag::JSON_STRING => self.json_string(sink),
                    tag::JSON_NUMBER => {
                        let text_off = self.pos;
                        let text = read_string(self.data, &mut self.pos)?;
                        self.col.number_text(sink, text, text_off)
                    }
                    tag::SELF_DESCRIBE => self.item(sink, depth),
                    _ => {
                        let (value, used) = cbor_to_value(&self.data[off..], self.col.config)
                            .map_err(|e| err(e.code, off + e.offset))?;
                        self.pos = off + used;
                        self.col.value(sink, &value, depth)
                    }
                }
            }
            Head::False => Collator::boolean(sink, false),
            Head::True => Collator::boolean(sink, true),
            Head::Null => Collator::null(sink),
            Head::Float32 => {
                let bits = read_be_u32(self.data, &mut self.pos)?;
                self.col.num(sink, Num::Float32(f32::from_bits(bits)), off)
            }
            Head::Float64 => {
                let bits = read_be_u64(self.data, &mut self.pos)?;
                self.col.num(sink, Num::Float(f64::from_bits(bits)), off)
            }
            Head::Undefined | Head::Simple => Err(err(ErrorCode::NotCollatable, off)),
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

/// Collate one CBOR data item at the start of `data` into `out`.
///
/// Returns `(read, written)`. Map pairs are sorted by collated key, then value.
///
/// # Errors
///
/// Returns `NotCollatable` for undefined, simple values and tags without a collation
/// form; `Malformed` for ill-formed CBOR; `TooManyKeys` past [`Config::max_keys`];
/// `BufferFull` when `out` is too small.
pub fn cbor_to_collate(
    data: &[u8],
    out: &mut [u8],
    config: &Config,
) -> Result<(usize, usize), Error> {
    let mut tr = CborToCollate {
        data,
        pos: 0,
        col: Collator::new(config),
        unescaped: Scratch::acquire(),
    };
    let mut sink = SliceSink::new(out);
    tr.item(&mut sink, 0)?;
    Ok((tr.pos, sink.position()))
}

fn collate_item<S: Sink>(
    col: &mut Collator<'_>,
    rd: &mut Reader<'_>,
    sink: &mut S,
    depth: usize,
) -> Result<(), Error> {
    let off = rd.position();
    match rd.next()? {
        Datum::Missing => encode_text(sink, MISSING_LITERAL.as_bytes()),
        Datum::Null => sink.write_u8(NULL),
        Datum::False => sink.write_u8(FALSE),
        Datum::True => sink.write_u8(TRUE),
        Datum::Number(body) => col.number_to_cbor(sink, body, off + 1),
        Datum::String(body) => {
            let text = col.unsuffix(body, off + 1)?;
            encode_text(sink, utf8::validate(text, off + 1)?.as_bytes())
        }
        Datum::Binary(body) => {
            let bytes = col.unsuffix(body, off + 1)?;
            encode_bytes(sink, bytes)
        }
        Datum::Array(prefix) => {
            let depth = col.config.descend(depth, off)?;
            let pending = Pending::open(sink, MAJOR_ARRAY, col.config.container_encoding)?;
            let mut count = 0;
            while !rd.at_end()? {
                collate_item(col, rd, sink, depth)?;
                count += 1;
            }
            col.check_len(prefix, count, off)?;
            pending.close(sink, count)
        }
        Datum::Map(prefix) => {
            let depth = col.config.descend(depth, off)?;
            let pending = Pending::open(sink, MAJOR_MAP, col.config.container_encoding)?;
            let mut count = 0;
            while !rd.at_end()? {
                let key_off = rd.position();
                match rd.next()? {
                    Datum::String(body) => {
                        let text = col.unsuffix(body, key_off + 1)?;
                        encode_text(sink, utf8::validate(text, key_off + 1)?.as_bytes())?;
                    }
                    Datum::Missing => encode_text(sink, MISSING_LITERAL.as_bytes())?,
                    _ => return Err(err(ErrorCode::MapKeyMustBeText, key_off)),
                }
                collate_item(col, rd, sink, depth)?;
                count += 1;
            }
            col.check_len(prefix, count, off)?;
            pending.close(sink, count)
        }
        Datum::End => Err(err(ErrorCode::UnexpectedTerminator, off)),
    }
}

/// Decode one collated value at the start of `code` into CBOR in `out`.
///
/// Returns `(read, written)`. Containers are framed per [`Config::container_encoding`];
/// under `JsonNumber` numbers come back as tag-38 text carrying their exact digits.
///
/// # Errors
///
/// Returns `Malformed` for ill-formed collation bytes and `BufferFull` when `out` is too
/// small.
pub fn collate_to_cbor(
    code: &[u8],
    out: &mut [u8],
    config: &Config,
) -> Result<(usize, usize), Error> {
    let mut col = Collator::new(config);
    let mut rd = Reader::new(code);
    let mut sink = SliceSink::new(out);
    collate_item(&mut col, &mut rd, &mut sink, 0)?;
    Ok((rd.position(), sink.position()))
}
