//! Direct `JSON <-> collation` transcoding.

use crate::collate::{Collator, Datum, Reader, TERMINATOR, TYPE_ARRAY};
use crate::config::{Config, MISSING_LITERAL};
use crate::error::{err, Error, ErrorCode};
use crate::json::{unescape, write_string, Lexer, StrSpan, Token};
use crate::pool::{MapScratch, Scratch};
use crate::sink::{Sink, SliceSink, VecSink};
use crate::utf8;

struct JsonToCollate<'a, 'c> {
    lx: Lexer<'a>,
    col: Collator<'c>,
    unescaped: Scratch,
}

impl JsonToCollate<'_, '_> {
    fn string<S: Sink>(&mut self, sink: &mut S, span: StrSpan) -> Result<(), Error> {
        let raw = self.lx.slice(span.start, span.end);
        if !span.escaped {
            return self.col.string(sink, raw);
        }
        self.unescaped.clear();
        unescape(&mut VecSink::new(&mut self.unescaped), raw, span.start)?;
        self.col.string(sink, &self.unescaped)
    }

    fn value<S: Sink>(&mut self, sink: &mut S, depth: usize) -> Result<(), Error> {
        let start = self.lx.position();
        match self.lx.value()? {
            Token::Null => Collator::null(sink),
            Token::True => Collator::boolean(sink, true),
            Token::False => Collator::boolean(sink, false),
            Token::Number { start, end } => {
                let text = self.lx.slice(start, end);
                self.col.number_text(sink, text, start)
            }
            Token::String(span) => self.string(sink, span),
            Token::ArrayStart => {
                let depth = self.col.config.descend(depth, start)?;
                sink.write_u8(TYPE_ARRAY)?;
                let at = sink.position();
                let mut count = 0;
                while self.lx.next_element(count == 0)? {
                    self.value(sink, depth)?;
                    count += 1;
                }
                if self.col.config.array_len_prefix {
                    let mut buf = [0u8; 48];
                    let n = Collator::length_bytes(count, &mut buf)?;
                    sink.insert(at, &buf[..n])?;
                }
                sink.write_u8(TERMINATOR)
            }
            Token::ObjectStart => {
                let depth = self.col.config.descend(depth, start)?;
                let mut scratch = MapScratch::acquire(self.col.config.max_keys);
                let mut first = true;
                while let Some(key) = self.lx.next_key(first)? {
                    first = false;
                    let begin = scratch.position();
                    self.string(&mut VecSink::new(scratch.bytes_mut()), key)?;
                    let key_end = scratch.position();
                    self.value(&mut VecSink::new(scratch.bytes_mut()), depth)?;
                    scratch.push(begin, key_end, key.start)?;
                }
                self.col.write_map(sink, &mut scratch)
            }
        }
    }
}

/// Collate one JSON value at the start of `text` into `out`.
///
/// Returns `(read, written)`. Object members are sorted by collated key, so objects
/// that differ only in member order collate identically.
///
/// # Errors
///
/// Returns `Malformed` at the first grammar violation, `NumberOutOfRange` for numbers
/// the configured kind cannot hold, `TooManyKeys` past [`Config::max_keys`] and
/// `BufferFull` when `out` is too small.
pub fn json_to_collate(
    text: &[u8],
    out: &mut [u8],
    config: &Config,
) -> Result<(usize, usize), Error> {
    let mut tr = JsonToCollate {
        lx: Lexer::new(text, config.space_kind),
        col: Collator::new(config),
        unescaped: Scratch::acquire(),
    };
    let mut sink = SliceSink::new(out);
    tr.value(&mut sink, 0)?;
    Ok((tr.lx.finish(), sink.position()))
}

fn collate_value<S: Sink>(
    col: &mut Collator<'_>,
    rd: &mut Reader<'_>,
    sink: &mut S,
    depth: usize,
) -> Result<(), Error> {
    let off = rd.position();
    match rd.next()? {
        Datum::Missing => write_string(sink, MISSING_LITERAL.as_bytes()),
        Datum::Null => sink.write(b"null"),
        Datum::False => sink.write(b"false"),
        Datum::True => sink.write(b"true"),
        Datum::Number(body) => col.number_to_json(sink, body, off + 1),
        Datum::String(body) => {
            let text = col.unsuffix(body, off + 1)?;
            write_string(sink, utf8::validate(text, off + 1)?.as_bytes())
        }
        Datum::Binary(_) => Err(err(ErrorCode::NotJsonRepresentable, off)),
        Datum::Array(prefix) => {
            let depth = col.config.descend(depth, off)?;
            sink.write_u8(b'[')?;
            let mut count = 0;
            while !rd.at_end()? {
                if count > 0 {
                    sink.write_u8(b',')?;
                }
                collate_value(col, rd, sink, depth)?;
                count += 1;
            }
            col.check_len(prefix, count, off)?;
            sink.write_u8(b']')
        }
        Datum::Map(prefix) => {
            let depth = col.config.descend(depth, off)?;
            sink.write_u8(b'{')?;
            let mut count = 0;
            while !rd.at_end()? {
                if count > 0 {
                    sink.write_u8(b',')?;
                }
                collate_key(col, rd, sink)?;
                sink.write_u8(b':')?;
                collate_value(col, rd, sink, depth)?;
                count += 1;
            }
            col.check_len(prefix, count, off)?;
            sink.write_u8(b'}')
        }
        Datum::End => Err(err(ErrorCode::UnexpectedTerminator, off)),
    }
}

fn collate_key<S: Sink>(
    col: &mut Collator<'_>,
    rd: &mut Reader<'_>,
    sink: &mut S,
) -> Result<(), Error> {
    let off = rd.position();
    match rd.next()? {
        Datum::String(body) => {
            let text = col.unsuffix(body, off + 1)?;
            write_string(sink, utf8::validate(text, off + 1)?.as_bytes())
        }
        Datum::Missing => write_string(sink, MISSING_LITERAL.as_bytes()),
        _ => Err(err(ErrorCode::MapKeyMustBeText, off)),
    }
}

/// Render one collated value at the start of `code` as JSON text in `out`.
///
/// Returns `(read, written)`. `Missing` renders as the missing literal string; numbers
/// render per [`Config::number_kind`], exactly under `JsonNumber`.
///
/// # Errors
///
/// Returns `Malformed` for ill-formed collation bytes, `NotJsonRepresentable` for
/// binary datums and `BufferFull` when `out` is too small.
pub fn collate_to_json(
    code: &[u8],
    out: &mut [u8],
    config: &Config,
) -> Result<(usize, usize), Error> {
    let mut col = Collator::new(config);
    let mut rd = Reader::new(code);
    let mut sink = SliceSink::new(out);
    collate_value(&mut col, &mut rd, &mut sink, 0)?;
    Ok((rd.position(), sink.position()))
}
