//! Terminator-safe string encoding for collated keys.
//!
//! `0x00` becomes `01 01` and `0x01` becomes `01 02`; every other byte is copied. The
//! encoded run therefore never contains `0x00`, and the datum terminator that follows
//! it sorts below any continuation, so shorter strings sort before their extensions.

use alloc::vec::Vec;

use crate::error::{err, Error, ErrorCode};
use crate::sink::Sink;

const ESCAPE: u8 = 0x01;
const TERMINATOR: u8 = 0x00;

/// Write `bytes` in suffix encoding.
pub(crate) fn encode<S: Sink>(sink: &mut S, bytes: &[u8]) -> Result<(), Error> {
    let mut run = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b > ESCAPE {
            continue;
        }
        sink.write(&bytes[run..i])?;
        sink.write(&[ESCAPE, b + 1])?;
        run = i + 1;
    }
    sink.write(&bytes[run..])
}

/// Decode a suffix-encoded body (terminator already stripped), appending to `out`.
///
/// # Errors
///
/// Returns `InvalidEscape` for an escape byte followed by anything other than `01` or
/// `02`.
pub(crate) fn decode(body: &[u8], out: &mut Vec<u8>, offset: usize) -> Result<(), Error> {
    let mut i = 0;
    let mut run = 0;
    while i < body.len() {
        if body[i] != ESCAPE {
            i += 1;
            continue;
        }
        out.extend_from_slice(&body[run..i]);
        match body.get(i + 1) {
            Some(&e @ (0x01 | 0x02)) => out.push(e - 1),
            _ => return Err(err(ErrorCode::InvalidEscape, offset + i)),
        }
        i += 2;
        run = i;
    }
    out.extend_from_slice(&body[run..]);
    Ok(())
}

/// Length of the datum body at the start of `code`, excluding its terminator.
///
/// # Errors
///
/// Returns `Unterminated` when no terminator follows.
pub(crate) fn body_len(code: &[u8], offset: usize) -> Result<usize, Error> {
    code.iter()
        .position(|&b| b == TERMINATOR)
        .ok_or_else(|| err(ErrorCode::Unterminated, offset + code.len()))
}
