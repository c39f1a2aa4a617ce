//! Output sinks shared by every encoder.
//!
//! Transcoders are generic over [`Sink`] so the same routine can write either into the
//! caller's fixed output tail ([`SliceSink`]) or into pooled scratch ([`VecSink`]) while
//! staying statically dispatched.

use alloc::vec::Vec;

use crate::error::{err, Error, ErrorCode};

/// A byte sink with a write cursor.
pub trait Sink {
    /// Append `bytes`.
    ///
    /// # Errors
    ///
    /// Returns `BufferFull` when the sink cannot hold the bytes.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error>;

    /// Append one byte.
    ///
    /// # Errors
    ///
    /// Returns `BufferFull` when the sink cannot hold the byte.
    fn write_u8(&mut self, byte: u8) -> Result<(), Error> {
        self.write(&[byte])
    }

    /// Number of bytes written so far.
    fn position(&self) -> usize;

    /// Insert `bytes` at `at`, shifting everything written after `at`.
    ///
    /// # Errors
    ///
    /// Returns `BufferFull` when the shifted tail no longer fits.
    fn insert(&mut self, at: usize, bytes: &[u8]) -> Result<(), Error>;
}

/// Sink over a fixed, caller-owned slice.
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceSink<'a> {
    /// Wrap `buf`; writing starts at offset 0.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    fn end_for(&self, n: usize) -> Result<usize, Error> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or_else(|| err(ErrorCode::LengthOverflow, self.pos))?;
        if end > self.buf.len() {
            return Err(err(ErrorCode::BufferFull, self.pos));
        }
        Ok(end)
    }
}

impl Sink for SliceSink<'_> {
    #[inline]
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let end = self.end_for(bytes.len())?;
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    #[inline]
    fn write_u8(&mut self, byte: u8) -> Result<(), Error> {
        let slot = self
            .buf
            .get_mut(self.pos)
            .ok_or_else(|| err(ErrorCode::BufferFull, self.pos))?;
        *slot = byte;
        self.pos += 1;
        Ok(())
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    fn insert(&mut self, at: usize, bytes: &[u8]) -> Result<(), Error> {
        debug_assert!(at <= self.pos);
        let end = self.end_for(bytes.len())?;
        self.buf.copy_within(at..self.pos, at + bytes.len());
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

/// Sink appending to a growable vector, used for pooled scratch.
pub struct VecSink<'a> {
    buf: &'a mut Vec<u8>,
}

impl<'a> VecSink<'a> {
    /// Wrap `buf`; positions are absolute offsets into `buf`.
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        Self { buf }
    }
}

impl Sink for VecSink<'_> {
    #[inline]
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    #[inline]
    fn write_u8(&mut self, byte: u8) -> Result<(), Error> {
        self.buf.push(byte);
        Ok(())
    }

    #[inline]
    fn position(&self) -> usize {
        self.buf.len()
    }

    fn insert(&mut self, at: usize, bytes: &[u8]) -> Result<(), Error> {
        debug_assert!(at <= self.buf.len());
        self.buf.splice(at..at, bytes.iter().copied());
        Ok(())
    }
}
