//! Thread-local scratch pools.
//!
//! Three pools exist: plain byte scratch used for string unescaping and digit
//! extraction, offset lists marking pointer segment boundaries, and per-`max_keys` map
//! scratch used to pre-sort collated map entries. Entries are
//! borrowed through guards that return them on drop, so every exit path (including `?`)
//! releases the entry. Entries never cross threads.

use alloc::vec::Vec;
use core::cell::RefCell;
use core::ops::{Deref, DerefMut};

use crate::error::{err, Error, ErrorCode};

const BYTES_INITIAL: usize = 256;
const OFFSETS_INITIAL: usize = 16;
const POOL_KEEP: usize = 32;
/// Distinct `max_keys` sizes kept in the map pool.
const MAP_SIZES_KEEP: usize = 8;
const KEY_BYTES_PER_ENTRY: usize = 16;

thread_local! {
    static BYTES: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
    static OFFSETS: RefCell<Vec<Vec<usize>>> = const { RefCell::new(Vec::new()) };
    static MAPS: RefCell<Vec<(usize, Vec<MapEntries>)>> = const { RefCell::new(Vec::new()) };
}

/// A pooled byte buffer, cleared on acquire.
pub struct Scratch {
    buf: Vec<u8>,
}

impl Scratch {
    /// Take a buffer from this thread's pool, allocating only when the pool is empty.
    pub fn acquire() -> Self {
        let buf = BYTES
            .try_with(|p| p.borrow_mut().pop())
            .ok()
            .flatten()
            .unwrap_or_else(|| Vec::with_capacity(BYTES_INITIAL));
        Self { buf }
    }
}

impl Deref for Scratch {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for Scratch {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let mut buf = core::mem::take(&mut self.buf);
        buf.clear();
        let _ = BYTES.try_with(|p| {
            let mut p = p.borrow_mut();
            if p.len() < POOL_KEEP {
                p.push(buf);
            }
        });
    }
}

/// A pooled list of offsets, cleared on acquire.
pub struct Offsets {
    buf: Vec<usize>,
}

impl Offsets {
    /// Take a list from this thread's pool, allocating only when the pool is empty.
    pub fn acquire() -> Self {
        let buf = OFFSETS
            .try_with(|p| p.borrow_mut().pop())
            .ok()
            .flatten()
            .unwrap_or_else(|| Vec::with_capacity(OFFSETS_INITIAL));
        Self { buf }
    }
}

impl Deref for Offsets {
    type Target = Vec<usize>;

    fn deref(&self) -> &Vec<usize> {
        &self.buf
    }
}

impl DerefMut for Offsets {
    fn deref_mut(&mut self) -> &mut Vec<usize> {
        &mut self.buf
    }
}

impl Drop for Offsets {
    fn drop(&mut self) {
        let mut buf = core::mem::take(&mut self.buf);
        buf.clear();
        let _ = OFFSETS.try_with(|p| {
            let mut p = p.borrow_mut();
            if p.len() < POOL_KEEP {
                p.push(buf);
            }
        });
    }
}

/// One collated map entry inside [`MapScratch`]: `bytes[start..key_end]` holds the
/// collated key and `bytes[key_end..end]` the collated value.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    start: usize,
    key_end: usize,
    end: usize,
}

/// Backing storage of a map scratch entry.
#[derive(Default)]
pub struct MapEntries {
    bytes: Vec<u8>,
    entries: Vec<Entry>,
}

/// Pooled scratch for collating one map level: a byte run plus entry boundaries.
pub struct MapScratch {
    max_keys: usize,
    inner: MapEntries,
}

impl MapScratch {
    /// Take a map scratch sized for `max_keys` entries.
    pub fn acquire(max_keys: usize) -> Self {
        let inner = MAPS
            .try_with(|p| {
                let mut p = p.borrow_mut();
                p.iter_mut()
                    .find(|(k, _)| *k == max_keys)
                    .and_then(|(_, entries)| entries.pop())
            })
            .ok()
            .flatten()
            .unwrap_or_else(|| MapEntries {
                bytes: Vec::with_capacity(max_keys.saturating_mul(KEY_BYTES_PER_ENTRY)),
                entries: Vec::with_capacity(max_keys),
            });
        Self { max_keys, inner }
    }

    /// The byte run that keys and values are collated into.
    pub fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.inner.bytes
    }

    /// Current end of the byte run.
    pub fn position(&self) -> usize {
        self.inner.bytes.len()
    }

    /// Record an entry whose key starts at `start`, value at `key_end`, ending at the
    /// current position.
    ///
    /// # Errors
    ///
    /// Returns `TooManyKeys` once `max_keys` entries are recorded.
    pub fn push(&mut self, start: usize, key_end: usize, offset: usize) -> Result<(), Error> {
        if self.inner.entries.len() >= self.max_keys {
            return Err(err(ErrorCode::TooManyKeys, offset));
        }
        let end = self.inner.bytes.len();
        self.inner.entries.push(Entry {
            start,
            key_end,
            end,
        });
        Ok(())
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Sort entries by collated key, then by collated value.
    pub fn sort(&mut self) {
        let bytes = &self.inner.bytes;
        self.inner.entries.sort_unstable_by(|a, b| {
            bytes[a.start..a.key_end]
                .cmp(&bytes[b.start..b.key_end])
                .then_with(|| bytes[a.key_end..a.end].cmp(&bytes[b.key_end..b.end]))
        });
    }

    /// Iterate `(key, value)` byte runs in the current entry order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        let bytes = &self.inner.bytes;
        self.inner
            .entries
            .iter()
            .map(move |e| (&bytes[e.start..e.key_end], &bytes[e.key_end..e.end]))
    }
}

impl Drop for MapScratch {
    fn drop(&mut self) {
        let mut inner = core::mem::take(&mut self.inner);
        inner.bytes.clear();
        inner.entries.clear();
        let max_keys = self.max_keys;
        let _ = MAPS.try_with(|p| {
            let mut p = p.borrow_mut();
            if let Some((_, entries)) = p.iter_mut().find(|(k, _)| *k == max_keys) {
                if entries.len() < POOL_KEEP {
                    entries.push(inner);
                }
            } else if p.len() < MAP_SIZES_KEEP {
                p.push((max_keys, alloc::vec![inner]));
            }
        });
    }
}
