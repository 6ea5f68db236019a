//! Fixed-capacity circular byte store
//!
//! Holds the bytes that span two chunk-delivery calls. The capacity must
//! cover the largest single atomic unit the codec ever parks across a
//! suspension point: one scalar field. A tag varint may arrive
//! non-canonically padded with continuation bytes out to the full 10-byte
//! varint bound (standard protobuf decoders accept this), so the bound is
//! a padded tag plus a maximum varint payload, not just a canonical
//! 5-byte tag.

use echo_wire::MAX_VARINT_BYTES;

use crate::error::StreamError;

/// Default ring capacity for the codec bridges: one padded tag varint
/// plus one maximum varint payload
pub const RING_CAPACITY: usize = 2 * MAX_VARINT_BYTES;

/// Circular byte buffer with compile-time capacity
#[derive(Debug, Clone)]
pub struct ByteRing<const N: usize> {
    buf: [u8; N],
    head: usize,
    len: usize,
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteRing<N> {
    /// Create an empty ring
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            len: 0,
        }
    }

    /// Bytes currently stored
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the ring holds no bytes
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes that can still be stored
    pub const fn free(&self) -> usize {
        N - self.len
    }

    /// Drop all stored bytes
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Append one byte
    pub fn push(&mut self, byte: u8) -> Result<(), StreamError> {
        if self.len == N {
            return Err(StreamError::RingOverflow);
        }
        self.buf[(self.head + self.len) % N] = byte;
        self.len += 1;
        Ok(())
    }

    /// Take the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        let byte = self.buf[self.head];
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Some(byte)
    }

    /// Read the byte at logical offset `i` without consuming it
    pub fn peek(&self, i: usize) -> Option<u8> {
        if i >= self.len {
            return None;
        }
        Some(self.buf[(self.head + i) % N])
    }

    /// Drop the oldest `n` bytes (saturating)
    pub fn discard(&mut self, n: usize) {
        let n = n.min(self.len);
        self.head = (self.head + n) % N;
        self.len -= n;
    }

    /// Append a run of bytes, all or nothing
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        if bytes.len() > self.free() {
            return Err(StreamError::RingOverflow);
        }
        for &byte in bytes {
            self.buf[(self.head + self.len) % N] = byte;
            self.len += 1;
        }
        Ok(())
    }

    /// Drain the oldest bytes into `out`, returning the count moved
    ///
    /// A wrapped ring needs two linear copies; both happen here so the
    /// caller sees every pending byte in one call.
    pub fn pop_slice(&mut self, out: &mut [u8]) -> usize {
        let (first, second) = self.as_slices();
        let take_first = first.len().min(out.len());
        out[..take_first].copy_from_slice(&first[..take_first]);
        let take_second = second.len().min(out.len() - take_first);
        out[take_first..take_first + take_second].copy_from_slice(&second[..take_second]);
        let moved = take_first + take_second;
        self.discard(moved);
        moved
    }

    /// The stored bytes as up to two contiguous runs, oldest first
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        let end = self.head + self.len;
        if end <= N {
            (&self.buf[self.head..end], &[])
        } else {
            (&self.buf[self.head..], &self.buf[..end - N])
        }
    }
}
