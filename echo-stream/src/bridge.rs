//! Ring/chunk bridge
//!
//! Adapts "persistent ring + transient chunk" into one logical byte
//! stream so the layers above never see chunk boundaries. Reader mode
//! replays ring bytes in front of the chunk; writer mode flushes ring
//! bytes into the chunk first and spills overflow back into the ring.
//!
//! Both bridges need an explicit `finish` at the end of the call: that is
//! the teardown that parks unconsumed/unflushed bytes in the ring so the
//! next call continues where this one stopped.

use echo_wire::{ByteSink, ByteSource, WireError};

use crate::error::StreamError;
use crate::ring::ByteRing;

/// Saved read position for transactional decodes
///
/// Markers are only valid for the reader they came from, within one call.
#[derive(Debug, Clone, Copy)]
pub struct Marker(usize);

/// Reader over a ring followed by one transient input chunk
#[derive(Debug)]
pub struct ChunkReader<'a, const N: usize> {
    ring: &'a mut ByteRing<N>,
    chunk: &'a [u8],
    /// Ring length at construction; the reader never grows the ring
    ring_len: usize,
    /// Cursor into the logical stream `[ring bytes][chunk bytes]`
    pos: usize,
}

impl<'a, const N: usize> ChunkReader<'a, N> {
    /// Bridge `ring` and `chunk` for one call
    pub fn new(ring: &'a mut ByteRing<N>, chunk: &'a [u8]) -> Self {
        let ring_len = ring.len();
        Self {
            ring,
            chunk,
            ring_len,
            pos: 0,
        }
    }

    /// Save the current position
    pub fn mark(&self) -> Marker {
        Marker(self.pos)
    }

    /// Rewind to a saved position
    ///
    /// Bytes between the marker and the current position count as
    /// unconsumed again and survive into the next call.
    pub fn rewind(&mut self, marker: Marker) {
        debug_assert!(marker.0 <= self.pos);
        self.pos = marker.0;
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.ring_len + self.chunk.len() - self.pos
    }

    /// Park every unconsumed byte in the ring, in order
    ///
    /// Fails with [`StreamError::RingOverflow`] if more than a ring's
    /// worth is left, which a well-formed decode loop never does: it only
    /// stops short when starved inside a single atomic unit.
    pub fn finish(self) -> Result<(), StreamError> {
        if self.pos >= self.ring_len {
            let rest = &self.chunk[self.pos - self.ring_len..];
            self.ring.clear();
            self.ring.extend_from_slice(rest)
        } else {
            self.ring.discard(self.pos);
            self.ring.extend_from_slice(self.chunk)
        }
    }
}

impl<const N: usize> ByteSource for ChunkReader<'_, N> {
    fn pop(&mut self) -> Option<u8> {
        let byte = if self.pos < self.ring_len {
            self.ring.peek(self.pos)?
        } else {
            *self.chunk.get(self.pos - self.ring_len)?
        };
        self.pos += 1;
        Some(byte)
    }

    fn remaining_hint(&self) -> usize {
        self.remaining()
    }
}

/// Writer over a ring followed by one transient output chunk
///
/// Construction drains pending ring bytes into the front of the chunk;
/// new bytes then fill the chunk and spill into the ring once it is full.
#[derive(Debug)]
pub struct ChunkWriter<'a, const N: usize> {
    ring: &'a mut ByteRing<N>,
    chunk: &'a mut [u8],
    pos: usize,
}

impl<'a, const N: usize> ChunkWriter<'a, N> {
    /// Bridge `ring` and `chunk` for one call
    pub fn new(ring: &'a mut ByteRing<N>, chunk: &'a mut [u8]) -> Self {
        let pos = ring.pop_slice(chunk);
        Self { ring, chunk, pos }
    }

    /// Chunk bytes still writable before output starts spilling
    pub fn chunk_space(&self) -> usize {
        self.chunk.len() - self.pos
    }

    /// Hand the caller the writable chunk tail directly
    ///
    /// `fill` returns how many bytes it wrote; used for bulk content that
    /// must never spill into the ring.
    pub fn with_chunk_tail(&mut self, fill: impl FnOnce(&mut [u8]) -> usize) -> usize {
        let tail = &mut self.chunk[self.pos..];
        let n = fill(tail).min(tail.len());
        self.pos += n;
        n
    }

    /// Bytes placed in the chunk this call
    ///
    /// Spilled bytes stay in the ring; the next call's construction
    /// flushes them first.
    pub fn finish(self) -> usize {
        self.pos
    }
}

impl<const N: usize> ByteSink for ChunkWriter<'_, N> {
    fn push(&mut self, byte: u8) -> Result<(), WireError> {
        if self.pos < self.chunk.len() {
            self.chunk[self.pos] = byte;
            self.pos += 1;
            Ok(())
        } else {
            self.ring.push(byte).map_err(|_| WireError::SinkFull)
        }
    }

    fn extend(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        let direct = bytes.len().min(self.chunk_space());
        // Overflow must fit the ring before any of it lands
        if bytes.len() - direct > self.ring.free() {
            return Err(WireError::SinkFull);
        }
        self.chunk[self.pos..self.pos + direct].copy_from_slice(&bytes[..direct]);
        self.pos += direct;
        self.ring
            .extend_from_slice(&bytes[direct..])
            .map_err(|_| WireError::SinkFull)
    }

    fn capacity_left(&self) -> usize {
        self.chunk_space() + self.ring.free()
    }
}
