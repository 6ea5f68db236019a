//! Abstract byte sinks
//!
//! The encoder pushes bytes through [`ByteSink`]: a slice cursor for
//! in-memory encodes, a counting sink for size measurement, and the
//! ring/chunk bridge in `echo-stream` for resumable output.

use crate::error::WireError;

/// Something bytes can be pushed into
///
/// Writes are all-or-nothing at this level; a sink that cannot take the
/// whole write reports [`WireError::SinkFull`] without consuming any of it.
pub trait ByteSink {
    /// Append one byte
    fn push(&mut self, byte: u8) -> Result<(), WireError>;

    /// Append a run of bytes
    fn extend(&mut self, bytes: &[u8]) -> Result<(), WireError>;

    /// Bytes the sink can still accept
    fn capacity_left(&self) -> usize;
}

/// Cursor over a borrowed mutable slice
#[derive(Debug)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceSink<'a> {
    /// Wrap a buffer
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far
    pub fn written(&self) -> usize {
        self.pos
    }

    /// The filled prefix
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

impl ByteSink for SliceSink<'_> {
    fn push(&mut self, byte: u8) -> Result<(), WireError> {
        if self.pos >= self.buf.len() {
            return Err(WireError::SinkFull);
        }
        self.buf[self.pos] = byte;
        self.pos += 1;
        Ok(())
    }

    fn extend(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        if bytes.len() > self.buf.len() - self.pos {
            return Err(WireError::SinkFull);
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    fn capacity_left(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Sink that discards bytes and counts them
///
/// Used to measure an encoded size before committing it to a real sink,
/// e.g. for the length prefix of a nested message.
#[derive(Debug, Default)]
pub struct CountingSink {
    count: usize,
}

impl CountingSink {
    /// Create a fresh counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes that would have been written
    pub fn count(&self) -> usize {
        self.count
    }
}

impl ByteSink for CountingSink {
    fn push(&mut self, _byte: u8) -> Result<(), WireError> {
        self.count += 1;
        Ok(())
    }

    fn extend(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        self.count += bytes.len();
        Ok(())
    }

    fn capacity_left(&self) -> usize {
        usize::MAX
    }
}
