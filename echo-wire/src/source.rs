//! Abstract byte sources
//!
//! The decoder pulls bytes through [`ByteSource`] so the same primitives
//! work over a plain slice here and over the ring/chunk bridge in
//! `echo-stream`. Short reads are legal; running dry is not an error at
//! this level.

/// Something bytes can be pulled from, possibly fewer than asked for
pub trait ByteSource {
    /// Take the next byte, or `None` when the source is dry
    fn pop(&mut self) -> Option<u8>;

    /// Fill as much of `out` as possible, returning the bytes copied
    fn pull(&mut self, out: &mut [u8]) -> usize {
        let mut n = 0;
        while n < out.len() {
            match self.pop() {
                Some(byte) => {
                    out[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    /// Bytes known to still be available
    fn remaining_hint(&self) -> usize;
}

/// Cursor over a borrowed byte slice
#[derive(Debug)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Wrap a slice
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes consumed so far
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// The unread remainder
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

impl ByteSource for SliceSource<'_> {
    fn pop(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn pull(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.bytes.len() - self.pos);
        out[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
        self.pos += n;
        n
    }

    fn remaining_hint(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_source_pop_and_pull() {
        let mut src = SliceSource::new(&[1, 2, 3, 4]);
        assert_eq!(src.pop(), Some(1));

        let mut buf = [0u8; 8];
        assert_eq!(src.pull(&mut buf), 3);
        assert_eq!(&buf[..3], &[2, 3, 4]);
        assert_eq!(src.pop(), None);
        assert_eq!(src.remaining_hint(), 0);
        assert_eq!(src.consumed(), 4);
    }
}
