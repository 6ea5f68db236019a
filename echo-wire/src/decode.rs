//! Single-pass field decoder
//!
//! Walks a fully-buffered encoding field by field. Length-delimited
//! payloads come back as bounded [`Delimited`] views over the underlying
//! bytes; a view can be read as string/bytes, skipped, or opened as a
//! nested [`FieldDecoder`], which is how arbitrarily nested messages are
//! walked without the decoder itself recursing.
//!
//! For input that arrives in chunks, use `echo-stream` instead; this
//! decoder assumes the whole region is in hand.

use crate::error::WireError;
use crate::tag::{Tag, WireType};
use crate::varint;

/// One decoded field: number plus wire-level payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireField<'a> {
    /// Field number from the tag
    pub field_number: u32,
    /// Payload, discriminated by wire type
    pub value: WireValue<'a>,
}

/// Wire-level payload of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireValue<'a> {
    /// Wire type 0
    Varint(u64),
    /// Wire type 5, little-endian
    Fixed32(u32),
    /// Wire type 1, little-endian
    Fixed64(u64),
    /// Wire type 2: a bounded view of the declared region
    Delimited(Delimited<'a>),
}

impl WireValue<'_> {
    /// Interpret a varint payload as a zig-zag signed value
    pub fn as_signed(&self) -> Option<i64> {
        match self {
            WireValue::Varint(v) => Some(varint::zigzag_decode(*v)),
            _ => None,
        }
    }
}

/// A length-delimited region of the input
///
/// Owns no memory; it is a view bounded by the length declared on the
/// wire. Open it as a nested decoder, read it out, or drop it to skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimited<'a> {
    bytes: &'a [u8],
}

impl<'a> Delimited<'a> {
    /// Declared length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the region is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw bytes of the region
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Copy the region into `out`
    ///
    /// Fails with [`WireError::RegionOverrun`] if `out` is too small.
    pub fn read_bytes(&self, out: &mut [u8]) -> Result<usize, WireError> {
        if out.len() < self.bytes.len() {
            return Err(WireError::RegionOverrun);
        }
        out[..self.bytes.len()].copy_from_slice(self.bytes);
        Ok(self.bytes.len())
    }

    /// Interpret the region as UTF-8
    pub fn as_str(&self) -> Result<&'a str, WireError> {
        core::str::from_utf8(self.bytes).map_err(|_| WireError::InvalidUtf8)
    }

    /// Open a decoder scoped exactly to this region
    pub fn decoder(&self) -> FieldDecoder<'a> {
        FieldDecoder::new(self.bytes)
    }
}

/// Field decoder over a byte slice
#[derive(Debug)]
pub struct FieldDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FieldDecoder<'a> {
    /// Wrap an encoded region
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes consumed so far
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Whether every byte of the region has been consumed
    pub fn at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }

    /// Read a bare varint
    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let rest = &self.bytes[self.pos..];
        match varint::decode(rest) {
            Some((value, n)) => {
                self.pos += n;
                Ok(value)
            }
            // Ten available bytes that did not terminate is malformed,
            // fewer is starvation.
            None if rest.len() >= crate::tag::MAX_VARINT_BYTES => Err(WireError::VarintOverflow),
            None => Err(WireError::UnexpectedEnd),
        }
    }

    /// Read a zig-zag varint
    pub fn read_signed_varint(&mut self) -> Result<i64, WireError> {
        Ok(varint::zigzag_decode(self.read_varint()?))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.bytes.len() - self.pos < n {
            return Err(WireError::UnexpectedEnd);
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Read 4 raw little-endian bytes
    pub fn read_fixed32(&mut self) -> Result<u32, WireError> {
        let bytes = self.take(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(raw))
    }

    /// Read 8 raw little-endian bytes
    pub fn read_fixed64(&mut self) -> Result<u64, WireError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Read the next field, or `Ok(None)` at a clean end of the region
    ///
    /// A declared delimited length that exceeds the bytes left in the
    /// region is [`WireError::UnexpectedEnd`].
    pub fn next_field(&mut self) -> Result<Option<WireField<'a>>, WireError> {
        if self.at_end() {
            return Ok(None);
        }
        let tag = Tag::unpack(self.read_varint()?)?;
        let value = match tag.wire_type {
            WireType::Varint => WireValue::Varint(self.read_varint()?),
            WireType::Fixed32 => WireValue::Fixed32(self.read_fixed32()?),
            WireType::Fixed64 => WireValue::Fixed64(self.read_fixed64()?),
            WireType::Delimited => {
                let len = self.read_varint()?;
                if len > usize::MAX as u64 {
                    return Err(WireError::UnexpectedEnd);
                }
                let bytes = self.take(len as usize)?;
                WireValue::Delimited(Delimited { bytes })
            }
        };
        Ok(Some(WireField {
            field_number: tag.field_number,
            value,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::FieldEncoder;
    use crate::sink::SliceSink;

    fn decode_one(bytes: &[u8]) -> WireField<'_> {
        let mut dec = FieldDecoder::new(bytes);
        let field = dec.next_field().unwrap().unwrap();
        assert!(dec.at_end());
        field
    }

    #[test]
    fn test_varint_field() {
        let field = decode_one(&[4 << 3, 2]);
        assert_eq!(field.field_number, 4);
        assert_eq!(field.value, WireValue::Varint(2));

        let field = decode_one(&[4 << 3, 0x85, 0x03]);
        assert_eq!(field.value, WireValue::Varint(389));
    }

    #[test]
    fn test_signed_varint_field() {
        let field = decode_one(&[4 << 3, 1]);
        assert_eq!(field.value.as_signed(), Some(-1));
    }

    #[test]
    fn test_fixed_fields() {
        let field = decode_one(&[(4 << 3) | 5, 2, 0, 0, 0]);
        assert_eq!(field.value, WireValue::Fixed32(2));

        let field = decode_one(&[(4 << 3) | 1, 2, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(field.value, WireValue::Fixed64(2));
    }

    #[test]
    fn test_delimited_and_nested() {
        // field 8 = message { field 1 = varint 7, field 3 = "ok" }
        let bytes = [(8 << 3) | 2, 6, 1 << 3, 7, (3 << 3) | 2, 2, b'o', b'k'];
        let field = decode_one(&bytes);
        let WireValue::Delimited(region) = field.value else {
            panic!("expected delimited");
        };
        assert_eq!(region.len(), 6);

        let mut inner = region.decoder();
        let first = inner.next_field().unwrap().unwrap();
        assert_eq!(first.value, WireValue::Varint(7));
        let second = inner.next_field().unwrap().unwrap();
        let WireValue::Delimited(s) = second.value else {
            panic!("expected delimited");
        };
        assert_eq!(s.as_str().unwrap(), "ok");
        assert!(inner.next_field().unwrap().is_none());
    }

    #[test]
    fn test_invalid_wire_type() {
        let mut dec = FieldDecoder::new(&[(1 << 3) | 3]);
        assert_eq!(dec.next_field(), Err(WireError::InvalidWireType(3)));
    }

    #[test]
    fn test_truncated_region() {
        // declares 5 bytes, supplies 2
        let mut dec = FieldDecoder::new(&[(1 << 3) | 2, 5, 0xaa, 0xbb]);
        assert_eq!(dec.next_field(), Err(WireError::UnexpectedEnd));
    }

    #[test]
    fn test_truncated_varint() {
        let mut dec = FieldDecoder::new(&[1 << 3, 0x80]);
        assert_eq!(dec.next_field(), Err(WireError::UnexpectedEnd));
    }

    #[test]
    fn test_unknown_fields_skippable() {
        // known field 1, unknown varint field 9, unknown delimited field
        // 10, known field 2 - a decoder that only understands 1 and 2
        // still sees both.
        let mut buf = [0u8; 64];
        let mut sink = SliceSink::new(&mut buf);
        let mut enc = FieldEncoder::new(&mut sink);
        enc.write_varint_field(1, 11).unwrap();
        enc.write_varint_field(9, 999).unwrap();
        enc.write_bytes_field(10, &[1, 2, 3]).unwrap();
        enc.write_varint_field(2, 22).unwrap();
        let n = sink.written();

        let mut dec = FieldDecoder::new(&buf[..n]);
        let mut known = std::vec::Vec::new();
        while let Some(field) = dec.next_field().unwrap() {
            match (field.field_number, field.value) {
                (1 | 2, WireValue::Varint(v)) => known.push(v),
                _ => {} // dropping the view skips the payload
            }
        }
        assert_eq!(known, [11, 22]);
    }

    #[test]
    fn test_scalar_roundtrip_boundaries() {
        for value in [0, 1, 127, 128, u32::MAX as u64, u64::MAX] {
            let mut buf = [0u8; 32];
            let mut sink = SliceSink::new(&mut buf);
            FieldEncoder::new(&mut sink)
                .write_varint_field(7, value)
                .unwrap();
            let n = sink.written();
            let field = decode_one(&buf[..n]);
            assert_eq!(field.value, WireValue::Varint(value));
        }
        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            let mut buf = [0u8; 32];
            let mut sink = SliceSink::new(&mut buf);
            FieldEncoder::new(&mut sink)
                .write_signed_varint_field(7, value)
                .unwrap();
            let n = sink.written();
            let field = decode_one(&buf[..n]);
            assert_eq!(field.value.as_signed(), Some(value));
        }
    }
}
