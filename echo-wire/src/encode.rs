//! Single-pass field encoder
//!
//! Writes protobuf-compatible fields to any [`ByteSink`]. Nested messages
//! use a scratch-buffer strategy: the sub-message is serialized into a
//! caller-provided scratch slice first, then emitted as
//! `tag + varint(len) + bytes` in one pass. No sink ever needs to support
//! in-place rewrites of an earlier length prefix.

use crate::error::WireError;
use crate::sink::{ByteSink, SliceSink};
use crate::tag::{Tag, WireType, MAX_VARINT_BYTES};
use crate::varint;

/// Field encoder over an abstract sink
#[derive(Debug)]
pub struct FieldEncoder<'a, S: ByteSink> {
    sink: &'a mut S,
}

impl<'a, S: ByteSink> FieldEncoder<'a, S> {
    /// Wrap a sink
    pub fn new(sink: &'a mut S) -> Self {
        Self { sink }
    }

    /// Emit a bare varint
    pub fn write_varint(&mut self, value: u64) -> Result<(), WireError> {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let n = varint::encode(value, &mut buf);
        self.sink.extend(&buf[..n])
    }

    /// Emit a zig-zag varint
    pub fn write_signed_varint(&mut self, value: i64) -> Result<(), WireError> {
        self.write_varint(varint::zigzag_encode(value))
    }

    /// Emit 4 raw little-endian bytes
    pub fn write_fixed32(&mut self, value: u32) -> Result<(), WireError> {
        self.sink.extend(&value.to_le_bytes())
    }

    /// Emit 8 raw little-endian bytes
    pub fn write_fixed64(&mut self, value: u64) -> Result<(), WireError> {
        self.sink.extend(&value.to_le_bytes())
    }

    /// Emit a varint length followed by the raw bytes
    pub fn write_length_prefixed(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        self.write_varint(bytes.len() as u64)?;
        self.sink.extend(bytes)
    }

    fn write_tag(&mut self, field_number: u32, wire_type: WireType) -> Result<(), WireError> {
        self.write_varint(Tag::new(field_number, wire_type).pack())
    }

    /// Emit a complete varint field
    pub fn write_varint_field(&mut self, field_number: u32, value: u64) -> Result<(), WireError> {
        self.write_tag(field_number, WireType::Varint)?;
        self.write_varint(value)
    }

    /// Emit a complete zig-zag varint field
    pub fn write_signed_varint_field(
        &mut self,
        field_number: u32,
        value: i64,
    ) -> Result<(), WireError> {
        self.write_varint_field(field_number, varint::zigzag_encode(value))
    }

    /// Emit a bool as a varint field
    pub fn write_bool_field(&mut self, field_number: u32, value: bool) -> Result<(), WireError> {
        self.write_varint_field(field_number, u64::from(value))
    }

    /// Emit a complete fixed32 field
    pub fn write_fixed32_field(&mut self, field_number: u32, value: u32) -> Result<(), WireError> {
        self.write_tag(field_number, WireType::Fixed32)?;
        self.write_fixed32(value)
    }

    /// Emit a complete fixed64 field
    pub fn write_fixed64_field(&mut self, field_number: u32, value: u64) -> Result<(), WireError> {
        self.write_tag(field_number, WireType::Fixed64)?;
        self.write_fixed64(value)
    }

    /// Emit a complete string field
    pub fn write_string_field(&mut self, field_number: u32, value: &str) -> Result<(), WireError> {
        self.write_bytes_field(field_number, value.as_bytes())
    }

    /// Emit a complete bytes field
    pub fn write_bytes_field(&mut self, field_number: u32, bytes: &[u8]) -> Result<(), WireError> {
        self.write_tag(field_number, WireType::Delimited)?;
        self.write_length_prefixed(bytes)
    }

    /// Emit a nested message field
    ///
    /// `build` serializes the sub-message into `scratch`; the finished
    /// bytes are then framed as a delimited field. A sub-message larger
    /// than `scratch` fails with [`WireError::ScratchTooSmall`] before
    /// anything reaches the sink.
    pub fn write_message_field(
        &mut self,
        field_number: u32,
        scratch: &mut [u8],
        build: impl FnOnce(&mut FieldEncoder<'_, SliceSink<'_>>) -> Result<(), WireError>,
    ) -> Result<(), WireError> {
        let mut inner_sink = SliceSink::new(scratch);
        let mut inner = FieldEncoder::new(&mut inner_sink);
        build(&mut inner).map_err(|err| match err {
            WireError::SinkFull => WireError::ScratchTooSmall,
            other => other,
        })?;
        let len = inner_sink.written();
        self.write_bytes_field(field_number, &scratch[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_with(f: impl FnOnce(&mut FieldEncoder<'_, SliceSink<'_>>)) -> std::vec::Vec<u8> {
        let mut buf = [0u8; 128];
        let mut sink = SliceSink::new(&mut buf);
        let mut enc = FieldEncoder::new(&mut sink);
        f(&mut enc);
        let n = sink.written();
        buf[..n].to_vec()
    }

    #[test]
    fn test_varint_field_small() {
        let bytes = encode_with(|e| e.write_varint_field(4, 2).unwrap());
        assert_eq!(bytes, [4 << 3, 2]);
    }

    #[test]
    fn test_varint_field_multibyte() {
        let bytes = encode_with(|e| e.write_varint_field(4, 389).unwrap());
        assert_eq!(bytes, [4 << 3, 0x85, 0x03]);
    }

    #[test]
    fn test_minus_one_as_unsigned_varint() {
        let bytes = encode_with(|e| e.write_varint_field(4, -1i64 as u64).unwrap());
        let mut expected = std::vec![4 << 3];
        expected.extend_from_slice(&[0xff; 9]);
        expected.push(0x01);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_minus_one_as_signed_varint() {
        let bytes = encode_with(|e| e.write_signed_varint_field(4, -1).unwrap());
        assert_eq!(bytes, [4 << 3, 1]);
    }

    #[test]
    fn test_fixed_fields() {
        let bytes = encode_with(|e| e.write_fixed32_field(4, 2).unwrap());
        assert_eq!(bytes, [(4 << 3) | 5, 2, 0, 0, 0]);

        let bytes = encode_with(|e| e.write_fixed64_field(4, 2).unwrap());
        assert_eq!(bytes, [(4 << 3) | 1, 2, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_string_field() {
        let bytes = encode_with(|e| e.write_string_field(5, "hi").unwrap());
        assert_eq!(bytes, [(5 << 3) | 2, 2, b'h', b'i']);
    }

    #[test]
    fn test_message_field_scratch_strategy() {
        let mut scratch = [0u8; 32];
        let bytes = encode_with(|e| {
            e.write_message_field(8, &mut scratch, |inner| inner.write_varint_field(1, 7))
                .unwrap()
        });
        // tag, len, then the nested field
        assert_eq!(bytes, [(8 << 3) | 2, 2, 1 << 3, 7]);
    }

    #[test]
    fn test_message_field_scratch_too_small() {
        let mut buf = [0u8; 64];
        let mut sink = SliceSink::new(&mut buf);
        let mut enc = FieldEncoder::new(&mut sink);
        let mut scratch = [0u8; 2];
        let err = enc.write_message_field(8, &mut scratch, |inner| {
            inner.write_bytes_field(1, &[0u8; 8])
        });
        assert_eq!(err, Err(WireError::ScratchTooSmall));
        assert_eq!(sink.written(), 0);
    }
}
