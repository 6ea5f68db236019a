//! Field tags and wire types
//!
//! A tag is `(field_number << 3) | wire_type`, encoded as a varint in
//! front of every field payload.

use crate::error::WireError;

/// Maximum encoded length of a tag varint (u32 field number, 35 bits total)
pub const MAX_TAG_BYTES: usize = 5;

/// Maximum encoded length of a 64-bit varint
pub const MAX_VARINT_BYTES: usize = 10;

/// Payload encoding declared by the low 3 bits of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 8 raw little-endian bytes
    Fixed64 = 1,
    /// Varint length followed by that many raw bytes
    Delimited = 2,
    /// 4 raw little-endian bytes
    Fixed32 = 5,
}

impl WireType {
    /// Decode the low 3 bits of a tag
    ///
    /// Wire types 3 and 4 (the retired group markers) and 6-7 are invalid.
    pub fn from_raw(raw: u8) -> Result<Self, WireError> {
        match raw {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::Delimited),
            5 => Ok(WireType::Fixed32),
            other => Err(WireError::InvalidWireType(other)),
        }
    }
}

/// A decoded field tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tag {
    /// Field number (1-based; 0 is reserved and invalid)
    pub field_number: u32,
    /// Payload encoding
    pub wire_type: WireType,
}

impl Tag {
    /// Create a tag for a field
    pub const fn new(field_number: u32, wire_type: WireType) -> Self {
        Self {
            field_number,
            wire_type,
        }
    }

    /// Pack into the varint value that precedes the payload
    pub const fn pack(self) -> u64 {
        ((self.field_number as u64) << 3) | (self.wire_type as u64)
    }

    /// Unpack a decoded tag varint
    pub fn unpack(raw: u64) -> Result<Self, WireError> {
        let field_number = raw >> 3;
        if field_number == 0 || field_number > u32::MAX as u64 {
            return Err(WireError::InvalidTag);
        }
        let wire_type = WireType::from_raw((raw & 0x7) as u8)?;
        Ok(Self {
            field_number: field_number as u32,
            wire_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_roundtrip() {
        let tag = Tag::new(4, WireType::Varint);
        assert_eq!(tag.pack(), 4 << 3);
        assert_eq!(Tag::unpack(tag.pack()).unwrap(), tag);

        let tag = Tag::new(u32::MAX, WireType::Fixed32);
        assert_eq!(Tag::unpack(tag.pack()).unwrap(), tag);
    }

    #[test]
    fn test_invalid_wire_types_rejected() {
        for raw in [3u8, 4, 6, 7] {
            assert_eq!(
                WireType::from_raw(raw),
                Err(WireError::InvalidWireType(raw))
            );
        }
    }

    #[test]
    fn test_field_number_zero_rejected() {
        assert_eq!(Tag::unpack(0), Err(WireError::InvalidTag));
        assert_eq!(Tag::unpack(2), Err(WireError::InvalidTag)); // delimited, field 0
    }

    #[test]
    fn test_oversized_field_number_rejected() {
        let raw = ((u32::MAX as u64) + 1) << 3;
        assert_eq!(Tag::unpack(raw), Err(WireError::InvalidTag));
    }
}
