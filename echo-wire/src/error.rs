//! Wire-level error definitions

/// Errors that can occur while encoding or decoding wire primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// Source ran out of bytes mid-value
    UnexpectedEnd,
    /// Tag carried a wire type other than 0, 1, 2 or 5
    InvalidWireType(u8),
    /// Tag was zero or its field number does not fit a u32
    InvalidTag,
    /// Varint did not terminate within 10 bytes
    VarintOverflow,
    /// Sink has no room for the bytes being written
    SinkFull,
    /// Read attempted past the end of a length-delimited region
    RegionOverrun,
    /// Scratch buffer too small for a nested message
    ScratchTooSmall,
    /// String field was not valid UTF-8
    InvalidUtf8,
}
