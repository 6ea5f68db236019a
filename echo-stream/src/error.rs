//! Streaming-layer error definitions

use echo_wire::WireError;

/// Errors that can occur while feeding or filling a streaming codec
///
/// Transport starvation is not in this list: running out of bytes mid
/// field suspends the machine and is reported through the feed/fill
/// status, not as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamError {
    /// Malformed wire data underneath
    Wire(WireError),
    /// The resumable ring overflowed; the schema's size bounds are wrong
    RingOverflow,
    /// Nesting deeper than the frame stack sized for this message type
    DepthExceeded,
    /// A delimited region's declared length disagrees with its content
    DelimitedMismatch,
    /// A bounded field (repeated at capacity, bytes/string at max size)
    /// received more data than it can hold
    FieldCapacity,
    /// A scalar value does not fit the field's declared type
    ValueOutOfRange,
    /// String field closed on bytes that are not valid UTF-8
    InvalidUtf8,
}

impl From<WireError> for StreamError {
    fn from(err: WireError) -> Self {
        StreamError::Wire(err)
    }
}
