//! Schema-facing traits
//!
//! The code generator turns a message schema into structs implementing
//! [`DecodeTarget`] and [`EncodeSource`]. Frames in the streaming
//! machines never capture references into those structs; a field scope is
//! identified by a [`FieldHandle`] path and the struct dispatches on it,
//! which keeps the frame stack and the message fully decoupled.

use echo_wire::WireType;

use crate::error::StreamError;

/// Opaque per-schema identifier for a string/bytes/message field
///
/// Assigned by generated code; the machines only carry and compare them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldHandle(pub u16);

/// Typed interpretation of a scalar wire payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScalarKind {
    /// Plain varint
    Varint,
    /// Zig-zag varint
    Svarint,
    /// Varint, nonzero means true
    Bool,
    /// 4 byte little-endian
    Fixed32,
    /// 8 byte little-endian
    Fixed64,
}

impl ScalarKind {
    /// The wire type this kind is carried on
    pub fn wire_type(self) -> WireType {
        match self {
            ScalarKind::Varint | ScalarKind::Svarint | ScalarKind::Bool => WireType::Varint,
            ScalarKind::Fixed32 => WireType::Fixed32,
            ScalarKind::Fixed64 => WireType::Fixed64,
        }
    }
}

/// A decoded (or to-be-encoded) scalar value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScalarValue {
    /// Plain varint
    Varint(u64),
    /// Zig-zag signed varint
    Svarint(i64),
    /// Bool varint
    Bool(bool),
    /// Fixed 4-byte value
    Fixed32(u32),
    /// Fixed 8-byte value
    Fixed64(u64),
}

impl ScalarValue {
    /// The wire type this value is carried on
    pub fn wire_type(self) -> WireType {
        self.kind().wire_type()
    }

    /// The kind of this value
    pub fn kind(self) -> ScalarKind {
        match self {
            ScalarValue::Varint(_) => ScalarKind::Varint,
            ScalarValue::Svarint(_) => ScalarKind::Svarint,
            ScalarValue::Bool(_) => ScalarKind::Bool,
            ScalarValue::Fixed32(_) => ScalarKind::Fixed32,
            ScalarValue::Fixed64(_) => ScalarKind::Fixed64,
        }
    }
}

/// What the decoder should do with an incoming field's payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldAction {
    /// Decode the payload as one scalar and deliver it whole
    Scalar(ScalarKind),
    /// Stream the delimited payload into a bytes field
    AppendBytes(FieldHandle),
    /// Stream the delimited payload into a string field
    /// (UTF-8 is validated when the field closes)
    AppendString(FieldHandle),
    /// Open the delimited payload as a nested message
    Recurse(FieldHandle),
    /// Consume and discard the payload
    Skip,
}

/// What the encoder emits for one field slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldPlan {
    /// A scalar, emitted in one piece
    Scalar {
        /// Field number on the wire
        field_number: u32,
        /// Value to emit
        value: ScalarValue,
    },
    /// A bytes field, streamed via `bytes_at`
    Bytes {
        /// Field number on the wire
        field_number: u32,
        /// Handle naming the source field
        handle: FieldHandle,
    },
    /// A string field, streamed via `bytes_at`
    Str {
        /// Field number on the wire
        field_number: u32,
        /// Handle naming the source field
        handle: FieldHandle,
    },
    /// A nested message, measured then streamed field by field
    Message {
        /// Field number on the wire
        field_number: u32,
        /// Handle naming the nested message
        handle: FieldHandle,
    },
}

/// A message struct the streaming decoder can fill
///
/// `path` is the chain of handles for the currently-open nested scopes,
/// outermost first; an empty path is the top-level message.
pub trait DecodeTarget {
    /// Deepest chain of nested message/string/bytes scopes in this
    /// message type; the decode frame stack needs `MAX_NESTING_DEPTH + 1`
    /// slots.
    const MAX_NESTING_DEPTH: usize;

    /// Decide what to do with a field
    ///
    /// Unknown field numbers and wire-type mismatches return
    /// [`FieldAction::Skip`]; the decoder also re-checks the wire type
    /// and skips on disagreement.
    fn classify(&self, path: &[FieldHandle], field_number: u32, wire_type: WireType)
        -> FieldAction;

    /// Store a decoded scalar
    ///
    /// A repeated field at capacity reports
    /// [`StreamError::FieldCapacity`]; a narrowing conversion that does
    /// not fit reports [`StreamError::ValueOutOfRange`].
    fn set_scalar(
        &mut self,
        path: &[FieldHandle],
        field_number: u32,
        value: ScalarValue,
    ) -> Result<(), StreamError>;

    /// Append part of a string/bytes payload; the path tail names the
    /// field. Called once per contiguous run, in order.
    fn append_bytes(&mut self, path: &[FieldHandle], chunk: &[u8]) -> Result<(), StreamError>;

    /// A delimited scope just opened; reset the named field so abandoned
    /// decodes leave well-defined state
    fn begin_delimited(&mut self, path: &[FieldHandle]);

    /// The scope at `path` consumed its declared length
    ///
    /// String fields validate UTF-8 here.
    fn end_delimited(&mut self, path: &[FieldHandle]) -> Result<(), StreamError> {
        let _ = path;
        Ok(())
    }
}

/// A message struct the streaming encoder can walk
///
/// The plan for a given path must stay stable for the whole encode
/// operation; the source is borrowed shared and must not change between
/// `fill` calls.
pub trait EncodeSource {
    /// Number of field slots in the (sub)message at `path`
    fn field_count(&self, path: &[FieldHandle]) -> usize;

    /// The plan for slot `index`, or `None` for a field that is unset and
    /// therefore not emitted
    fn field_plan(&self, path: &[FieldHandle], index: usize) -> Option<FieldPlan>;

    /// Total length of the string/bytes field named by the path tail
    fn byte_len(&self, path: &[FieldHandle]) -> usize;

    /// Copy `out.len()` bytes of that field starting at `offset`
    ///
    /// The machine never asks past `byte_len`; the return value is the
    /// bytes copied and must equal `out.len()`.
    fn bytes_at(&self, path: &[FieldHandle], offset: usize, out: &mut [u8]) -> usize;
}
