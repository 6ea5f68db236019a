//! Incremental whole-message decoder
//!
//! Consumes a message field by field across any number of `feed` calls.
//! Nesting is handled with a bounded stack of frames, one per open
//! message/string/bytes scope, instead of recursion: a matched delimited
//! field pushes a frame and the loop re-enters with the new top. A field
//! split across chunks is retried transactionally: the read position is
//! marked, and on starvation rewound, so the bridge teardown parks the
//! partial field in the ring for the next call.

use echo_wire::{varint, ByteSource, Tag, WireType};
use heapless::Vec;

use crate::bridge::ChunkReader;
use crate::error::StreamError;
use crate::ring::{ByteRing, RING_CAPACITY};
use crate::schema::{DecodeTarget, FieldAction, FieldHandle, ScalarKind, ScalarValue};

/// Copy granularity for streaming delimited content out of the bridge
const STAGE_BYTES: usize = 32;

/// Where a `feed` call left the decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeedStatus {
    /// Everything fed so far was consumed and the decoder sits at a
    /// top-level field boundary; the transport decides whether the
    /// message is complete
    Boundary,
    /// Mid-field or mid-scope; more chunks are required
    Pending,
}

#[derive(Debug, Clone, Copy)]
enum FrameScope {
    /// Message fields: parse tag + payload pairs
    Fields,
    /// String/bytes content: stream raw bytes to the target
    Content,
    /// Unknown field content: consume and drop
    Discard,
}

#[derive(Debug, Clone, Copy)]
struct DecodeFrame {
    /// Wire bytes this scope still owns; `u32::MAX` for the root, which
    /// is never decremented and never popped
    remaining: u32,
    scope: FrameScope,
    /// Whether this frame pushed a handle onto the path
    pathed: bool,
}

impl DecodeFrame {
    const fn root() -> Self {
        Self {
            remaining: u32::MAX,
            scope: FrameScope::Fields,
            pathed: false,
        }
    }
}

/// Why a transactional read stopped short
pub(crate) enum Halt {
    /// Out of bytes; suspend and resume on the next chunk
    Starved,
    /// Malformed input; the operation is dead
    Fail(StreamError),
}

/// Budget-checked reader for one field
///
/// Enforces the enclosing scope's `remaining` while pulling from the
/// bridge; crossing the budget mid-field means the wire data disagrees
/// with a declared length.
pub(crate) struct LimitedReader<'r, 'a, const N: usize> {
    reader: &'r mut ChunkReader<'a, N>,
    budget: u32,
    used: u32,
}

impl<'r, 'a, const N: usize> LimitedReader<'r, 'a, N> {
    pub(crate) fn new(reader: &'r mut ChunkReader<'a, N>, budget: u32) -> Self {
        Self {
            reader,
            budget,
            used: 0,
        }
    }

    pub(crate) fn used(&self) -> u32 {
        self.used
    }

    pub(crate) fn pop(&mut self) -> Result<u8, Halt> {
        if self.used >= self.budget {
            return Err(Halt::Fail(StreamError::DelimitedMismatch));
        }
        match self.reader.pop() {
            Some(byte) => {
                self.used += 1;
                Ok(byte)
            }
            None => Err(Halt::Starved),
        }
    }

    pub(crate) fn read_varint(&mut self) -> Result<u64, Halt> {
        let mut value: u64 = 0;
        for i in 0..echo_wire::MAX_VARINT_BYTES {
            let byte = self.pop()?;
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Halt::Fail(StreamError::Wire(
            echo_wire::WireError::VarintOverflow,
        )))
    }

    pub(crate) fn read_fixed32(&mut self) -> Result<u32, Halt> {
        let mut raw = [0u8; 4];
        for byte in &mut raw {
            *byte = self.pop()?;
        }
        Ok(u32::from_le_bytes(raw))
    }

    pub(crate) fn read_fixed64(&mut self) -> Result<u64, Halt> {
        let mut raw = [0u8; 8];
        for byte in &mut raw {
            *byte = self.pop()?;
        }
        Ok(u64::from_le_bytes(raw))
    }
}

enum Outcome {
    /// A whole scalar field was read
    Scalar {
        consumed: u32,
        dispatch: Option<(u32, ScalarValue)>,
    },
    /// A delimited field's header was read; a frame must open
    Open {
        header: u32,
        len: u32,
        scope: FrameScope,
        handle: Option<FieldHandle>,
    },
}

fn convert(
    action: FieldAction,
    field_number: u32,
    wire_type: WireType,
    raw: u64,
) -> Option<(u32, ScalarValue)> {
    let FieldAction::Scalar(kind) = action else {
        return None;
    };
    if kind.wire_type() != wire_type {
        return None;
    }
    let value = match kind {
        ScalarKind::Varint => ScalarValue::Varint(raw),
        ScalarKind::Svarint => ScalarValue::Svarint(varint::zigzag_decode(raw)),
        ScalarKind::Bool => ScalarValue::Bool(raw != 0),
        ScalarKind::Fixed32 => ScalarValue::Fixed32(raw as u32),
        ScalarKind::Fixed64 => ScalarValue::Fixed64(raw),
    };
    Some((field_number, value))
}

/// Read exactly one field (tag + payload or tag + delimited header)
fn decode_field<M: DecodeTarget, const N: usize>(
    target: &M,
    path: &[FieldHandle],
    budget: u32,
    reader: &mut ChunkReader<'_, N>,
) -> Result<Outcome, Halt> {
    let mut lim = LimitedReader::new(reader, budget);
    let raw_tag = lim.read_varint()?;
    let tag = Tag::unpack(raw_tag).map_err(|err| Halt::Fail(StreamError::Wire(err)))?;
    let action = target.classify(path, tag.field_number, tag.wire_type);

    match tag.wire_type {
        WireType::Varint => {
            let raw = lim.read_varint()?;
            Ok(Outcome::Scalar {
                consumed: lim.used(),
                dispatch: convert(action, tag.field_number, tag.wire_type, raw),
            })
        }
        WireType::Fixed32 => {
            let raw = lim.read_fixed32()?;
            Ok(Outcome::Scalar {
                consumed: lim.used(),
                dispatch: convert(action, tag.field_number, tag.wire_type, u64::from(raw)),
            })
        }
        WireType::Fixed64 => {
            let raw = lim.read_fixed64()?;
            Ok(Outcome::Scalar {
                consumed: lim.used(),
                dispatch: convert(action, tag.field_number, tag.wire_type, raw),
            })
        }
        WireType::Delimited => {
            let len = lim.read_varint()?;
            let header = lim.used();
            // The declared region must fit inside the enclosing scope
            if len >= u64::from(u32::MAX) || len > u64::from(budget - header) {
                return Err(Halt::Fail(StreamError::DelimitedMismatch));
            }
            let (scope, handle) = match action {
                FieldAction::AppendBytes(h) | FieldAction::AppendString(h) => {
                    (FrameScope::Content, Some(h))
                }
                FieldAction::Recurse(h) => (FrameScope::Fields, Some(h)),
                FieldAction::Scalar(_) | FieldAction::Skip => (FrameScope::Discard, None),
            };
            Ok(Outcome::Open {
                header,
                len: len as u32,
                scope,
                handle,
            })
        }
    }
}

/// Streaming decoder for one in-flight message
///
/// `DEPTH` is the frame stack capacity and must be the target type's
/// `MAX_NESTING_DEPTH + 1`; generated code provides a sized alias per
/// message type.
#[derive(Debug)]
pub struct StreamDecoder<const DEPTH: usize> {
    ring: ByteRing<RING_CAPACITY>,
    frames: Vec<DecodeFrame, DEPTH>,
    path: Vec<FieldHandle, DEPTH>,
    failed: Option<StreamError>,
    high_water: usize,
}

impl<const DEPTH: usize> Default for StreamDecoder<DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const DEPTH: usize> StreamDecoder<DEPTH> {
    /// The stack must at least hold the root frame
    const DEPTH_HOLDS_ROOT: () = assert!(DEPTH >= 1);

    /// Create a decoder at the start of a message
    pub fn new() -> Self {
        let () = Self::DEPTH_HOLDS_ROOT;
        let mut frames = Vec::new();
        let _ = frames.push(DecodeFrame::root());
        Self {
            ring: ByteRing::new(),
            frames,
            path: Vec::new(),
            failed: None,
            high_water: 1,
        }
    }

    /// Abandon any in-flight decode and return to the start of a message
    ///
    /// The target keeps whatever fields were already populated; scopes
    /// that were open had already been reset via `begin_delimited`.
    pub fn reset(&mut self) {
        self.ring.clear();
        self.frames.clear();
        let _ = self.frames.push(DecodeFrame::root());
        self.path.clear();
        self.failed = None;
        self.high_water = 1;
    }

    /// Deepest frame stack observed since the last reset
    pub fn depth_high_water(&self) -> usize {
        self.high_water
    }

    /// Feed the next chunk of the encoded message, in transport order
    ///
    /// Decodes as many whole fields as the buffered + supplied bytes
    /// allow, dispatching them into `target`. Returns how the call left
    /// the decode, or the error that killed it; after an error every
    /// subsequent call returns the same error until [`reset`].
    ///
    /// [`reset`]: StreamDecoder::reset
    pub fn feed<M: DecodeTarget>(
        &mut self,
        target: &mut M,
        chunk: &[u8],
    ) -> Result<FeedStatus, StreamError> {
        if let Some(err) = self.failed {
            return Err(err);
        }
        let Self {
            ring,
            frames,
            path,
            failed,
            high_water,
        } = self;

        let mut reader = ChunkReader::new(ring, chunk);
        let result = run(frames, path, high_water, target, &mut reader);
        let result = match result {
            Ok(()) => reader.finish(),
            Err(err) => {
                drop(reader);
                Err(err)
            }
        };
        match result {
            Ok(()) => Ok(if frames.len() == 1 && ring.is_empty() {
                FeedStatus::Boundary
            } else {
                FeedStatus::Pending
            }),
            Err(err) => {
                ring.clear();
                *failed = Some(err);
                Err(err)
            }
        }
    }
}

fn run<M: DecodeTarget, const DEPTH: usize, const N: usize>(
    frames: &mut Vec<DecodeFrame, DEPTH>,
    path: &mut Vec<FieldHandle, DEPTH>,
    high_water: &mut usize,
    target: &mut M,
    reader: &mut ChunkReader<'_, N>,
) -> Result<(), StreamError> {
    loop {
        // Close scopes that consumed their declared length
        while frames.len() > 1 && frames.last().is_some_and(|f| f.remaining == 0) {
            let Some(frame) = frames.pop() else { break };
            if frame.pathed {
                if !matches!(frame.scope, FrameScope::Discard) {
                    target.end_delimited(path)?;
                }
                path.pop();
            }
        }

        let (scope, budget) = match frames.last() {
            Some(top) => (top.scope, top.remaining),
            None => return Err(StreamError::DepthExceeded),
        };
        let is_root = frames.len() == 1;

        match scope {
            FrameScope::Fields => {
                let mark = reader.mark();
                match decode_field(target, path, budget, reader) {
                    Err(Halt::Starved) => {
                        reader.rewind(mark);
                        return Ok(());
                    }
                    Err(Halt::Fail(err)) => return Err(err),
                    Ok(Outcome::Scalar { consumed, dispatch }) => {
                        if let Some((field_number, value)) = dispatch {
                            target.set_scalar(path, field_number, value)?;
                        }
                        if !is_root {
                            if let Some(top) = frames.last_mut() {
                                top.remaining -= consumed;
                            }
                        }
                    }
                    Ok(Outcome::Open {
                        header,
                        len,
                        scope,
                        handle,
                    }) => {
                        if !is_root {
                            if let Some(top) = frames.last_mut() {
                                top.remaining -= header + len;
                            }
                        }
                        let pathed = handle.is_some();
                        if let Some(handle) = handle {
                            path.push(handle)
                                .map_err(|_| StreamError::DepthExceeded)?;
                        }
                        frames
                            .push(DecodeFrame {
                                remaining: len,
                                scope,
                                pathed,
                            })
                            .map_err(|_| StreamError::DepthExceeded)?;
                        *high_water = (*high_water).max(frames.len());
                        if pathed {
                            target.begin_delimited(path);
                        }
                    }
                }
            }
            FrameScope::Content | FrameScope::Discard => {
                let want = (budget as usize).min(STAGE_BYTES);
                let mut stage = [0u8; STAGE_BYTES];
                let n = reader.pull(&mut stage[..want]);
                if n == 0 {
                    return Ok(());
                }
                if matches!(scope, FrameScope::Content) {
                    target.append_bytes(path, &stage[..n])?;
                }
                if let Some(top) = frames.last_mut() {
                    top.remaining -= n as u32;
                }
            }
        }
    }
}
