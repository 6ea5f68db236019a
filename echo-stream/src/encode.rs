//! Incremental whole-message encoder
//!
//! Walks a message's field plan and emits as many bytes as the current
//! output chunk has room for, suspending mid-field when it runs out.
//! Scalar fields are emitted in one piece (the tail of one may spill into
//! the ring, at most one atomic unit). Variable-length content pushes a
//! frame that copies straight into the chunk across as many `fill` calls
//! as it takes. Nested messages are measured with an iterative counting
//! pass first, so their length prefix is written before any of their
//! content and nothing is ever back-patched.

use echo_wire::{varint, ByteSink, Tag, WireType};
use heapless::Vec;

use crate::bridge::ChunkWriter;
use crate::error::StreamError;
use crate::ring::{ByteRing, RING_CAPACITY};
use crate::schema::{EncodeSource, FieldHandle, FieldPlan, ScalarValue};

/// Result of one `fill` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FillOutcome {
    /// Bytes placed in the supplied chunk
    pub written: usize,
    /// Whether the whole message, including ring spill, has been emitted
    pub done: bool,
}

#[derive(Debug, Clone, Copy)]
enum EncodeJob {
    /// Iterate the field plan of a (sub)message from slot `cursor`
    Fields,
    /// Stream a string/bytes field's content from byte offset `cursor`
    Content { total: u32 },
}

#[derive(Debug, Clone, Copy)]
struct EncodeFrame {
    cursor: u32,
    job: EncodeJob,
    pathed: bool,
}

/// Streaming encoder for one in-flight message
///
/// `DEPTH` matches the decoder's stack bound: `MAX_NESTING_DEPTH + 1`
/// for the message type being emitted.
#[derive(Debug)]
pub struct StreamEncoder<const DEPTH: usize> {
    ring: ByteRing<RING_CAPACITY>,
    frames: Vec<EncodeFrame, DEPTH>,
    path: Vec<FieldHandle, DEPTH>,
    failed: Option<StreamError>,
}

impl<const DEPTH: usize> Default for StreamEncoder<DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const DEPTH: usize> StreamEncoder<DEPTH> {
    /// The stack must at least hold the root frame
    const DEPTH_HOLDS_ROOT: () = assert!(DEPTH >= 1);

    /// Create an encoder at the start of a message
    pub fn new() -> Self {
        let () = Self::DEPTH_HOLDS_ROOT;
        let mut frames = Vec::new();
        let _ = frames.push(EncodeFrame {
            cursor: 0,
            job: EncodeJob::Fields,
            pathed: false,
        });
        Self {
            ring: ByteRing::new(),
            frames,
            path: Vec::new(),
            failed: None,
        }
    }

    /// Abandon the in-flight encode and start the message over
    pub fn reset(&mut self) {
        self.ring.clear();
        self.frames.clear();
        let _ = self.frames.push(EncodeFrame {
            cursor: 0,
            job: EncodeJob::Fields,
            pathed: false,
        });
        self.path.clear();
        self.failed = None;
    }

    /// Emit the next run of encoded bytes into `chunk`
    ///
    /// `source` must be the same unchanged message on every call of one
    /// encode operation. Returns the bytes written and whether the
    /// encode has fully drained; a `done` outcome with a full chunk can
    /// still leave ring spill, so keep calling until `done` is reported
    /// with room to spare.
    pub fn fill<M: EncodeSource>(
        &mut self,
        source: &M,
        chunk: &mut [u8],
    ) -> Result<FillOutcome, StreamError> {
        if let Some(err) = self.failed {
            return Err(err);
        }
        let Self {
            ring,
            frames,
            path,
            failed,
        } = self;

        let mut writer = ChunkWriter::new(ring, chunk);
        let result = run(frames, path, source, &mut writer);
        let written = writer.finish();
        match result {
            Ok(()) => Ok(FillOutcome {
                written,
                done: frames.is_empty() && ring.is_empty(),
            }),
            Err(err) => {
                ring.clear();
                *failed = Some(err);
                Err(err)
            }
        }
    }

    /// Total encoded size of `source`, by the same plan `fill` follows
    pub fn measure<M: EncodeSource>(source: &M) -> Result<u64, StreamError> {
        let mut path: Vec<FieldHandle, DEPTH> = Vec::new();
        measure_at::<M, DEPTH>(source, &mut path)
    }
}

fn run<M: EncodeSource, const DEPTH: usize, const N: usize>(
    frames: &mut Vec<EncodeFrame, DEPTH>,
    path: &mut Vec<FieldHandle, DEPTH>,
    source: &M,
    writer: &mut ChunkWriter<'_, N>,
) -> Result<(), StreamError> {
    while writer.chunk_space() > 0 {
        let Some(top) = frames.last() else {
            return Ok(()); // message already fully emitted
        };
        let cursor = top.cursor;

        match top.job {
            EncodeJob::Fields => {
                if cursor as usize >= source.field_count(path) {
                    if let Some(frame) = frames.pop() {
                        if frame.pathed {
                            path.pop();
                        }
                    }
                    continue;
                }
                if let Some(top) = frames.last_mut() {
                    top.cursor += 1;
                }
                let Some(plan) = source.field_plan(path, cursor as usize) else {
                    continue; // unset field, nothing on the wire
                };
                match plan {
                    FieldPlan::Scalar {
                        field_number,
                        value,
                    } => emit_scalar(writer, field_number, value)?,
                    FieldPlan::Bytes {
                        field_number,
                        handle,
                    }
                    | FieldPlan::Str {
                        field_number,
                        handle,
                    } => {
                        path.push(handle).map_err(|_| StreamError::DepthExceeded)?;
                        let len = source.byte_len(path) as u64;
                        emit_delimited_header(writer, field_number, len)?;
                        frames
                            .push(EncodeFrame {
                                cursor: 0,
                                job: EncodeJob::Content { total: len as u32 },
                                pathed: true,
                            })
                            .map_err(|_| StreamError::DepthExceeded)?;
                    }
                    FieldPlan::Message {
                        field_number,
                        handle,
                    } => {
                        path.push(handle).map_err(|_| StreamError::DepthExceeded)?;
                        let size = measure_at::<M, DEPTH>(source, path)?;
                        emit_delimited_header(writer, field_number, size)?;
                        frames
                            .push(EncodeFrame {
                                cursor: 0,
                                job: EncodeJob::Fields,
                                pathed: true,
                            })
                            .map_err(|_| StreamError::DepthExceeded)?;
                    }
                }
            }
            EncodeJob::Content { total } => {
                if cursor >= total {
                    if let Some(frame) = frames.pop() {
                        if frame.pathed {
                            path.pop();
                        }
                    }
                    continue;
                }
                let n = writer.with_chunk_tail(|tail| {
                    let want = tail.len().min((total - cursor) as usize);
                    source.bytes_at(path, cursor as usize, &mut tail[..want])
                });
                if let Some(top) = frames.last_mut() {
                    top.cursor += n as u32;
                }
                if n == 0 {
                    return Ok(()); // chunk exhausted mid-content
                }
            }
        }
    }
    Ok(())
}

/// Emit one scalar field whole; at most its tail spills into the ring
fn emit_scalar<const N: usize>(
    writer: &mut ChunkWriter<'_, N>,
    field_number: u32,
    value: ScalarValue,
) -> Result<(), StreamError> {
    let mut stage = [0u8; echo_wire::MAX_TAG_BYTES + echo_wire::MAX_VARINT_BYTES];
    let tag = Tag::new(field_number, value.wire_type());
    let mut pos = varint::encode(tag.pack(), &mut stage);
    match value {
        ScalarValue::Varint(v) => pos += varint::encode(v, &mut stage[pos..]),
        ScalarValue::Svarint(v) => pos += varint::encode(varint::zigzag_encode(v), &mut stage[pos..]),
        ScalarValue::Bool(v) => pos += varint::encode(u64::from(v), &mut stage[pos..]),
        ScalarValue::Fixed32(v) => {
            stage[pos..pos + 4].copy_from_slice(&v.to_le_bytes());
            pos += 4;
        }
        ScalarValue::Fixed64(v) => {
            stage[pos..pos + 8].copy_from_slice(&v.to_le_bytes());
            pos += 8;
        }
    }
    writer
        .extend(&stage[..pos])
        .map_err(|_| StreamError::RingOverflow)
}

/// Emit a delimited field's tag and length prefix
fn emit_delimited_header<const N: usize>(
    writer: &mut ChunkWriter<'_, N>,
    field_number: u32,
    len: u64,
) -> Result<(), StreamError> {
    let mut stage = [0u8; echo_wire::MAX_TAG_BYTES + echo_wire::MAX_VARINT_BYTES];
    let tag = Tag::new(field_number, WireType::Delimited);
    let mut pos = varint::encode(tag.pack(), &mut stage);
    pos += varint::encode(len, &mut stage[pos..]);
    writer
        .extend(&stage[..pos])
        .map_err(|_| StreamError::RingOverflow)
}

const fn tag_len(field_number: u32) -> u64 {
    varint::encoded_len((field_number as u64) << 3) as u64
}

fn scalar_len(value: ScalarValue) -> u64 {
    match value {
        ScalarValue::Varint(v) => varint::encoded_len(v) as u64,
        ScalarValue::Svarint(v) => varint::encoded_len(varint::zigzag_encode(v)) as u64,
        ScalarValue::Bool(_) => 1,
        ScalarValue::Fixed32(_) => 4,
        ScalarValue::Fixed64(_) => 8,
    }
}

/// Encoded size of the (sub)message at `path`, without recursing
///
/// Walks the plan with an explicit stack of per-level accumulators;
/// inner sizes land before outer ones need them, exactly the order the
/// length prefixes require. `path` is restored before returning.
fn measure_at<M: EncodeSource, const DEPTH: usize>(
    source: &M,
    path: &mut Vec<FieldHandle, DEPTH>,
) -> Result<u64, StreamError> {
    struct Level {
        index: usize,
        acc: u64,
        field_number: u32,
    }

    let mut stack: Vec<Level, DEPTH> = Vec::new();
    stack
        .push(Level {
            index: 0,
            acc: 0,
            field_number: 0,
        })
        .map_err(|_| StreamError::DepthExceeded)?;

    loop {
        let (index, finished) = match stack.last() {
            Some(level) => (level.index, level.index >= source.field_count(path)),
            None => return Err(StreamError::DepthExceeded),
        };

        if finished {
            let Some(done) = stack.pop() else {
                return Err(StreamError::DepthExceeded);
            };
            let Some(parent) = stack.last_mut() else {
                return Ok(done.acc);
            };
            path.pop();
            parent.acc += tag_len(done.field_number)
                + varint::encoded_len(done.acc) as u64
                + done.acc;
            continue;
        }

        if let Some(level) = stack.last_mut() {
            level.index += 1;
        }
        let Some(plan) = source.field_plan(path, index) else {
            continue;
        };
        match plan {
            FieldPlan::Scalar {
                field_number,
                value,
            } => {
                if let Some(level) = stack.last_mut() {
                    level.acc += tag_len(field_number) + scalar_len(value);
                }
            }
            FieldPlan::Bytes {
                field_number,
                handle,
            }
            | FieldPlan::Str {
                field_number,
                handle,
            } => {
                path.push(handle).map_err(|_| StreamError::DepthExceeded)?;
                let len = source.byte_len(path) as u64;
                path.pop();
                if let Some(level) = stack.last_mut() {
                    level.acc += tag_len(field_number) + varint::encoded_len(len) as u64 + len;
                }
            }
            FieldPlan::Message {
                field_number,
                handle,
            } => {
                path.push(handle).map_err(|_| StreamError::DepthExceeded)?;
                stack
                    .push(Level {
                        index: 0,
                        acc: 0,
                        field_number,
                    })
                    .map_err(|_| StreamError::DepthExceeded)?;
            }
        }
    }
}
