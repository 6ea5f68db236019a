//! Transport-facing glue
//!
//! The transport layer owns connections, chunk ordering, and message
//! framing; the codec only ever sees one chunk at a time. These adapters
//! are the seam: the transport's "data received" callback forwards into
//! [`StreamDecoder::feed`], and its "send buffer available" callback
//! drains [`StreamEncoder::fill`] into whatever carries the bytes out.

use crate::decode::{FeedStatus, StreamDecoder};
use crate::encode::{FillOutcome, StreamEncoder};
use crate::error::StreamError;
use crate::schema::{DecodeTarget, EncodeSource};

/// Consumer of outgoing byte chunks (a connection's send path)
pub trait ChunkSink {
    /// Take ownership of one chunk's worth of bytes, in order
    fn deliver(&mut self, chunk: &[u8]) -> Result<(), StreamError>;
}

/// Forward a received chunk into an in-flight decode
pub fn on_data_received<M: DecodeTarget, const DEPTH: usize>(
    decoder: &mut StreamDecoder<DEPTH>,
    target: &mut M,
    bytes: &[u8],
) -> Result<FeedStatus, StreamError> {
    decoder.feed(target, bytes)
}

/// Fill up to `capacity` bytes of `buf` for transmission
pub fn on_send_buffer_available<M: EncodeSource, const DEPTH: usize>(
    encoder: &mut StreamEncoder<DEPTH>,
    source: &M,
    buf: &mut [u8],
) -> Result<FillOutcome, StreamError> {
    encoder.fill(source, buf)
}

/// Drive an encode to completion through `sink`, one scratch-sized
/// chunk at a time
pub fn pump_encode<M: EncodeSource, S: ChunkSink, const DEPTH: usize>(
    encoder: &mut StreamEncoder<DEPTH>,
    source: &M,
    sink: &mut S,
    scratch: &mut [u8],
) -> Result<(), StreamError> {
    loop {
        let outcome = encoder.fill(source, scratch)?;
        if outcome.written > 0 {
            sink.deliver(&scratch[..outcome.written])?;
        }
        if outcome.done {
            return Ok(());
        }
        if outcome.written == 0 {
            // zero-capacity scratch can never make progress
            return Err(StreamError::Wire(echo_wire::WireError::SinkFull));
        }
    }
}
