//! Resumable chunk-at-a-time codec machines for the Echo RPC stack
//!
//! `echo-wire` handles bytes that are already in hand; this crate handles
//! bytes that are not. Input arrives as independently-sized chunks (one
//! network packet, one flash read, one UART buffer) and output leaves the
//! same way, so both machines here can suspend at any byte boundary and
//! resume on the next call:
//!
//! - [`ChunkReader`]/[`ChunkWriter`] bridge a small persistent byte ring
//!   and one transient chunk into a single logical stream.
//! - [`StreamDecoder`] consumes chunks field-by-field into a caller-owned
//!   message, using a bounded frame stack instead of recursion.
//! - [`StreamEncoder`] mirrors it for serialization, emitting as many
//!   bytes as the current output chunk has room for.
//! - [`ScalarFieldBuilder`] is the degenerate single-frame variant for
//!   messages with one scalar field and no nesting.
//!
//! Nothing here owns a thread or blocks: "suspension" means state is
//! saved and the call returns. Message structs plug in through the
//! [`schema`] traits, which generated code implements.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod bridge;
pub mod decode;
pub mod encode;
pub mod error;
pub mod ring;
pub mod scalar;
pub mod schema;
pub mod transport;

#[cfg(test)]
pub(crate) mod fixtures;

pub use bridge::{ChunkReader, ChunkWriter, Marker};
pub use decode::{FeedStatus, StreamDecoder};
pub use encode::{FillOutcome, StreamEncoder};
pub use error::StreamError;
pub use ring::{ByteRing, RING_CAPACITY};
pub use scalar::{ScalarField, ScalarFieldBuilder};
pub use schema::{
    DecodeTarget, EncodeSource, FieldAction, FieldHandle, FieldPlan, ScalarKind, ScalarValue,
};
pub use transport::ChunkSink;
