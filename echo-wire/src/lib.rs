//! Protobuf-compatible wire primitives for the Echo RPC stack
//!
//! This crate implements the single-pass half of the Echo codec: variable
//! length integers, zig-zag signed integers, fixed-width integers, and
//! length-delimited framing, written to and read from abstract byte sinks
//! and sources.
//!
//! # Wire format
//!
//! Every field is a tag varint followed by a payload:
//! ```text
//! ┌──────────────────────────────┬─────────────────────────────┐
//! │ tag = varint(field_no << 3   │ varint | fixed32 | fixed64  │
//! │       | wire_type)           │ | varint(len) + len bytes   │
//! └──────────────────────────────┴─────────────────────────────┘
//! ```
//!
//! The resumable, chunk-at-a-time state machines live in `echo-stream`;
//! this crate assumes the bytes for one call are already in hand.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod decode;
pub mod encode;
pub mod error;
pub mod sink;
pub mod source;
pub mod tag;
pub mod varint;

pub use decode::{Delimited, FieldDecoder, WireField, WireValue};
pub use encode::FieldEncoder;
pub use error::WireError;
pub use sink::{ByteSink, CountingSink, SliceSink};
pub use source::{ByteSource, SliceSource};
pub use tag::{Tag, WireType, MAX_TAG_BYTES, MAX_VARINT_BYTES};
