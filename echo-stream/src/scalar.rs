//! Single-frame scalar message builder
//!
//! The degenerate case of the streaming decoder for trivial control
//! messages: one scalar field, no nesting, so no frame stack at all.
//! Only the ring and a skip counter survive between calls. Delimited
//! fields (which such a message cannot carry as its payload) are
//! skipped, as are any fields before the first scalar.

use echo_wire::{ByteSource, Tag, WireType};

use crate::bridge::ChunkReader;
use crate::decode::{Halt, LimitedReader};
use crate::error::StreamError;
use crate::ring::{ByteRing, RING_CAPACITY};
use crate::schema::ScalarValue;

/// The first scalar field found in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScalarField {
    /// Field number from the tag
    pub field_number: u32,
    /// Raw wire value; zig-zag interpretation is up to the caller
    pub value: ScalarValue,
}

/// Resumable builder for a message with one scalar field
#[derive(Debug, Default)]
pub struct ScalarFieldBuilder {
    ring: ByteRing<RING_CAPACITY>,
    /// Delimited payload bytes still to discard
    skip: u32,
    failed: Option<StreamError>,
}

impl ScalarFieldBuilder {
    /// Create a builder at the start of a message
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon buffered state and start over
    pub fn reset(&mut self) {
        self.ring.clear();
        self.skip = 0;
        self.failed = None;
    }

    /// Feed the next chunk; returns the scalar once it fully arrives
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<ScalarField>, StreamError> {
        if let Some(err) = self.failed {
            return Err(err);
        }
        let Self { ring, skip, failed } = self;

        let mut reader = ChunkReader::new(ring, chunk);
        let result = run(skip, &mut reader);
        let result = match result {
            Ok(found) => reader.finish().map(|()| found),
            Err(err) => {
                drop(reader);
                Err(err)
            }
        };
        result.map_err(|err| {
            ring.clear();
            *failed = Some(err);
            err
        })
    }
}

fn run<const N: usize>(
    skip: &mut u32,
    reader: &mut ChunkReader<'_, N>,
) -> Result<Option<ScalarField>, StreamError> {
    loop {
        while *skip > 0 {
            let mut stage = [0u8; 32];
            let want = (*skip as usize).min(stage.len());
            let n = reader.pull(&mut stage[..want]);
            if n == 0 {
                return Ok(None);
            }
            *skip -= n as u32;
        }

        let mark = reader.mark();
        let mut lim = LimitedReader::new(reader, u32::MAX);
        match read_one(&mut lim, skip) {
            Err(Halt::Starved) => {
                reader.rewind(mark);
                return Ok(None);
            }
            Err(Halt::Fail(err)) => return Err(err),
            Ok(Some(field)) => return Ok(Some(field)),
            Ok(None) => continue, // delimited field queued for skipping
        }
    }
}

fn read_one<const N: usize>(
    lim: &mut LimitedReader<'_, '_, N>,
    skip: &mut u32,
) -> Result<Option<ScalarField>, Halt> {
    let raw_tag = lim.read_varint()?;
    let tag = Tag::unpack(raw_tag).map_err(|err| Halt::Fail(StreamError::Wire(err)))?;
    let value = match tag.wire_type {
        WireType::Varint => ScalarValue::Varint(lim.read_varint()?),
        WireType::Fixed32 => ScalarValue::Fixed32(lim.read_fixed32()?),
        WireType::Fixed64 => ScalarValue::Fixed64(lim.read_fixed64()?),
        WireType::Delimited => {
            let len = lim.read_varint()?;
            if len >= u64::from(u32::MAX) {
                return Err(Halt::Fail(StreamError::DelimitedMismatch));
            }
            *skip = len as u32;
            return Ok(None);
        }
    };
    Ok(Some(ScalarField {
        field_number: tag.field_number,
        value,
    }))
}
