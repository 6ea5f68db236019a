//! Test message types
//!
//! Hand-written stand-ins for generated code: a telemetry message with
//! every scalar kind, string/bytes/repeated fields, and one nested
//! message, implementing both schema traits.
//!
//! Wire schema:
//! - field 1: uptime_s, varint
//! - field 2: temp_dc, zig-zag varint
//! - field 3: flags, fixed32
//! - field 4: ticks, fixed64
//! - field 5: name, string (max 16)
//! - field 6: blob, bytes (max 32)
//! - field 7: samples, repeated varint u16 (max 4)
//! - field 8: gps, nested Position (lat/lon zig-zag, label string max 8)

use echo_wire::{FieldEncoder, SliceSink, WireType};
use heapless::Vec;

use crate::error::StreamError;
use crate::schema::{
    DecodeTarget, EncodeSource, FieldAction, FieldHandle, FieldPlan, ScalarKind, ScalarValue,
};

pub const H_NAME: FieldHandle = FieldHandle(1);
pub const H_BLOB: FieldHandle = FieldHandle(2);
pub const H_GPS: FieldHandle = FieldHandle(3);
pub const H_GPS_LABEL: FieldHandle = FieldHandle(4);

/// Frame stack bound for [`Telemetry`]
pub const DEPTH: usize = <Telemetry as DecodeTarget>::MAX_NESTING_DEPTH + 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub lat: i64,
    pub lon: i64,
    pub label: Vec<u8, 8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Telemetry {
    pub uptime_s: u64,
    pub temp_dc: i64,
    pub flags: u32,
    pub ticks: u64,
    pub name: Vec<u8, 16>,
    pub blob: Vec<u8, 32>,
    pub samples: Vec<u16, 4>,
    pub gps: Position,
    pub gps_set: bool,
}

impl Telemetry {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        uptime_s: u64,
        temp_dc: i64,
        flags: u32,
        ticks: u64,
        name: &str,
        blob: &[u8],
        samples: &[u16],
        lat: i64,
        lon: i64,
        label: &str,
    ) -> Self {
        let mut message = Telemetry {
            uptime_s,
            temp_dc,
            flags,
            ticks,
            gps_set: true,
            ..Telemetry::default()
        };
        message.name.extend_from_slice(name.as_bytes()).unwrap();
        message.blob.extend_from_slice(blob).unwrap();
        message.samples.extend_from_slice(samples).unwrap();
        message.gps.lat = lat;
        message.gps.lon = lon;
        message.gps.label.extend_from_slice(label.as_bytes()).unwrap();
        message
    }
}

impl DecodeTarget for Telemetry {
    const MAX_NESTING_DEPTH: usize = 2; // gps -> label

    fn classify(
        &self,
        path: &[FieldHandle],
        field_number: u32,
        wire_type: WireType,
    ) -> FieldAction {
        match path {
            [] => match (field_number, wire_type) {
                (1, WireType::Varint) => FieldAction::Scalar(ScalarKind::Varint),
                (2, WireType::Varint) => FieldAction::Scalar(ScalarKind::Svarint),
                (3, WireType::Fixed32) => FieldAction::Scalar(ScalarKind::Fixed32),
                (4, WireType::Fixed64) => FieldAction::Scalar(ScalarKind::Fixed64),
                (5, WireType::Delimited) => FieldAction::AppendString(H_NAME),
                (6, WireType::Delimited) => FieldAction::AppendBytes(H_BLOB),
                (7, WireType::Varint) => FieldAction::Scalar(ScalarKind::Varint),
                (8, WireType::Delimited) => FieldAction::Recurse(H_GPS),
                _ => FieldAction::Skip,
            },
            [H_GPS] => match (field_number, wire_type) {
                (1 | 2, WireType::Varint) => FieldAction::Scalar(ScalarKind::Svarint),
                (3, WireType::Delimited) => FieldAction::AppendString(H_GPS_LABEL),
                _ => FieldAction::Skip,
            },
            _ => FieldAction::Skip,
        }
    }

    fn set_scalar(
        &mut self,
        path: &[FieldHandle],
        field_number: u32,
        value: ScalarValue,
    ) -> Result<(), StreamError> {
        match (path, field_number, value) {
            ([], 1, ScalarValue::Varint(v)) => self.uptime_s = v,
            ([], 2, ScalarValue::Svarint(v)) => self.temp_dc = v,
            ([], 3, ScalarValue::Fixed32(v)) => self.flags = v,
            ([], 4, ScalarValue::Fixed64(v)) => self.ticks = v,
            ([], 7, ScalarValue::Varint(v)) => {
                let v = u16::try_from(v).map_err(|_| StreamError::ValueOutOfRange)?;
                self.samples.push(v).map_err(|_| StreamError::FieldCapacity)?;
            }
            ([H_GPS], 1, ScalarValue::Svarint(v)) => self.gps.lat = v,
            ([H_GPS], 2, ScalarValue::Svarint(v)) => self.gps.lon = v,
            _ => {}
        }
        Ok(())
    }

    fn append_bytes(&mut self, path: &[FieldHandle], chunk: &[u8]) -> Result<(), StreamError> {
        let target: &mut dyn ByteField = match path {
            [H_NAME] => &mut self.name,
            [H_BLOB] => &mut self.blob,
            [H_GPS, H_GPS_LABEL] => &mut self.gps.label,
            _ => return Ok(()),
        };
        target.append(chunk)
    }

    fn begin_delimited(&mut self, path: &[FieldHandle]) {
        match path {
            [H_NAME] => self.name.clear(),
            [H_BLOB] => self.blob.clear(),
            [H_GPS] => {
                self.gps = Position::default();
                self.gps_set = true;
            }
            [H_GPS, H_GPS_LABEL] => self.gps.label.clear(),
            _ => {}
        }
    }

    fn end_delimited(&mut self, path: &[FieldHandle]) -> Result<(), StreamError> {
        let utf8 = match path {
            [H_NAME] => &self.name[..],
            [H_GPS, H_GPS_LABEL] => &self.gps.label[..],
            _ => return Ok(()),
        };
        core::str::from_utf8(utf8)
            .map(|_| ())
            .map_err(|_| StreamError::InvalidUtf8)
    }
}

/// Capacity-erased append helper for the byte-backed fields
trait ByteField {
    fn append(&mut self, chunk: &[u8]) -> Result<(), StreamError>;
}

impl<const N: usize> ByteField for Vec<u8, N> {
    fn append(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        self.extend_from_slice(chunk)
            .map_err(|_| StreamError::FieldCapacity)
    }
}

impl EncodeSource for Telemetry {
    fn field_count(&self, path: &[FieldHandle]) -> usize {
        match path {
            [] => 7 + self.samples.len(),
            [H_GPS] => 3,
            _ => 0,
        }
    }

    fn field_plan(&self, path: &[FieldHandle], index: usize) -> Option<FieldPlan> {
        match path {
            [] => {
                let samples = self.samples.len();
                match index {
                    0 => Some(FieldPlan::Scalar {
                        field_number: 1,
                        value: ScalarValue::Varint(self.uptime_s),
                    }),
                    1 => Some(FieldPlan::Scalar {
                        field_number: 2,
                        value: ScalarValue::Svarint(self.temp_dc),
                    }),
                    2 => Some(FieldPlan::Scalar {
                        field_number: 3,
                        value: ScalarValue::Fixed32(self.flags),
                    }),
                    3 => Some(FieldPlan::Scalar {
                        field_number: 4,
                        value: ScalarValue::Fixed64(self.ticks),
                    }),
                    4 => (!self.name.is_empty()).then_some(FieldPlan::Str {
                        field_number: 5,
                        handle: H_NAME,
                    }),
                    5 => (!self.blob.is_empty()).then_some(FieldPlan::Bytes {
                        field_number: 6,
                        handle: H_BLOB,
                    }),
                    i if i >= 6 && i - 6 < samples => Some(FieldPlan::Scalar {
                        field_number: 7,
                        value: ScalarValue::Varint(u64::from(self.samples[i - 6])),
                    }),
                    i if i == 6 + samples => self.gps_set.then_some(FieldPlan::Message {
                        field_number: 8,
                        handle: H_GPS,
                    }),
                    _ => None,
                }
            }
            [H_GPS] => match index {
                0 => Some(FieldPlan::Scalar {
                    field_number: 1,
                    value: ScalarValue::Svarint(self.gps.lat),
                }),
                1 => Some(FieldPlan::Scalar {
                    field_number: 2,
                    value: ScalarValue::Svarint(self.gps.lon),
                }),
                2 => (!self.gps.label.is_empty()).then_some(FieldPlan::Str {
                    field_number: 3,
                    handle: H_GPS_LABEL,
                }),
                _ => None,
            },
            _ => None,
        }
    }

    fn byte_len(&self, path: &[FieldHandle]) -> usize {
        match path {
            [H_NAME] => self.name.len(),
            [H_BLOB] => self.blob.len(),
            [H_GPS, H_GPS_LABEL] => self.gps.label.len(),
            _ => 0,
        }
    }

    fn bytes_at(&self, path: &[FieldHandle], offset: usize, out: &mut [u8]) -> usize {
        let src: &[u8] = match path {
            [H_NAME] => &self.name,
            [H_BLOB] => &self.blob,
            [H_GPS, H_GPS_LABEL] => &self.gps.label,
            _ => return 0,
        };
        let n = out.len().min(src.len() - offset);
        out[..n].copy_from_slice(&src[offset..offset + n]);
        n
    }
}

/// A representative message touching every field kind
pub fn sample_telemetry() -> Telemetry {
    Telemetry::build(
        123_456,
        -275,
        0xdead_beef,
        u64::MAX,
        "sensor-a",
        &[1, 2, 3, 4, 5],
        &[7, 300, 65_535],
        -77_123_456_789,
        12_345,
        "nyc",
    )
}

/// Single-pass reference encoding via `echo-wire`, same field order as
/// the streaming plan
pub fn reference_encode(message: &Telemetry) -> std::vec::Vec<u8> {
    let mut buf = [0u8; 512];
    let mut sink = SliceSink::new(&mut buf);
    let mut enc = FieldEncoder::new(&mut sink);
    enc.write_varint_field(1, message.uptime_s).unwrap();
    enc.write_signed_varint_field(2, message.temp_dc).unwrap();
    enc.write_fixed32_field(3, message.flags).unwrap();
    enc.write_fixed64_field(4, message.ticks).unwrap();
    if !message.name.is_empty() {
        enc.write_bytes_field(5, &message.name).unwrap();
    }
    if !message.blob.is_empty() {
        enc.write_bytes_field(6, &message.blob).unwrap();
    }
    for &sample in &message.samples {
        enc.write_varint_field(7, u64::from(sample)).unwrap();
    }
    if message.gps_set {
        let mut scratch = [0u8; 64];
        enc.write_message_field(8, &mut scratch, |inner| {
            inner.write_signed_varint_field(1, message.gps.lat)?;
            inner.write_signed_varint_field(2, message.gps.lon)?;
            if !message.gps.label.is_empty() {
                inner.write_bytes_field(3, &message.gps.label)?;
            }
            Ok(())
        })
        .unwrap();
    }
    let n = sink.written();
    buf[..n].to_vec()
}
