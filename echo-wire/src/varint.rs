//! Slice-level varint and zig-zag primitives
//!
//! These are the shared building blocks for both the single-pass
//! encoder/decoder in this crate and the resumable machines in
//! `echo-stream`: 7 payload bits per byte, low-to-high, with the top bit
//! set on every byte except the last.

use crate::tag::MAX_VARINT_BYTES;

/// Number of bytes `value` occupies as a varint (1-10)
pub const fn encoded_len(value: u64) -> usize {
    // 1 + floor(bits / 7), with 0 taking one byte
    match value {
        0 => 1,
        v => (64 - v.leading_zeros() as usize).div_ceil(7),
    }
}

/// Encode `value` into the front of `out`, returning the bytes written
///
/// `out` must have room for `encoded_len(value)` bytes; callers size their
/// buffers with [`MAX_VARINT_BYTES`].
pub fn encode(value: u64, out: &mut [u8]) -> usize {
    let mut v = value;
    let mut i = 0;
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out[i] = byte;
            return i + 1;
        }
        out[i] = byte | 0x80;
        i += 1;
    }
}

/// Decode a varint from the front of `bytes`
///
/// Returns the value and the bytes consumed, or `None` when the slice ends
/// before a terminating byte. A value that does not terminate within 10
/// bytes is also reported as `None`; the caller distinguishes starvation
/// from overflow by checking whether 10 bytes were available.
pub fn decode(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in bytes.iter().enumerate().take(MAX_VARINT_BYTES) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

/// Zig-zag a signed value so small magnitudes stay short on the wire
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Invert [`zigzag_encode`]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
