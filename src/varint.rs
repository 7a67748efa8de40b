//! Length-tagged variable-length integers for leaf counters.
//!
//! The two high bits of the first byte say how many bytes follow:
//!
//! | tag  | bytes | range                          |
//! |------|-------|--------------------------------|
//! | `00` | 1     | `0 ..64`                       |
//! | `01` | 2     | `64 ..16_384`                  |
//! | `10` | 3     | `16_384 ..4_194_304`           |
//! | `11` | 4     | `4_194_304 ..1_037_741_824`    |
//!
//! Everything from [`SATURATION_THRESHOLD`] up is written as `FF FF FF FF`,
//! which reads back as [`SATURATED_VALUE`]. Counters above the threshold are
//! therefore lossy.

use crate::error::{Error, MalformedKind, Result};

pub const ONE_BYTE_LIMIT: u64 = 64;
pub const TWO_BYTE_LIMIT: u64 = 16_384;
pub const THREE_BYTE_LIMIT: u64 = 4_194_304;
/// First value that no longer round-trips.
pub const SATURATION_THRESHOLD: u64 = 1_037_741_824;
/// What `FF FF FF FF` decodes to.
pub const SATURATED_VALUE: u64 = 0x3FFF_FFFF;

/// Maximum encoded width.
pub const MAX_VARINT_LEN: usize = 4;

const TAG_MASK: u8 = 0xC0;
const PAYLOAD_MASK: u8 = 0x3F;

/// Encode `value` into `buf`, returning the number of bytes written.
pub fn encode_varint(value: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    if value < ONE_BYTE_LIMIT {
        buf[0] = value as u8;
        1
    } else if value < TWO_BYTE_LIMIT {
        buf[0] = (value >> 8) as u8 | 0x40;
        buf[1] = value as u8;
        2
    } else if value < THREE_BYTE_LIMIT {
        buf[0] = (value >> 16) as u8 | 0x80;
        buf[1] = (value >> 8) as u8;
        buf[2] = value as u8;
        3
    } else if value < SATURATION_THRESHOLD {
        buf[0] = (value >> 24) as u8 | 0xC0;
        buf[1] = (value >> 16) as u8;
        buf[2] = (value >> 8) as u8;
        buf[3] = value as u8;
        4
    } else {
        *buf = [0xFF; MAX_VARINT_LEN];
        4
    }
}

/// Append the encoding of `value` to `out`.
pub fn write_varint(value: u64, out: &mut Vec<u8>) {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let n = encode_varint(value, &mut buf);
    out.extend_from_slice(&buf[..n]);
}

/// Decode a varint from the start of `buf`.
///
/// Returns `(value, bytes_consumed)`. A tag demanding more bytes than `buf`
/// holds is a truncated stream.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    let Some(&first) = buf.first() else {
        return Err(Error::Malformed(MalformedKind::Truncated { offset: 0, needed: 1 }));
    };
    let len = varint_len(first);
    if buf.len() < len {
        return Err(Error::Malformed(MalformedKind::Truncated {
            offset: 0,
            needed: len - buf.len(),
        }));
    }

    let value = buf[1..len]
        .iter()
        .fold((first & PAYLOAD_MASK) as u64, |acc, &b| (acc << 8) | b as u64);
    Ok((value, len))
}

/// Width of a varint, read from its first byte.
#[inline]
pub fn varint_len(first: u8) -> usize {
    ((first & TAG_MASK) >> 6) as usize + 1
}

/// Number of bytes `value` encodes to.
pub fn varint_size(value: u64) -> usize {
    match value {
        v if v < ONE_BYTE_LIMIT => 1,
        v if v < TWO_BYTE_LIMIT => 2,
        v if v < THREE_BYTE_LIMIT => 3,
        _ => 4,
    }
}
