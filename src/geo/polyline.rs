//! Encoded polyline decoding.
//!
//! Each point is stored as two variable-length signed deltas (latitude, then
//! longitude) against the previous point. A value is split into 5-bit
//! chunks, least significant first; every chunk is offset by 63 to land in
//! printable ASCII and all but the last carry the 0x20 continuation bit.
//! The sign lives in the lowest bit (zig-zag). Decoded integers are scaled
//! by 1e5 to recover degrees.

use super::errors::GeoError;
use super::types::{Coordinate, RoutePath};

/// Fixed-point scale of the encoding (five decimal places).
const PRECISION: f64 = 1e5;

/// Offset added to every 5-bit chunk.
const CHAR_OFFSET: u8 = 63;

/// Continuation flag inside a chunk.
const CONTINUATION_BIT: u64 = 0x20;

/// Payload mask of a chunk.
const CHUNK_MASK: u64 = 0x1f;

/// Longest chunk run accepted for one value. Six chunks already cover 30
/// bits, more than any ±180° delta needs.
const MAX_CHUNKS: u32 = 7;

/// Decode an encoded polyline into an ordered path.
///
/// Empty input yields an empty path. Input that stops inside a value, or
/// that contains bytes outside `'?'..='~'`, is rejected rather than decoded
/// into garbage.
pub fn decode_polyline(encoded: &str) -> Result<RoutePath, GeoError> {
    let bytes = encoded.as_bytes();
    let mut index = 0usize;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::new();

    while index < bytes.len() {
        lat += next_delta(bytes, &mut index)?;
        lng += next_delta(bytes, &mut index)?;

        points.push(Coordinate {
            latitude: lat as f64 / PRECISION,
            longitude: lng as f64 / PRECISION,
        });
    }

    Ok(RoutePath::new(points))
}

/// Read one zig-zag encoded delta starting at `*index`, advancing it.
fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64, GeoError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&raw) = bytes.get(*index) else {
            return Err(GeoError::MalformedPolyline {
                position: *index,
                reason: "input ends inside a value".into(),
            });
        };

        if !(CHAR_OFFSET..=b'~').contains(&raw) {
            return Err(GeoError::MalformedPolyline {
                position: *index,
                reason: format!("byte 0x{raw:02x} is outside the encoding alphabet"),
            });
        }

        if shift / 5 >= MAX_CHUNKS {
            return Err(GeoError::MalformedPolyline {
                position: *index,
                reason: "value has too many chunks".into(),
            });
        }

        let chunk = u64::from(raw - CHAR_OFFSET);
        *index += 1;
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;

        if chunk < CONTINUATION_BIT {
            break;
        }
    }

    // Zig-zag: LSB set means the remaining bits are the one's complement.
    let value = (result >> 1) as i64;
    Ok(if result & 1 == 1 { !value } else { value })
}
