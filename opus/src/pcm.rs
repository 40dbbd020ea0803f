//! Little-endian conversion between PCM bytes and 16-bit samples.

use crate::error::{CodecError, Result};

/// Serializes samples as s16le bytes.
pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        data.extend_from_slice(&sample.to_le_bytes());
    }
    data
}

/// Parses s16le bytes into samples. Odd lengths are rejected rather than
/// silently dropping the last byte.
pub fn bytes_to_samples(data: &[u8]) -> Result<Vec<i16>> {
    if data.len() % 2 != 0 {
        return Err(CodecError::OddByteLength(data.len()));
    }
    Ok(data
        .chunks_exact(2)
        .map(|bytes| i16::from_le_bytes([bytes[0], bytes[1]]))
        .collect())
}
