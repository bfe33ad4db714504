//! Per-record zlib compression.
//!
//! A record with [`RecordFlags::COMPRESSED`](crate::header::RecordFlags::COMPRESSED)
//! stores its payload as:
//!
//! ```text
//! 0x00 inflated size (u32)
//! 0x04 zlib stream (data size - 4 bytes)
//! ```
//!
//! Each call gets its own output buffer, so inflation can run on any thread.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{EsmError, Result};
use crate::types::FormId;

/// Inflate a compressed record payload.
///
/// The inflated length must match the 4-byte prefix exactly and may not
/// exceed `limit`.
pub fn decompress_record(payload: &[u8], form_id: FormId, limit: usize) -> Result<Vec<u8>> {
    if payload.len() < 4 {
        return Err(EsmError::Decompression {
            form_id,
            message: format!("payload of {} bytes has no size prefix", payload.len()),
        });
    }
    let expected = (&payload[..4]).read_u32::<LittleEndian>()? as usize;
    if expected > limit {
        return Err(EsmError::MemoryLimitExceeded {
            requested: expected,
            limit,
        });
    }

    let data = &payload[4..];
    // One extra byte is enough to tell an overlong stream apart
    let mut decoder = ZlibDecoder::new(data).take(expected as u64 + 1);
    let mut inflated = Vec::with_capacity(expected);

    if let Err(e) = decoder.read_to_end(&mut inflated) {
        log::debug!("Zlib decompression failed for {form_id}: {e}");
        log::trace!(
            "First 16 bytes of data: {:02X?}",
            &data[..16.min(data.len())]
        );
        return Err(EsmError::Decompression {
            form_id,
            message: e.to_string(),
        });
    }

    if inflated.len() != expected {
        return Err(EsmError::DecompressionSizeMismatch {
            form_id,
            expected,
            actual: inflated.len(),
        });
    }

    log::trace!(
        "Inflated record {form_id}: {} -> {} bytes",
        data.len(),
        inflated.len()
    );
    Ok(inflated)
}

/// Build a compressed record payload (size prefix plus zlib stream).
pub fn compress_record(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2 + 8);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    let mut encoder = ZlibEncoder::new(out, Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip() {
        let original = b"EDID\x06\x00Sword\x00DATA\x04\x00\x07\x00\x00\x00".repeat(8);
        let compressed = compress_record(&original).unwrap();
        assert_eq!(&compressed[..4], &(original.len() as u32).to_le_bytes());

        let inflated = decompress_record(&compressed, FormId(1), usize::MAX).unwrap();
        assert_eq!(inflated, original);
    }

    #[test]
    fn test_prefix_too_large() {
        let mut compressed = compress_record(b"short").unwrap();
        compressed[..4].copy_from_slice(&9u32.to_le_bytes());

        let err = decompress_record(&compressed, FormId(2), usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            EsmError::DecompressionSizeMismatch {
                expected: 9,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_prefix_too_small() {
        let mut compressed = compress_record(b"longer payload").unwrap();
        compressed[..4].copy_from_slice(&3u32.to_le_bytes());

        let err = decompress_record(&compressed, FormId(3), usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            EsmError::DecompressionSizeMismatch {
                expected: 3,
                actual: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_limit() {
        let compressed = compress_record(&[0u8; 64]).unwrap();
        let err = decompress_record(&compressed, FormId(4), 32).unwrap_err();
        assert!(matches!(
            err,
            EsmError::MemoryLimitExceeded {
                requested: 64,
                limit: 32
            }
        ));
    }

    #[test]
    fn test_corrupt_stream() {
        let mut payload = 16u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&[0xFF; 12]);
        let err = decompress_record(&payload, FormId(5), usize::MAX).unwrap_err();
        assert!(matches!(err, EsmError::Decompression { .. }));
    }
}
