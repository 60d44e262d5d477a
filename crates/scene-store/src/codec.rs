//! Band payload encoding: row-major little-endian `f32`.
//!
//! No-data is written as the scene's sentinel value. On decode both the
//! sentinel and any NaN become `None`.

use audit_common::{AuditError, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Sentinel written for no-data pixels unless a scene specifies another.
pub const DEFAULT_NODATA: f32 = -9999.0;

const F32_SIZE: usize = std::mem::size_of::<f32>();

/// Encode a pixel buffer.
pub fn encode_band(data: &[Option<f32>], nodata: f32) -> Bytes {
    let mut buf = BytesMut::with_capacity(data.len() * F32_SIZE);
    for value in data {
        buf.put_f32_le(value.unwrap_or(nodata));
    }
    buf.freeze()
}

/// Decode a pixel buffer of exactly `expected_len` values.
pub fn decode_band(bytes: &[u8], nodata: f32, expected_len: usize) -> Result<Vec<Option<f32>>> {
    if bytes.len() != expected_len * F32_SIZE {
        return Err(AuditError::Storage(format!(
            "band payload is {} bytes, expected {} ({} pixels)",
            bytes.len(),
            expected_len * F32_SIZE,
            expected_len
        )));
    }

    Ok(bytes
        .chunks_exact(F32_SIZE)
        .map(|chunk| {
            let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            if value.is_nan() || value == nodata {
                None
            } else {
                Some(value)
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodata_written_as_sentinel() {
        let bytes = encode_band(&[Some(0.25), None], DEFAULT_NODATA);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[0..4], &0.25f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &DEFAULT_NODATA.to_le_bytes());
    }

    #[test]
    fn test_nan_decodes_as_nodata() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&f32::NAN.to_le_bytes());
        raw.extend_from_slice(&0.5f32.to_le_bytes());
        raw.extend_from_slice(&(-1.0f32).to_le_bytes());

        let decoded = decode_band(&raw, -1.0, 3).unwrap();
        assert_eq!(decoded, vec![None, Some(0.5), None]);
    }

    #[test]
    fn test_truncated_payload_is_storage_error() {
        let err = decode_band(&[0u8; 6], DEFAULT_NODATA, 2).unwrap_err();
        assert!(matches!(err, AuditError::Storage(_)));
    }
}
