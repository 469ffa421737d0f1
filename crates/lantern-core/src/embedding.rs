//! Embedding vector codec.
//!
//! Payload layout: a little-endian `u32` element count followed by each
//! element as four little-endian bytes. The empty vector therefore encodes to
//! a four-byte payload, which keeps it distinct from an absent embedding
//! (SQL `NULL`, or a zero-length blob).

use crate::{LanternError, Result};

const HEADER_LEN: usize = std::mem::size_of::<u32>();
const ELEMENT_LEN: usize = std::mem::size_of::<f32>();

/// Encode a vector into its storage payload.
///
/// Vectors longer than `u32::MAX` elements are not supported.
pub fn encode(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + values.len() * ELEMENT_LEN);
    bytes.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode a storage payload. Bit-exact inverse of [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Vec<f32>> {
    let (header, body) = bytes.split_at_checked(HEADER_LEN).ok_or_else(|| {
        LanternError::SerializationFailed(format!(
            "embedding payload too short: {} bytes",
            bytes.len()
        ))
    })?;

    let count = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let expected = count.checked_mul(ELEMENT_LEN).ok_or_else(|| {
        LanternError::SerializationFailed(format!("embedding length overflow: {count}"))
    })?;
    if body.len() != expected {
        return Err(LanternError::SerializationFailed(format!(
            "embedding payload length mismatch: header says {count} values ({expected} bytes), got {} bytes",
            body.len()
        )));
    }

    Ok(body
        .chunks_exact(ELEMENT_LEN)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Encode an optional embedding; `None` stays absent.
pub(crate) fn encode_optional(values: Option<&[f32]>) -> Option<Vec<u8>> {
    values.map(encode)
}

/// Decode a stored blob. `NULL` and zero-length payloads both mean "no embedding".
pub(crate) fn decode_optional(bytes: Option<Vec<u8>>) -> Result<Option<Vec<f32>>> {
    match bytes {
        Some(b) if !b.is_empty() => decode(&b).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_vector_is_not_absent() {
        let bytes = encode(&[]);
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        assert_eq!(decode(&bytes).unwrap(), Vec::<f32>::new());
        assert_eq!(decode_optional(Some(bytes)).unwrap(), Some(vec![]));
    }

    #[test]
    fn test_absent_payloads() {
        assert_eq!(decode_optional(None).unwrap(), None);
        assert_eq!(decode_optional(Some(Vec::new())).unwrap(), None);
        assert_eq!(encode_optional(None), None);
    }

    #[test]
    fn test_known_values() {
        let values = [0.1f32, 0.2, -3.5];
        let bytes = encode(&values);
        assert_eq!(bytes.len(), 4 + 3 * 4);
        assert_eq!(&bytes[..4], &3u32.to_le_bytes());
        assert_eq!(decode(&bytes).unwrap(), values.to_vec());
    }

    #[test]
    fn test_truncated_payload_fails() {
        let mut bytes = encode(&[1.0, 2.0]);
        bytes.pop();
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, LanternError::SerializationFailed(_)));

        let err = decode(&[1, 0]).unwrap_err();
        assert!(matches!(err, LanternError::SerializationFailed(_)));
    }

    #[test]
    fn test_trailing_bytes_fail() {
        let mut bytes = encode(&[1.0]);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(decode(&bytes).is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip(values in prop::collection::vec(any::<f32>(), 0..256)) {
            let decoded = decode(&encode(&values)).unwrap();
            let original: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
            let round_tripped: Vec<u32> = decoded.iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(original, round_tripped);
        }

        #[test]
        fn prop_round_trip_finite(values in prop::collection::vec(-1.0e6f32..1.0e6, 0..64)) {
            prop_assert_eq!(decode(&encode(&values)).unwrap(), values);
        }
    }
}
