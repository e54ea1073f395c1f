//! Binary encoding of embedding vectors for storage as SQLite `BLOB` columns.
//!
//! A vector of `D` `f32`s is stored as a `4 * D`-byte blob in the platform's
//! native byte order (the store is single-host, so there is no cross-host
//! portability concern to pay for). Callers that hit a blob of the wrong
//! length treat the row as corrupt and skip it rather than failing the whole
//! query — see [`decode`].

use crate::embedding::DIMENSION;

/// Encode a vector into its on-disk blob representation.
#[must_use]
pub fn encode(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_ne_bytes());
    }
    bytes
}

/// Decode a blob back into a vector, returning `None` if its length isn't a
/// multiple of 4 bytes or doesn't match [`DIMENSION`].
///
/// Per §4.1/§8.2, a short or long blob is a skip signal for the caller, never
/// a hard failure of the surrounding query.
#[must_use]
pub fn decode(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() != DIMENSION * 4 {
        return None;
    }
    let mut vector = Vec::with_capacity(DIMENSION);
    for chunk in blob.chunks_exact(4) {
        let bytes: [u8; 4] = chunk.try_into().ok()?;
        vector.push(f32::from_ne_bytes(bytes));
    }
    Some(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_valid_vector() {
        let original = crate::embedding::embed("round trip me");
        let blob = encode(&original);
        assert_eq!(blob.len(), DIMENSION * 4);
        let decoded = decode(&blob).expect("correct length decodes");
        assert_eq!(decoded, original);
    }

    #[test]
    fn rejects_short_blob() {
        assert!(decode(&[0u8; 4]).is_none());
    }

    #[test]
    fn rejects_blob_not_multiple_of_four() {
        let mut blob = encode(&vec![0f32; DIMENSION]);
        blob.push(0);
        assert!(decode(&blob).is_none());
    }
}
