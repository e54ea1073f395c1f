//! Embedding provider: `text -> vector[D]`.
//!
//! This system does not train or ship a neural embedding model (that is an
//! explicit non-goal); what every other component actually depends on is the
//! *contract* — fixed dimension, determinism, unit norm, and a well-behaved
//! cosine — so the provider here is a deterministic feature-hashing
//! embedding. Swapping it for a real model later only touches this module:
//! every caller goes through [`embed`] and [`cosine`].

use crate::error::{Error, Result};

/// Fixed, process-wide embedding dimension.
pub const DIMENSION: usize = 256;

/// Embed `text` into a unit-norm vector of length [`DIMENSION`].
///
/// Deterministic: equal input yields bitwise-equal output. Implemented as
/// n-gram feature hashing (character trigrams) folded into `DIMENSION`
/// buckets, then L2-normalized. Safe to call concurrently from many readers;
/// it touches no shared state.
#[must_use]
pub fn embed(text: &str) -> Vec<f32> {
    let normalized = text.to_lowercase();
    let mut buckets = vec![0f32; DIMENSION];

    if normalized.trim().is_empty() {
        // Zero text still yields a deterministic, valid vector: a single
        // fixed bucket rather than an all-zero (unnormalizable) vector.
        buckets[0] = 1.0;
        return buckets;
    }

    let chars: Vec<char> = normalized.chars().collect();
    let ngram_len = 3usize;
    let windows: Vec<&[char]> = if chars.len() < ngram_len {
        vec![chars.as_slice()]
    } else {
        chars.windows(ngram_len).collect()
    };

    for window in windows {
        let gram: String = window.iter().collect();
        let hash = fnv1a(gram.as_bytes());
        let bucket = (hash % DIMENSION as u64) as usize;
        // Sign derived from a second hash bit keeps random-projection-like
        // behavior instead of every feature pushing buckets positive.
        let sign = if (hash >> 7) & 1 == 0 { 1.0 } else { -1.0 };
        buckets[bucket] += sign;
    }

    // Also fold in whole-word hashes so word-level similarity survives
    // character-level noise (short problem/error strings benefit most).
    for word in normalized.split_whitespace() {
        let hash = fnv1a(word.as_bytes());
        let bucket = (hash % DIMENSION as u64) as usize;
        buckets[bucket] += 1.5;
    }

    normalize(&mut buckets);
    buckets
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    } else if let Some(first) = v.first_mut() {
        *first = 1.0;
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity between two vectors of equal length.
///
/// # Errors
///
/// Returns [`Error::SchemaMismatch`] if `a.len() != b.len()`.
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::SchemaMismatch(format!(
            "dimension mismatch: {} != {}",
            a.len(),
            b.len()
        )));
    }

    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return Ok(0.0);
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_is_deterministic() {
        assert_eq!(embed("oauth refresh token"), embed("oauth refresh token"));
    }

    #[test]
    fn embed_has_fixed_dimension() {
        assert_eq!(embed("anything").len(), DIMENSION);
        assert_eq!(embed("").len(), DIMENSION);
    }

    #[test]
    fn embed_is_unit_norm() {
        let v = embed("retry with exponential backoff");
        let norm = l2_norm(&v);
        assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
    }

    #[test]
    fn cosine_self_similarity_is_one() {
        let v = embed("database connection pool exhaustion");
        let sim = cosine(&v, &v).expect("equal length");
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_is_symmetric() {
        let a = embed("foo");
        let b = embed("bar");
        assert!((cosine(&a, &b).unwrap() - cosine(&b, &a).unwrap()).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_negated_vector_is_minus_one() {
        let a = vec![0.6, 0.8];
        let neg: Vec<f32> = a.iter().map(|x| -x).collect();
        let sim = cosine(&a, &neg).unwrap();
        assert!((sim + 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        let a = vec![1.0, 0.0, 0.0];
        let zero = vec![0.0, 0.0, 0.0];
        assert_eq!(cosine(&a, &zero).unwrap(), 0.0);
    }

    #[test]
    fn cosine_dimension_mismatch_errors() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let err = cosine(&a, &b).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn different_texts_are_not_identical_vectors() {
        assert_ne!(embed("login bug"), embed("logout bug"));
    }
}
