//! Deterministic pseudo-embedding fallback.
//!
//! Stateless functions used whenever no real embedding model is reachable.
//! Identical input text always yields bit-identical vectors, and nothing
//! here can fail: this path is the error handler of last resort.

/// Produce a deterministic pseudo-embedding for `text`.
///
/// A rolling 31-multiplier hash over the character codes (wrapped to
/// 32-bit signed) seeds one sine sample per dimension; the result is
/// L2-normalized. The all-zero vector (empty text hashes to zero) is left
/// as zeros rather than divided by a zero norm.
pub fn pseudo_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let hash = rolling_hash(text);

    let mut vector: Vec<f32> = (0..dimensions)
        .map(|i| {
            let phase = (i as i64 * hash as i64) % 10_000;
            (phase as f32).sin() / 2.0
        })
        .collect();

    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }

    vector
}

/// Rolling hash over character codes, wrapped to 32-bit signed.
fn rolling_hash(text: &str) -> i32 {
    text.chars()
        .fold(0i32, |hash, ch| hash.wrapping_mul(31).wrapping_add(ch as i32))
}

/// Adjust a vector to exactly `dimensions` values.
///
/// Providers return different native dimensions; the persisted dimension
/// is fixed, so every embedding is zero-padded or truncated to it
/// immediately after the provider call.
pub fn fit_dimensions(mut vector: Vec<f32>, dimensions: usize) -> Vec<f32> {
    vector.resize(dimensions, 0.0);
    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = pseudo_embedding("the same text", 256);
        let b = pseudo_embedding("the same text", 256);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_texts_differ() {
        let a = pseudo_embedding("one text", 256);
        let b = pseudo_embedding("another text", 256);
        assert_ne!(a, b);
    }

    #[test]
    fn test_exact_dimension() {
        for dims in [1, 64, 1024] {
            assert_eq!(pseudo_embedding("abc", dims).len(), dims);
        }
    }

    #[test]
    fn test_unit_norm() {
        let vector = pseudo_embedding("normalize me", 512);
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_stays_zero() {
        let vector = pseudo_embedding("", 128);
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_fit_pads_with_zeros() {
        let fitted = fit_dimensions(vec![1.0, 2.0, 3.0], 5);
        assert_eq!(fitted, vec![1.0, 2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fit_truncates() {
        let fitted = fit_dimensions(vec![1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(fitted, vec![1.0, 2.0]);
    }
}
