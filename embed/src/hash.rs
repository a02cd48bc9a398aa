use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::embed::Embedder;
use crate::error::EmbedError;

/// Default output dimension, matching small sentence-embedding models.
pub const DEFAULT_DIM: usize = 384;

/// HashEmbedder is a local, deterministic token-hash embedder.
///
/// Each token is hashed into a bucket with a signed contribution, so texts
/// sharing vocabulary land near each other. It produces no semantic
/// understanding; its value is zero startup cost and full reproducibility,
/// which makes it the offline and test backend.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim: if dim == 0 { DEFAULT_DIM } else { dim },
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];

        let mut any = false;
        for token in tokenize(text) {
            any = true;
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            // Sign bit decorrelates colliding tokens.
            let sign = if h & (1 << 63) == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }

        // Whitespace-only input maps to a fixed unit basis vector.
        if !any {
            v[0] = 1.0;
            return v;
        }

        l2_normalize(&mut v);
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIM)
    }
}

#[async_trait::async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self.embed_one(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

/// Lowercase alphanumeric tokens.
pub(crate) fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// L2-normalize in place. Zero vectors are left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic() {
        let e = HashEmbedder::default();
        let a = e.embed("a robot learns to love").await.unwrap();
        let b = e.embed("a robot learns to love").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIM);
    }

    #[tokio::test]
    async fn test_normalized() {
        let e = HashEmbedder::new(64);
        let v = e.embed("an astronaut fights aliens").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_input_is_deterministic_unit_vector() {
        let e = HashEmbedder::new(8);
        let a = e.embed("").await.unwrap();
        let b = e.embed("   \t\n").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0], 1.0);
        assert!(a[1..].iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_shared_vocabulary_is_closer() {
        let e = HashEmbedder::default();
        let base = e.embed("astronaut fights aliens in space").await.unwrap();
        let near = e.embed("an astronaut fights space aliens").await.unwrap();
        let far = e.embed("a quiet love story in paris").await.unwrap();

        let dot = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() };
        assert!(dot(&base, &near) > dot(&base, &far));
    }

    #[tokio::test]
    async fn test_batch_order_preserved() {
        let e = HashEmbedder::new(32);
        let batch = e.embed_batch(&["one", "two"]).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], e.embed("one").await.unwrap());
        assert_eq!(batch[1], e.embed("two").await.unwrap());
    }

    #[test]
    fn test_tokenize() {
        let toks: Vec<String> = tokenize("Hello, World! 42").collect();
        assert_eq!(toks, vec!["hello", "world", "42"]);
    }
}
