/// Hit is a single result from a similarity search, addressed by corpus
/// position.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Ordinal index of the matched document.
    pub index: usize,

    /// Cosine similarity to the query. Higher is more similar.
    pub score: f64,
}

/// Cosine similarity of two pre-normalized vectors: a plain dot product
/// with f64 accumulation.
///
/// Inputs are expected L2-normalized at creation (the embedder contract),
/// so no magnitude correction is applied here.
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    let len = a.len().min(b.len());
    let mut sum = 0.0f64;
    for i in 0..len {
        sum += a[i] as f64 * b[i] as f64;
    }
    sum
}

/// Pairwise cosine similarity over a set of normalized vectors.
///
/// The matrix is symmetric with a unit diagonal; only the upper triangle
/// is computed and mirrored.
pub fn similarity_matrix(vectors: &[Vec<f32>]) -> Vec<Vec<f64>> {
    let n = vectors.len();
    let mut m = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        m[i][i] = 1.0;
        for j in (i + 1)..n {
            let s = dot(&vectors[i], &vectors[j]);
            m[i][j] = s;
            m[j][i] = s;
        }
    }
    m
}

/// Return the `k` most similar vectors to `query`, score descending, ties
/// broken by ascending index for determinism.
///
/// `k` is clamped to the number of vectors; an empty vector set yields an
/// empty result, never an error.
pub fn top_k(query: &[f32], vectors: &[Vec<f32>], k: usize) -> Vec<Hit> {
    if vectors.is_empty() || k == 0 {
        return vec![];
    }

    let mut hits: Vec<Hit> = vectors
        .iter()
        .enumerate()
        .map(|(index, v)| Hit {
            index,
            score: dot(query, v),
        })
        .collect();

    sort_hits(&mut hits);
    hits.truncate(k.min(hits.len()));
    hits
}

/// Sort hits by descending score, ascending index on equal scores.
pub fn sort_hits(hits: &mut [Hit]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.index.cmp(&b.index))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_identical_is_one() {
        let v = vec![0.6f32, 0.8, 0.0];
        assert!((dot(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dot_orthogonal_is_zero() {
        assert_eq!(dot(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_similarity_matrix_shape() {
        let vectors = vec![
            vec![1.0f32, 0.0],
            vec![0.0f32, 1.0],
            vec![0.6f32, 0.8],
        ];
        let m = similarity_matrix(&vectors);
        assert_eq!(m.len(), 3);
        for (i, row) in m.iter().enumerate() {
            assert_eq!(row.len(), 3);
            assert!((row[i] - 1.0).abs() < 1e-9);
        }
        // Symmetry.
        assert_eq!(m[0][2], m[2][0]);
        assert!((m[0][2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_top_k_ordering() {
        let vectors = vec![
            vec![0.0f32, 1.0],
            vec![1.0f32, 0.0],
            vec![0.8f32, 0.6],
        ];
        let hits = top_k(&[1.0, 0.0], &vectors, 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].index, 1);
        assert_eq!(hits[1].index, 2);
        assert_eq!(hits[2].index, 0);
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[test]
    fn test_top_k_tie_broken_by_index() {
        let vectors = vec![
            vec![1.0f32, 0.0],
            vec![1.0f32, 0.0],
            vec![1.0f32, 0.0],
        ];
        let hits = top_k(&[1.0, 0.0], &vectors, 3);
        let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_top_k_clamps_k() {
        let vectors = vec![vec![1.0f32, 0.0], vec![0.0f32, 1.0]];
        let hits = top_k(&[1.0, 0.0], &vectors, 100);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_top_k_empty_corpus() {
        let hits = top_k(&[1.0, 0.0], &[], 5);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_top_k_scores_in_range() {
        let vectors = vec![
            vec![1.0f32, 0.0],
            vec![-1.0f32, 0.0],
            vec![0.0f32, 1.0],
        ];
        for h in top_k(&[1.0, 0.0], &vectors, 3) {
            assert!(h.score >= -1.0 - 1e-9 && h.score <= 1.0 + 1e-9);
        }
    }
}
