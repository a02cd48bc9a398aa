//! Nearest-neighbor cluster classifier.
//!
//! Trained on the (vector, cluster label) pairs of one clustering run;
//! predicts the most likely cluster for a new vector by majority vote
//! among its nearest training vectors under cosine distance.

use std::collections::BTreeMap;

use cinerec_vecstore::dot;

use crate::assignment::ClusterAssignment;
use crate::error::ClusterError;

/// Default neighbor count for the majority vote.
pub const DEFAULT_NEIGHBORS: usize = 5;

/// KnnClassifier predicts a vector's cluster id.
///
/// A value of this type only exists after a successful [`train`], so
/// predicting with no training data is unrepresentable. The classifier is
/// tied to the clustering run it was trained on; retrain whenever vectors
/// or labels are rebuilt.
///
/// [`train`]: KnnClassifier::train
#[derive(Debug)]
pub struct KnnClassifier {
    vectors: Vec<Vec<f32>>,
    labels: Vec<usize>,
    k: usize,
}

impl KnnClassifier {
    /// Fit a classifier on normalized vectors and their cluster labels.
    ///
    /// Fails with `InsufficientData` on an empty training set and with
    /// `StaleArtifact` when vectors and labels disagree in length (the
    /// label set must be complete).
    pub fn train(
        vectors: &[Vec<f32>],
        assignment: &ClusterAssignment,
    ) -> Result<Self, ClusterError> {
        Self::train_with_k(vectors, assignment, DEFAULT_NEIGHBORS)
    }

    pub fn train_with_k(
        vectors: &[Vec<f32>],
        assignment: &ClusterAssignment,
        k: usize,
    ) -> Result<Self, ClusterError> {
        if vectors.is_empty() {
            return Err(ClusterError::InsufficientData { n: 0, k });
        }
        if vectors.len() != assignment.len() {
            return Err(ClusterError::StaleArtifact(format!(
                "{} vectors for {} labels",
                vectors.len(),
                assignment.len()
            )));
        }

        Ok(Self {
            vectors: vectors.to_vec(),
            labels: assignment.labels.clone(),
            k: if k == 0 { DEFAULT_NEIGHBORS } else { k },
        })
    }

    /// Majority label among the k nearest training vectors.
    ///
    /// Ties are broken by smallest aggregate distance, then by smallest
    /// label id, so predictions are fully deterministic.
    pub fn predict(&self, query: &[f32]) -> usize {
        // Cosine distance over normalized vectors.
        let mut dists: Vec<(f64, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (1.0 - dot(query, v), i))
            .collect();

        dists.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });
        dists.truncate(self.k.min(dists.len()));

        // label -> (votes, aggregate distance); BTreeMap keeps label order
        // for the final tie-break.
        let mut votes: BTreeMap<usize, (usize, f64)> = BTreeMap::new();
        for &(d, i) in &dists {
            let entry = votes.entry(self.labels[i]).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += d;
        }

        let mut best_label = 0;
        let mut best_votes = 0;
        let mut best_dist = f64::INFINITY;
        for (&label, &(count, agg)) in &votes {
            let better = count > best_votes
                || (count == best_votes && agg < best_dist);
            // Equal votes and equal aggregate distance keeps the smaller
            // label id, which iteration order already guarantees.
            if better {
                best_label = label;
                best_votes = count;
                best_dist = agg;
            }
        }
        best_label
    }

    /// Number of neighbors consulted per prediction.
    pub fn neighbors(&self) -> usize {
        self.k
    }

    /// Size of the training set.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(labels: Vec<usize>) -> ClusterAssignment {
        let k = labels.iter().max().map(|m| m + 1).unwrap_or(0);
        ClusterAssignment { labels, k }
    }

    /// Unit vectors on two distinct directions.
    fn training_set() -> (Vec<Vec<f32>>, ClusterAssignment) {
        let vectors = vec![
            vec![1.0, 0.0],
            vec![0.995, 0.0998],
            vec![0.995, -0.0998],
            vec![0.0, 1.0],
            vec![0.0998, 0.995],
            vec![-0.0998, 0.995],
        ];
        (vectors, assignment(vec![0, 0, 0, 1, 1, 1]))
    }

    #[test]
    fn test_predict_majority() {
        let (vectors, a) = training_set();
        let knn = KnnClassifier::train_with_k(&vectors, &a, 3).unwrap();
        assert_eq!(knn.predict(&[0.9998, 0.02]), 0);
        assert_eq!(knn.predict(&[0.02, 0.9998]), 1);
    }

    #[test]
    fn test_train_empty_fails() {
        let err = KnnClassifier::train(&[], &assignment(vec![])).unwrap_err();
        assert!(matches!(err, ClusterError::InsufficientData { .. }));
    }

    #[test]
    fn test_train_length_mismatch_is_stale() {
        let vectors = vec![vec![1.0f32, 0.0], vec![0.0f32, 1.0]];
        let err = KnnClassifier::train(&vectors, &assignment(vec![0])).unwrap_err();
        assert!(matches!(err, ClusterError::StaleArtifact(_)));
    }

    #[test]
    fn test_vote_tie_broken_by_aggregate_distance() {
        // k=2: one neighbor from each cluster; cluster 1's neighbor is
        // closer, so its aggregate distance wins the 1-1 vote tie.
        let vectors = vec![vec![1.0, 0.0], vec![0.6, 0.8]];
        let a = assignment(vec![0, 1]);
        let knn = KnnClassifier::train_with_k(&vectors, &a, 2).unwrap();
        assert_eq!(knn.predict(&[0.6, 0.8]), 1);
        assert_eq!(knn.predict(&[1.0, 0.0]), 0);
    }

    #[test]
    fn test_full_tie_prefers_smaller_label() {
        // Query equidistant from both training vectors.
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let a = assignment(vec![1, 0]);
        let knn = KnnClassifier::train_with_k(&vectors, &a, 2).unwrap();
        let q = [std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2];
        assert_eq!(knn.predict(&q), 0);
    }

    #[test]
    fn test_k_clamped_to_training_size() {
        let (vectors, a) = training_set();
        let knn = KnnClassifier::train_with_k(&vectors, &a, 50).unwrap();
        // All six neighbors vote; 3-3 split resolved by aggregate distance.
        let got = knn.predict(&[1.0, 0.0]);
        assert_eq!(got, 0);
    }
}
