//! Persisted artifact set for one corpus snapshot.
//!
//! Vectors go to a compact binary file, cluster labels to a `;`-delimited
//! table, both addressed by corpus position. Loading re-validates every
//! artifact against the corpus it is paired with; a mismatch is a
//! `StaleArtifact` error, never a silent misprediction.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use cinerec_cluster::{load_assignment, save_assignment};
use cinerec_corpus::Corpus;
use cinerec_embed::Embedder;
use cinerec_vecstore::{load_vectors, save_vectors};

use crate::error::RecError;
use crate::recommender::Recommender;
use crate::types::BlendStrategy;

/// Dense vector store, one vector per document in corpus order.
pub const VECTORS_FILE: &str = "vectors.bin";
/// Cluster assignment table, one row per document in corpus order.
pub const CLUSTERS_FILE: &str = "cluster_labels.csv";

impl Recommender {
    /// Write the vector store (and cluster assignment, when present) to
    /// `dir`, creating it if needed.
    pub fn save_artifacts(&self, dir: impl AsRef<Path>) -> Result<(), RecError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| RecError::Io(e.to_string()))?;

        let mut f = fs::File::create(dir.join(VECTORS_FILE))
            .map_err(|e| RecError::Io(e.to_string()))?;
        save_vectors(self.vectors(), &mut f)?;

        if let Some(assignment) = self.assignment() {
            let titles: Vec<&str> = self.corpus().iter().map(|m| m.title.as_str()).collect();
            let mut f = fs::File::create(dir.join(CLUSTERS_FILE))
                .map_err(|e| RecError::Io(e.to_string()))?;
            save_assignment(assignment, &titles, &mut f)?;
        }

        info!(dir = %dir.display(), "saved artifacts");
        Ok(())
    }

    /// Rebuild a recommender from artifacts previously written by
    /// [`save_artifacts`], for the given corpus.
    ///
    /// Vector count and cluster-label alignment (count and titles) are
    /// checked against the corpus; any disagreement fails with
    /// `StaleArtifact`. A missing cluster file just means no cluster
    /// boosting.
    ///
    /// [`save_artifacts`]: Recommender::save_artifacts
    pub fn load_artifacts(
        dir: impl AsRef<Path>,
        corpus: Corpus,
        embedder: Arc<dyn Embedder>,
        blend: BlendStrategy,
    ) -> Result<Self, RecError> {
        let dir = dir.as_ref();

        let mut f = fs::File::open(dir.join(VECTORS_FILE))
            .map_err(|e| RecError::Io(format!("{}: {e}", dir.join(VECTORS_FILE).display())))?;
        let vectors = load_vectors(&mut f)?;

        let clusters_path = dir.join(CLUSTERS_FILE);
        let assignment = if clusters_path.exists() {
            let mut f =
                fs::File::open(&clusters_path).map_err(|e| RecError::Io(e.to_string()))?;
            let (titles, assignment) = load_assignment(&mut f)?;

            if titles.len() != corpus.len() {
                return Err(RecError::StaleArtifact(format!(
                    "assignment has {} rows for {} documents",
                    titles.len(),
                    corpus.len()
                )));
            }
            for (i, (stored, movie)) in titles.iter().zip(corpus.iter()).enumerate() {
                if *stored != movie.title {
                    return Err(RecError::StaleArtifact(format!(
                        "assignment row {i} is '{stored}' but corpus has '{}'",
                        movie.title
                    )));
                }
            }
            Some(assignment)
        } else {
            None
        };

        Recommender::from_parts(
            corpus,
            vectors,
            embedder,
            assignment,
            cinerec_cluster::knn::DEFAULT_NEIGHBORS,
            blend,
        )
    }
}
