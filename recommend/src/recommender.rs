use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use cinerec_cluster::{ClusterAssignment, KMeans, KnnClassifier, default_cluster_count};
use cinerec_corpus::Corpus;
use cinerec_embed::Embedder;
use cinerec_vecstore::{Hit, similarity_matrix, sort_hits, top_k};

use crate::blend::blend;
use crate::error::RecError;
use crate::types::{BlendStrategy, Recommendation};

/// Over-fetch floor when cluster filtering will prune candidates.
const MIN_POOL: usize = 20;
/// Over-fetch multiplier applied to the requested result count.
const POOL_FACTOR: usize = 5;
/// Synopsis excerpt length in characters.
const EXCERPT_CHARS: usize = 100;

/// Options for [`Recommender::build`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Run clustering and train the cluster classifier.
    pub cluster: bool,

    /// Cluster count; `None` selects a default from the corpus size.
    pub k: Option<usize>,

    /// Seed for clustering (and any other seeded stage).
    pub seed: u64,

    /// Neighbor count for the cluster classifier.
    pub knn_neighbors: usize,

    /// How cluster agreement reshapes query rankings.
    pub blend: BlendStrategy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            cluster: true,
            k: None,
            seed: cinerec_cluster::kmeans::DEFAULT_SEED,
            knn_neighbors: cinerec_cluster::knn::DEFAULT_NEIGHBORS,
            blend: BlendStrategy::default(),
        }
    }
}

/// Clustering artifacts from one run. Assignment and classifier always
/// come from the same fit; they are never mixed across runs.
pub(crate) struct ClusterModel {
    pub(crate) assignment: ClusterAssignment,
    pub(crate) classifier: KnnClassifier,
}

/// Recommender answers "movies like title T" and "movies matching text Q"
/// over one corpus snapshot.
///
/// It is immutable once built and safe to share across concurrent query
/// evaluations. Rebuilding (new corpus, re-embedding, re-clustering)
/// means building a fresh `Recommender` and swapping it in; in-flight
/// queries keep the snapshot they started with.
pub struct Recommender {
    corpus: Corpus,
    vectors: Vec<Vec<f32>>,
    embedder: Arc<dyn Embedder>,
    cluster: Option<ClusterModel>,
    blend: BlendStrategy,
    // Built on first title query, cached for the snapshot's lifetime.
    sim_matrix: RwLock<Option<Arc<Vec<Vec<f64>>>>>,
}

impl std::fmt::Debug for Recommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender").finish_non_exhaustive()
    }
}

impl Recommender {
    /// Embed the corpus and assemble the full artifact set.
    ///
    /// The embedder handle is constructed once by the caller and shared;
    /// this function never constructs a backend itself.
    pub async fn build(
        corpus: Corpus,
        embedder: Arc<dyn Embedder>,
        opts: BuildOptions,
    ) -> Result<Self, RecError> {
        let texts = corpus.synopses();
        info!(documents = texts.len(), "embedding corpus");
        let vectors = embedder.embed_batch(&texts).await?;

        if vectors.len() != corpus.len() {
            return Err(RecError::StaleArtifact(format!(
                "{} vectors for {} documents",
                vectors.len(),
                corpus.len()
            )));
        }

        let cluster = if opts.cluster && !corpus.is_empty() {
            let k = opts.k.unwrap_or_else(|| default_cluster_count(corpus.len()));
            info!(k, seed = opts.seed, "clustering corpus");
            let assignment = KMeans::new(k).with_seed(opts.seed).fit(&vectors)?;
            let classifier =
                KnnClassifier::train_with_k(&vectors, &assignment, opts.knn_neighbors)?;
            Some(ClusterModel {
                assignment,
                classifier,
            })
        } else {
            None
        };

        Ok(Self {
            corpus,
            vectors,
            embedder,
            cluster,
            blend: opts.blend,
            sim_matrix: RwLock::new(None),
        })
    }

    /// Assemble a recommender from precomputed artifacts, validating that
    /// they all describe the same corpus snapshot.
    pub(crate) fn from_parts(
        corpus: Corpus,
        vectors: Vec<Vec<f32>>,
        embedder: Arc<dyn Embedder>,
        assignment: Option<ClusterAssignment>,
        knn_neighbors: usize,
        blend: BlendStrategy,
    ) -> Result<Self, RecError> {
        if vectors.len() != corpus.len() {
            return Err(RecError::StaleArtifact(format!(
                "{} vectors for {} documents",
                vectors.len(),
                corpus.len()
            )));
        }

        let cluster = match assignment {
            Some(assignment) => {
                if assignment.len() != corpus.len() {
                    return Err(RecError::StaleArtifact(format!(
                        "{} cluster labels for {} documents",
                        assignment.len(),
                        corpus.len()
                    )));
                }
                let classifier =
                    KnnClassifier::train_with_k(&vectors, &assignment, knn_neighbors)?;
                Some(ClusterModel {
                    assignment,
                    classifier,
                })
            }
            None => None,
        };

        Ok(Self {
            corpus,
            vectors,
            embedder,
            cluster,
            blend,
            sim_matrix: RwLock::new(None),
        })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub(crate) fn assignment(&self) -> Option<&ClusterAssignment> {
        self.cluster.as_ref().map(|c| &c.assignment)
    }

    /// Movies most similar to an existing title.
    ///
    /// Fails with `TitleNotFound` when no exact match exists; there is no
    /// fuzzy fallback. The queried movie itself is excluded from the
    /// results.
    pub fn recommend_by_title(
        &self,
        title: &str,
        top_k: usize,
    ) -> Result<Vec<Recommendation>, RecError> {
        let movie_idx = self
            .corpus
            .index_of_title(title)
            .ok_or_else(|| RecError::TitleNotFound(title.to_string()))?;

        let matrix = self.similarity();
        let mut hits: Vec<Hit> = matrix[movie_idx]
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != movie_idx)
            .map(|(index, &score)| Hit { index, score })
            .collect();
        sort_hits(&mut hits);
        hits.truncate(top_k.min(hits.len()));

        Ok(self.to_recommendations(&hits, false))
    }

    /// Movies most similar to free-text `query`.
    ///
    /// With `use_cluster_filter`, candidates are over-fetched, the query
    /// is classified into a cluster, and the configured blend strategy
    /// reshapes the ranking. A missing classifier degrades to the plain
    /// similarity ranking; it never aborts the query.
    ///
    /// An empty corpus legitimately yields an empty list.
    pub async fn recommend_by_query(
        &self,
        query: &str,
        top_n: usize,
        use_cluster_filter: bool,
    ) -> Result<Vec<Recommendation>, RecError> {
        if self.corpus.is_empty() || top_n == 0 {
            return Ok(vec![]);
        }

        let query_vec = self.embedder.embed(query).await?;

        let hits = if use_cluster_filter {
            match &self.cluster {
                Some(model) => {
                    let pool = (top_n * POOL_FACTOR).max(MIN_POOL).min(self.corpus.len());
                    let candidates = top_k(&query_vec, &self.vectors, pool);
                    let predicted = model.classifier.predict(&query_vec);
                    debug!(cluster = predicted, pool = candidates.len(), "cluster blend");
                    blend(
                        &candidates,
                        &model.assignment.labels,
                        predicted,
                        top_n,
                        self.blend,
                    )
                }
                None => {
                    warn!("cluster filter requested but no classifier is trained; using raw ranking");
                    top_k(&query_vec, &self.vectors, top_n)
                }
            }
        } else {
            top_k(&query_vec, &self.vectors, top_n)
        };

        Ok(self.to_recommendations(&hits, true))
    }

    /// Pairwise similarity over the corpus, built lazily on first use and
    /// cached for this snapshot.
    pub fn similarity(&self) -> Arc<Vec<Vec<f64>>> {
        if let Some(m) = self.sim_matrix.read().unwrap().as_ref() {
            return Arc::clone(m);
        }

        let mut guard = self.sim_matrix.write().unwrap();
        // Another query may have built it while we waited for the lock.
        if let Some(m) = guard.as_ref() {
            return Arc::clone(m);
        }
        debug!(documents = self.vectors.len(), "building similarity matrix");
        let m = Arc::new(similarity_matrix(&self.vectors));
        *guard = Some(Arc::clone(&m));
        m
    }

    fn to_recommendations(&self, hits: &[Hit], with_excerpt: bool) -> Vec<Recommendation> {
        hits.iter()
            .enumerate()
            .filter_map(|(rank, hit)| {
                let movie = self.corpus.get(hit.index)?;
                Some(Recommendation {
                    rank: rank + 1,
                    index: hit.index,
                    title: movie.title.clone(),
                    similarity: hit.score,
                    excerpt: with_excerpt.then(|| excerpt(&movie.synopsis)),
                    genres: movie.genres.clone(),
                })
            })
            .collect()
    }
}

/// First `EXCERPT_CHARS` characters of a synopsis, char-boundary safe,
/// with an ellipsis when truncated.
fn excerpt(synopsis: &str) -> String {
    let mut s: String = synopsis.chars().take(EXCERPT_CHARS).collect();
    if synopsis.chars().count() > EXCERPT_CHARS {
        s.push_str("...");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinerec_corpus::Movie;
    use cinerec_embed::EmbedError;
    use std::collections::HashMap;

    /// Stub embedder with pinned geometry: known texts map to fixed unit
    /// vectors, everything else to a far-away basis vector.
    struct StubEmbedder {
        map: HashMap<String, Vec<f32>>,
        dim: usize,
    }

    impl StubEmbedder {
        fn new(entries: &[(&str, Vec<f32>)]) -> Self {
            let dim = entries.first().map(|(_, v)| v.len()).unwrap_or(2);
            Self {
                map: entries
                    .iter()
                    .map(|(t, v)| (t.to_string(), v.clone()))
                    .collect(),
                dim,
            }
        }
    }

    #[async_trait::async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            Ok(self.map.get(text).cloned().unwrap_or_else(|| {
                let mut v = vec![0.0; self.dim];
                v[self.dim - 1] = 1.0;
                v
            }))
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimension(&self) -> usize {
            self.dim
        }
    }

    fn movie(title: &str, synopsis: &str, genres: &[&str]) -> Movie {
        Movie {
            title: title.to_string(),
            synopsis: synopsis.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            year: None,
        }
    }

    /// Three movies: two romances near each other, one space movie apart.
    /// The query "space battle" lands next to the astronaut document.
    fn three_movie_setup() -> (Corpus, Arc<dyn Embedder>) {
        let corpus = Corpus::new(vec![
            movie("Robot Heart", "a robot learns to love", &["Sci-Fi", "Romance"]),
            movie("Paris Nights", "a love story set in paris", &["Romance"]),
            movie("Star Marine", "an astronaut fights aliens", &["Sci-Fi", "Action"]),
        ]);
        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder::new(&[
            ("a robot learns to love", vec![0.9487f32, 0.3162, 0.0]),
            ("a love story set in paris", vec![1.0f32, 0.0, 0.0]),
            ("an astronaut fights aliens", vec![0.0f32, 1.0, 0.0]),
            ("space battle", vec![0.1961f32, 0.9806, 0.0]),
        ]));
        (corpus, embedder)
    }

    fn no_cluster_opts() -> BuildOptions {
        BuildOptions {
            cluster: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_query_end_to_end() {
        let (corpus, embedder) = three_movie_setup();
        let rec = Recommender::build(corpus, embedder, no_cluster_opts())
            .await
            .unwrap();

        let results = rec.recommend_by_query("space battle", 2, false).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Star Marine");
        assert!(results[0].similarity >= results[1].similarity);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
        assert!(results[0].excerpt.is_some());
    }

    #[tokio::test]
    async fn test_title_not_found() {
        let (corpus, embedder) = three_movie_setup();
        let rec = Recommender::build(corpus, embedder, no_cluster_opts())
            .await
            .unwrap();

        let err = rec.recommend_by_title("No Such Film", 5).unwrap_err();
        assert!(matches!(err, RecError::TitleNotFound(_)));
    }

    #[tokio::test]
    async fn test_title_recommendation_excludes_self() {
        let (corpus, embedder) = three_movie_setup();
        let rec = Recommender::build(corpus, embedder, no_cluster_opts())
            .await
            .unwrap();

        let results = rec.recommend_by_title("Paris Nights", 5).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.title != "Paris Nights"));
        // Robot Heart shares the romance direction.
        assert_eq!(results[0].title, "Robot Heart");
        assert!(results[0].excerpt.is_none());
    }

    #[tokio::test]
    async fn test_title_results_truncated_and_sorted() {
        let (corpus, embedder) = three_movie_setup();
        let rec = Recommender::build(corpus, embedder, no_cluster_opts())
            .await
            .unwrap();

        let results = rec.recommend_by_title("Star Marine", 1).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_corpus_query_is_ok_empty() {
        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder::new(&[]));
        let rec = Recommender::build(Corpus::default(), embedder, no_cluster_opts())
            .await
            .unwrap();

        let results = rec.recommend_by_query("anything", 5, true).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_cluster_filter_degrades_without_classifier() {
        let (corpus, embedder) = three_movie_setup();
        let rec = Recommender::build(corpus, embedder, no_cluster_opts())
            .await
            .unwrap();

        // No classifier trained; the filtered query still succeeds.
        let results = rec.recommend_by_query("space battle", 2, true).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Star Marine");
    }

    #[tokio::test]
    async fn test_cluster_filter_with_trained_classifier() {
        let (corpus, embedder) = three_movie_setup();
        let opts = BuildOptions {
            cluster: true,
            k: Some(2),
            knn_neighbors: 1,
            ..Default::default()
        };
        let rec = Recommender::build(corpus, embedder, opts).await.unwrap();

        let results = rec.recommend_by_query("space battle", 3, true).await.unwrap();
        assert_eq!(results.len(), 3);
        // The astronaut movie shares the query's cluster and leads.
        assert_eq!(results[0].title, "Star Marine");
    }

    #[tokio::test]
    async fn test_build_with_k_larger_than_corpus_fails() {
        let (corpus, embedder) = three_movie_setup();
        let opts = BuildOptions {
            cluster: true,
            k: Some(10),
            ..Default::default()
        };
        let err = Recommender::build(corpus, embedder, opts).await.unwrap_err();
        assert!(matches!(err, RecError::InsufficientData { n: 3, k: 10 }));
    }

    #[tokio::test]
    async fn test_similarity_matrix_cached_and_unit_diagonal() {
        let (corpus, embedder) = three_movie_setup();
        let rec = Recommender::build(corpus, embedder, no_cluster_opts())
            .await
            .unwrap();

        let a = rec.similarity();
        let b = rec.similarity();
        assert!(Arc::ptr_eq(&a, &b));
        for i in 0..3 {
            assert!((a[i][i] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_excerpt_truncation() {
        let long = "x".repeat(150);
        let e = excerpt(&long);
        assert_eq!(e.chars().count(), 103);
        assert!(e.ends_with("..."));

        let short = "short synopsis";
        assert_eq!(excerpt(short), short);

        // Multi-byte chars never split.
        let accented = "é".repeat(120);
        let e = excerpt(&accented);
        assert!(e.ends_with("..."));
        assert_eq!(e.chars().count(), 103);
    }
}
