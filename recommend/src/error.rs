use thiserror::Error;

use cinerec_cluster::ClusterError;
use cinerec_corpus::CorpusError;
use cinerec_embed::EmbedError;
use cinerec_vecstore::VecError;

#[derive(Error, Debug)]
pub enum RecError {
    /// The queried title has no exact match in the corpus. Recoverable;
    /// the message is suitable for end-user display.
    #[error("recommend: title '{0}' not found")]
    TitleNotFound(String),

    #[error("recommend: insufficient data: {n} documents for {k} clusters")]
    InsufficientData { n: usize, k: usize },

    #[error("recommend: cluster classifier is not trained")]
    NotTrained,

    /// The embedding backend failed to initialize. Fatal for the whole
    /// core; abort startup rather than degrade.
    #[error("recommend: embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// Derived artifacts disagree with the corpus they claim to describe.
    #[error("recommend: stale artifact: {0}")]
    StaleArtifact(String),

    #[error("recommend: corpus error: {0}")]
    Corpus(String),

    #[error("recommend: embed error: {0}")]
    Embed(String),

    #[error("recommend: vector error: {0}")]
    Vector(String),

    #[error("recommend: cluster error: {0}")]
    Cluster(String),

    #[error("recommend: {0}")]
    Io(String),
}

impl From<CorpusError> for RecError {
    fn from(e: CorpusError) -> Self {
        RecError::Corpus(e.to_string())
    }
}

impl From<EmbedError> for RecError {
    fn from(e: EmbedError) -> Self {
        match e {
            EmbedError::ModelUnavailable(msg) => RecError::ModelUnavailable(msg),
            other => RecError::Embed(other.to_string()),
        }
    }
}

impl From<VecError> for RecError {
    fn from(e: VecError) -> Self {
        RecError::Vector(e.to_string())
    }
}

impl From<ClusterError> for RecError {
    fn from(e: ClusterError) -> Self {
        match e {
            ClusterError::InsufficientData { n, k } => RecError::InsufficientData { n, k },
            ClusterError::NotTrained => RecError::NotTrained,
            ClusterError::StaleArtifact(msg) => RecError::StaleArtifact(msg),
            other => RecError::Cluster(other.to_string()),
        }
    }
}
