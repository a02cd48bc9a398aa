use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("cluster: insufficient data: {n} vectors for {k} clusters")]
    InsufficientData { n: usize, k: usize },

    #[error("cluster: classifier is not trained")]
    NotTrained,

    #[error("cluster: stale artifact: {0}")]
    StaleArtifact(String),

    #[error("cluster: {0}")]
    Io(String),

    #[error("cluster: invalid format: {0}")]
    InvalidFormat(String),
}
