use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("corpus: {0}")]
    Io(String),

    #[error("corpus: invalid format: {0}")]
    InvalidFormat(String),

    #[error("corpus: missing column '{0}' in header")]
    MissingColumn(String),
}
