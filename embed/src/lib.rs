pub mod config;
pub mod embed;
pub mod error;
pub mod hash;
pub mod openai_compat;
pub mod sparse;

pub use config::EmbedConfig;
pub use embed::Embedder;
pub use error::EmbedError;
pub use hash::HashEmbedder;
pub use openai_compat::OpenAiCompat;
pub use sparse::{BagOfWords, SparseMatrix, TfIdf};
