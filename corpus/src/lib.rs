pub mod corpus;
pub mod error;
pub mod table;

pub use corpus::{Corpus, Movie};
pub use error::CorpusError;
