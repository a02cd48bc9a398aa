pub mod error;
pub mod io;
pub mod similarity;

pub use error::VecError;
pub use io::{load_vectors, save_vectors};
pub use similarity::{Hit, dot, similarity_matrix, sort_hits, top_k};
