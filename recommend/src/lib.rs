pub mod artifacts;
pub mod blend;
pub mod error;
pub mod recommender;
pub mod types;

pub use error::RecError;
pub use recommender::{BuildOptions, Recommender};
pub use types::{BlendStrategy, Recommendation};
