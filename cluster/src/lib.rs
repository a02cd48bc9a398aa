pub mod assignment;
pub mod error;
pub mod kmeans;
pub mod knn;
pub mod pca;

pub use assignment::{ClusterAssignment, load_assignment, save_assignment};
pub use error::ClusterError;
pub use kmeans::{KMeans, default_cluster_count};
pub use knn::KnnClassifier;
pub use pca::project_2d;
