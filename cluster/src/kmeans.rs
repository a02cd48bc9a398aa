//! K-means clustering: Lloyd's algorithm with k-means++ seeding.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::assignment::ClusterAssignment;
use crate::error::ClusterError;

/// Default seed, fixed so test runs are reproducible.
pub const DEFAULT_SEED: u64 = 42;

const DEFAULT_MAX_ITER: usize = 100;
const DEFAULT_TOL: f64 = 1e-4;

/// Default cluster count as a monotone step function of corpus size,
/// clamped so the count never exceeds the corpus.
pub fn default_cluster_count(n: usize) -> usize {
    let k = match n {
        0..=10 => 3,
        11..=30 => 4,
        31..=60 => 5,
        _ => 6,
    };
    k.min(n)
}

/// K-means with a fixed pseudo-random seed. Fitting the same vectors with
/// the same configuration always produces the same partition.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    max_iter: usize,
    tol: f64,
    seed: u64,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: DEFAULT_MAX_ITER,
            tol: DEFAULT_TOL,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Partition `vectors` into `k` groups.
    ///
    /// Fails with `InsufficientData` when there are fewer vectors than
    /// clusters; clustering is undefined for `k > n`.
    pub fn fit(&self, vectors: &[Vec<f32>]) -> Result<ClusterAssignment, ClusterError> {
        let n = vectors.len();
        if self.k == 0 || n < self.k {
            return Err(ClusterError::InsufficientData { n, k: self.k });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = init_plus_plus(vectors, self.k, &mut rng);
        let mut labels = vec![0usize; n];

        for _ in 0..self.max_iter {
            // Assignment step.
            for (i, v) in vectors.iter().enumerate() {
                labels[i] = nearest_centroid(v, &centroids);
            }

            // Update step.
            let mut shift = 0.0f64;
            let mut updated: Vec<Vec<f64>> = Vec::with_capacity(self.k);
            for c in 0..self.k {
                let members: Vec<&Vec<f32>> = vectors
                    .iter()
                    .zip(&labels)
                    .filter(|&(_, &l)| l == c)
                    .map(|(v, _)| v)
                    .collect();

                let new = if members.is_empty() {
                    // Reseed an empty cluster with the point farthest from
                    // every current centroid. Deterministic.
                    let far = farthest_point(vectors, &centroids);
                    vectors[far].iter().map(|&x| x as f64).collect()
                } else {
                    mean(&members)
                };

                shift += sq_dist_f64(&centroids[c], &new);
                updated.push(new);
            }
            centroids = updated;

            if shift < self.tol {
                break;
            }
        }

        // Final assignment against the converged centroids.
        for (i, v) in vectors.iter().enumerate() {
            labels[i] = nearest_centroid(v, &centroids);
        }

        Ok(ClusterAssignment {
            labels,
            k: self.k,
        })
    }
}

/// k-means++ initialization: first centroid uniform, each next centroid
/// sampled proportionally to squared distance from the nearest chosen one.
fn init_plus_plus(vectors: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    use rand::Rng;

    let n = vectors.len();
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
    let first = rng.gen_range(0..n);
    centroids.push(vectors[first].iter().map(|&x| x as f64).collect());

    let mut dists = vec![0.0f64; n];
    while centroids.len() < k {
        let mut total = 0.0;
        for (i, v) in vectors.iter().enumerate() {
            let d = centroids
                .iter()
                .map(|c| sq_dist(v, c))
                .fold(f64::INFINITY, f64::min);
            dists[i] = d;
            total += d;
        }

        let next = if total <= f64::EPSILON {
            // All points coincide with chosen centroids; fall back to a
            // uniform draw.
            rng.gen_range(0..n)
        } else {
            let mut target = rng.r#gen::<f64>() * total;
            let mut pick = n - 1;
            for (i, &d) in dists.iter().enumerate() {
                target -= d;
                if target <= 0.0 {
                    pick = i;
                    break;
                }
            }
            pick
        };
        centroids.push(vectors[next].iter().map(|&x| x as f64).collect());
    }
    centroids
}

fn nearest_centroid(v: &[f32], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let d = sq_dist(v, centroid);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

fn farthest_point(vectors: &[Vec<f32>], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_d = -1.0f64;
    for (i, v) in vectors.iter().enumerate() {
        let d = centroids
            .iter()
            .map(|c| sq_dist(v, c))
            .fold(f64::INFINITY, f64::min);
        if d > best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

fn sq_dist(v: &[f32], c: &[f64]) -> f64 {
    v.iter()
        .zip(c)
        .map(|(&x, &y)| {
            let d = x as f64 - y;
            d * d
        })
        .sum()
}

fn sq_dist_f64(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum()
}

fn mean(members: &[&Vec<f32>]) -> Vec<f64> {
    let dim = members[0].len();
    let mut m = vec![0.0f64; dim];
    for v in members {
        for (i, &x) in v.iter().enumerate() {
            m[i] += x as f64;
        }
    }
    let count = members.len() as f64;
    for x in &mut m {
        *x /= count;
    }
    m
}
