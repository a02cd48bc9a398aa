//! 2-D principal-component projection for cluster diagnostics.
//!
//! Power iteration with deflation on the mean-centered data. Nothing in
//! the query path consumes this; it exists so clusterings can be plotted
//! and eyeballed.

use rand::SeedableRng;
use rand::rngs::StdRng;

const ITERATIONS: usize = 100;

/// Project vectors onto their first two principal components.
///
/// Seeded, so identical inputs produce identical coordinates (up to the
/// usual sign ambiguity of eigenvectors, which the seed also pins).
/// Fewer than two vectors project to the origin.
pub fn project_2d(vectors: &[Vec<f32>], seed: u64) -> Vec<(f64, f64)> {
    let n = vectors.len();
    if n == 0 {
        return vec![];
    }
    let dim = vectors[0].len();
    if n < 2 || dim == 0 {
        return vec![(0.0, 0.0); n];
    }

    // Mean-center into f64.
    let mut mean = vec![0.0f64; dim];
    for v in vectors {
        for (i, &x) in v.iter().enumerate() {
            mean[i] += x as f64;
        }
    }
    for m in &mut mean {
        *m /= n as f64;
    }
    let mut data: Vec<Vec<f64>> = vectors
        .iter()
        .map(|v| v.iter().zip(&mean).map(|(&x, &m)| x as f64 - m).collect())
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let pc1 = power_iteration(&data, &mut rng);
    let xs: Vec<f64> = data.iter().map(|row| dot(row, &pc1)).collect();

    // Deflate: remove the first component from the data.
    for (row, &x) in data.iter_mut().zip(&xs) {
        for (r, &p) in row.iter_mut().zip(&pc1) {
            *r -= x * p;
        }
    }

    let pc2 = power_iteration(&data, &mut rng);
    let ys: Vec<f64> = data.iter().map(|row| dot(row, &pc2)).collect();

    xs.into_iter().zip(ys).collect()
}

/// Dominant right singular vector of the centered data via power
/// iteration on X^T X.
fn power_iteration(data: &[Vec<f64>], rng: &mut StdRng) -> Vec<f64> {
    use rand::Rng;

    let dim = data[0].len();
    let mut v: Vec<f64> = (0..dim).map(|_| rng.r#gen::<f64>() - 0.5).collect();
    normalize(&mut v);

    for _ in 0..ITERATIONS {
        // w = X^T (X v)
        let projected: Vec<f64> = data.iter().map(|row| dot(row, &v)).collect();
        let mut w = vec![0.0f64; dim];
        for (row, &p) in data.iter().zip(&projected) {
            for (wi, &r) in w.iter_mut().zip(row) {
                *wi += r * p;
            }
        }

        if !normalize(&mut w) {
            // Degenerate direction (no remaining variance); keep previous.
            break;
        }
        v = w;
    }
    v
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Normalize in place; returns false for a (near) zero vector.
fn normalize(v: &mut [f64]) -> bool {
    let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm < 1e-12 {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}
