//! Sparse bag-of-words and TF-IDF representations.
//!
//! These exist for offline comparison against the dense embeddings; the
//! live query path never consumes them. The vocabulary is pruned by
//! document frequency: a term must appear in at least `min_df` documents
//! and at most `max_df` (as a ratio) of them.

use std::collections::{BTreeMap, HashSet};

use crate::hash::{l2_normalize, tokenize};

/// Term-document matrix with its vocabulary, in feature order.
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    /// One row per input document, `feature_names.len()` columns.
    pub rows: Vec<Vec<f32>>,
    /// Vocabulary terms, sorted, aligned with row columns.
    pub feature_names: Vec<String>,
}

/// Raw term-count vectorizer.
#[derive(Debug, Clone)]
pub struct BagOfWords {
    pub min_df: usize,
    pub max_df: f64,
}

impl Default for BagOfWords {
    fn default() -> Self {
        Self {
            min_df: 2,
            max_df: 0.95,
        }
    }
}

impl BagOfWords {
    pub fn fit(&self, corpus: &[&str]) -> SparseMatrix {
        let vocab = build_vocab(corpus, self.min_df, self.max_df);
        let rows = corpus
            .iter()
            .map(|doc| count_row(doc, &vocab))
            .collect();
        SparseMatrix {
            rows,
            feature_names: vocab.keys().cloned().collect(),
        }
    }
}

/// TF-IDF vectorizer with smoothed idf and L2-normalized rows.
#[derive(Debug, Clone)]
pub struct TfIdf {
    pub min_df: usize,
    pub max_df: f64,
}

impl Default for TfIdf {
    fn default() -> Self {
        Self {
            min_df: 2,
            max_df: 0.95,
        }
    }
}

impl TfIdf {
    pub fn fit(&self, corpus: &[&str]) -> SparseMatrix {
        let vocab = build_vocab(corpus, self.min_df, self.max_df);
        let n = corpus.len() as f64;

        // Document frequency per vocabulary term.
        let mut df = vec![0usize; vocab.len()];
        for doc in corpus {
            let terms: HashSet<String> = tokenize(doc).collect();
            for t in terms {
                if let Some(&col) = vocab.get(&t) {
                    df[col] += 1;
                }
            }
        }

        // Smoothed idf: ln((1 + n) / (1 + df)) + 1.
        let idf: Vec<f32> = df
            .iter()
            .map(|&d| (((1.0 + n) / (1.0 + d as f64)).ln() + 1.0) as f32)
            .collect();

        let rows = corpus
            .iter()
            .map(|doc| {
                let mut row = count_row(doc, &vocab);
                for (x, w) in row.iter_mut().zip(&idf) {
                    *x *= w;
                }
                l2_normalize(&mut row);
                row
            })
            .collect();

        SparseMatrix {
            rows,
            feature_names: vocab.keys().cloned().collect(),
        }
    }
}

/// Vocabulary term -> column index, pruned by document frequency.
/// BTreeMap keeps feature order sorted and stable.
fn build_vocab(corpus: &[&str], min_df: usize, max_df: f64) -> BTreeMap<String, usize> {
    let n = corpus.len();
    let mut df: BTreeMap<String, usize> = BTreeMap::new();
    for doc in corpus {
        let terms: HashSet<String> = tokenize(doc).collect();
        for t in terms {
            *df.entry(t).or_insert(0) += 1;
        }
    }

    let max_count = (max_df * n as f64).floor() as usize;
    let mut vocab = BTreeMap::new();
    let mut col = 0;
    for (term, count) in df {
        if count >= min_df && count <= max_count {
            vocab.insert(term, col);
            col += 1;
        }
    }
    vocab
}

fn count_row(doc: &str, vocab: &BTreeMap<String, usize>) -> Vec<f32> {
    let mut row = vec![0.0f32; vocab.len()];
    for t in tokenize(doc) {
        if let Some(&col) = vocab.get(&t) {
            row[col] += 1.0;
        }
    }
    row
}
