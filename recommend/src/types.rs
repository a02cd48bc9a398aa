/// One ranked result.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// 1-based position in the returned list.
    pub rank: usize,

    /// Corpus index of the recommended movie.
    pub index: usize,

    pub title: String,

    /// Cosine similarity to the query, in `[-1, 1]`.
    pub similarity: f64,

    /// Synopsis excerpt, populated for free-text queries only.
    pub excerpt: Option<String>,

    pub genres: Vec<String>,
}

/// How cluster agreement reshapes a similarity ranking.
///
/// Both variants exist as valid designs in this system; the choice is
/// configuration, not separate call paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlendStrategy {
    /// Hard partition with a quota: a `same_share` fraction of the result
    /// list is reserved for candidates in the query's cluster (backfilled
    /// from the rest when the pool runs short). The same-cluster block
    /// leads the list; relative similarity order is preserved within each
    /// block.
    Partition { same_share: f64 },

    /// Multiplicative re-rank: same-cluster scores are boosted by
    /// `factor` before a single global sort.
    Boost { factor: f64 },
}

impl BlendStrategy {
    pub const DEFAULT_SAME_SHARE: f64 = 0.70;
    pub const DEFAULT_BOOST: f64 = 1.1;

    pub fn partition() -> Self {
        BlendStrategy::Partition {
            same_share: Self::DEFAULT_SAME_SHARE,
        }
    }

    pub fn boost() -> Self {
        BlendStrategy::Boost {
            factor: Self::DEFAULT_BOOST,
        }
    }
}

impl Default for BlendStrategy {
    fn default() -> Self {
        Self::partition()
    }
}
