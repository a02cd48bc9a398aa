//! Cluster-aware re-ranking of similarity candidates.

use cinerec_vecstore::{Hit, sort_hits};

use crate::types::BlendStrategy;

/// Re-rank `candidates` (already similarity-ordered, best first) using
/// their cluster agreement with the query's predicted cluster, returning
/// at most `top_k` hits. Never pads: if the candidate pool is smaller than
/// `top_k`, everything available is returned.
pub fn blend(
    candidates: &[Hit],
    labels: &[usize],
    query_cluster: usize,
    top_k: usize,
    strategy: BlendStrategy,
) -> Vec<Hit> {
    match strategy {
        BlendStrategy::Partition { same_share } => {
            partition_blend(candidates, labels, query_cluster, top_k, same_share)
        }
        BlendStrategy::Boost { factor } => {
            boost_blend(candidates, labels, query_cluster, top_k, factor)
        }
    }
}

/// Quota blend: `round(same_share * top_k)` slots go to same-cluster
/// candidates (listed first), the remainder to the others. Whichever side
/// runs short is backfilled from the other, preserving each side's
/// relative order.
fn partition_blend(
    candidates: &[Hit],
    labels: &[usize],
    query_cluster: usize,
    top_k: usize,
    same_share: f64,
) -> Vec<Hit> {
    let (same, other): (Vec<&Hit>, Vec<&Hit>) = candidates
        .iter()
        .partition(|h| labels.get(h.index) == Some(&query_cluster));

    let want = top_k.min(candidates.len());
    let target_same = ((same_share * top_k as f64).round() as usize).min(want);

    let take_same = target_same.min(same.len());
    let take_other = (want - take_same).min(other.len());
    // Backfill from the same-cluster pool when the others run short.
    let take_same = (want - take_other).min(same.len());

    let mut out: Vec<Hit> = Vec::with_capacity(want);
    out.extend(same.into_iter().take(take_same).cloned());
    out.extend(other.into_iter().take(take_other).cloned());
    out
}

/// Multiplicative blend: same-cluster scores are scaled by `factor`, then
/// a single global sort decides the order.
fn boost_blend(
    candidates: &[Hit],
    labels: &[usize],
    query_cluster: usize,
    top_k: usize,
    factor: f64,
) -> Vec<Hit> {
    let mut boosted: Vec<Hit> = candidates
        .iter()
        .map(|h| {
            let score = if labels.get(h.index) == Some(&query_cluster) {
                h.score * factor
            } else {
                h.score
            };
            Hit {
                index: h.index,
                score,
            }
        })
        .collect();

    sort_hits(&mut boosted);
    boosted.truncate(top_k.min(boosted.len()));
    boosted
}
