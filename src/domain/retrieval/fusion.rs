//! Reciprocal rank fusion

use std::collections::HashMap;

use crate::domain::knowledge_base::StoreHit;

/// Default RRF smoothing constant
pub const DEFAULT_RRF_K: f64 = 60.0;

struct Fused {
    hit: StoreHit,
    best_rank: usize,
}

/// Fuse ranked lists with `score(d) = Σ 1 / (k + rank_i(d))`
///
/// Each input list must already be in rank order (first element is rank 1).
/// A document absent from a list contributes nothing for it. The output is
/// sorted by fused score descending, then by the best individual rank, then
/// by id, and truncated to `limit`. Returned hits carry the fused score.
pub fn reciprocal_rank_fusion(lists: &[Vec<StoreHit>], k: f64, limit: usize) -> Vec<StoreHit> {
    let mut fused: HashMap<&str, Fused> = HashMap::new();

    for list in lists {
        for (index, hit) in list.iter().enumerate() {
            let rank = index + 1;
            let contribution = 1.0 / (k + rank as f64);

            fused
                .entry(hit.document.id.as_str())
                .and_modify(|entry| {
                    entry.hit.score += contribution;
                    entry.best_rank = entry.best_rank.min(rank);
                })
                .or_insert_with(|| Fused {
                    hit: StoreHit::new(hit.document.clone(), contribution),
                    best_rank: rank,
                });
        }
    }

    let mut ordered: Vec<Fused> = fused.into_values().collect();
    ordered.sort_by(|a, b| {
        b.hit
            .score
            .total_cmp(&a.hit.score)
            .then_with(|| a.best_rank.cmp(&b.best_rank))
            .then_with(|| a.hit.document.id.cmp(&b.hit.document.id))
    });

    ordered
        .into_iter()
        .take(limit)
        .map(|entry| entry.hit)
        .collect()
}
