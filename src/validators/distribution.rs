//! Capped proportional distribution
//!
//! Splits an amount across weighted workers so that no worker receives more
//! than `max_share_bps` of the total. Whatever a capped worker cannot take
//! is re-split among the rest until everyone is capped or nothing remains.
//!
//! # Key Concepts
//! - **Max Share**: ceiling per worker, in basis points of the total
//! - **Undistributed**: capital left over once every worker hit the ceiling

use serde::{Deserialize, Serialize};

use crate::core::{apply_bps, mul_div, WorkerId};

/// Default per-worker ceiling (20%)
pub const DEFAULT_MAX_STAKE_SHARE_BPS: u64 = 2_000;

/// Result of a capped distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeDistribution {
    /// Amount per worker, in input order
    pub allocations: Vec<(WorkerId, u64)>,
    /// Amount no worker could take without breaching the cap
    pub undistributed: u64,
}

impl StakeDistribution {
    /// Sum of all allocations
    pub fn distributed(&self) -> u64 {
        self.allocations.iter().map(|(_, a)| *a).sum()
    }

    pub fn amount_for(&self, worker: &WorkerId) -> u64 {
        self.allocations
            .iter()
            .find(|(w, _)| w == worker)
            .map(|(_, a)| *a)
            .unwrap_or(0)
    }
}

/// Split `total` across `weights` proportionally, with a per-worker ceiling.
///
/// When every weight is zero the split is equal.
pub fn cap_proportional(
    weights: &[(WorkerId, u64)],
    total: u64,
    max_share_bps: u64,
) -> StakeDistribution {
    let ceiling = apply_bps(total, max_share_bps);
    let mut allocated = vec![0u64; weights.len()];

    let all_zero = weights.iter().all(|(_, w)| *w == 0);
    let weight_of = |i: usize| if all_zero { 1 } else { weights[i].1 };

    let mut open: Vec<usize> = (0..weights.len()).filter(|&i| weight_of(i) > 0).collect();
    let mut remaining = total;

    while remaining > 0 && !open.is_empty() {
        let weight_sum: u64 = open.iter().map(|&i| weight_of(i)).sum();
        let mut given = 0u64;
        let mut capped = Vec::new();

        for &i in &open {
            let share = mul_div(remaining, weight_of(i), weight_sum).unwrap_or(0);
            let headroom = ceiling - allocated[i];
            if share >= headroom {
                allocated[i] += headroom;
                given += headroom;
                capped.push(i);
            } else {
                allocated[i] += share;
                given += share;
            }
        }

        remaining -= given;
        if capped.is_empty() {
            break;
        }
        open.retain(|i| !capped.contains(i));
    }

    // rounding dust goes to the first workers with headroom
    for &i in &open {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(ceiling - allocated[i]);
        allocated[i] += take;
        remaining -= take;
    }

    StakeDistribution {
        allocations: weights
            .iter()
            .zip(allocated)
            .map(|((id, _), amount)| (*id, amount))
            .collect(),
        undistributed: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;

    fn ids(n: u8) -> Vec<WorkerId> {
        (0..n).map(|i| Address::from_seed(&[i])).collect()
    }

    #[test]
    fn test_uncapped_split_is_proportional() {
        let w = ids(2);
        let dist = cap_proportional(&[(w[0], 3), (w[1], 1)], 1000, 10_000);
        assert_eq!(dist.amount_for(&w[0]), 750);
        assert_eq!(dist.amount_for(&w[1]), 250);
        assert_eq!(dist.undistributed, 0);
    }

    #[test]
    fn test_excess_redistributed_under_cap() {
        let w = ids(6);
        let weights: Vec<_> = w
            .iter()
            .zip([900u64, 100, 100, 100, 100, 100])
            .map(|(id, weight)| (*id, weight))
            .collect();

        let dist = cap_proportional(&weights, 10_000, 2_000);
        assert_eq!(dist.amount_for(&w[0]), 2_000);
        for id in &w[1..] {
            assert_eq!(dist.amount_for(id), 1_600);
        }
        assert_eq!(dist.distributed(), 10_000);
    }

    #[test]
    fn test_too_few_workers_leaves_undistributed() {
        let w = ids(3);
        let weights: Vec<_> = w.iter().map(|id| (*id, 1)).collect();

        let dist = cap_proportional(&weights, 10_000, 2_000);
        assert!(dist.allocations.iter().all(|(_, a)| *a == 2_000));
        assert_eq!(dist.undistributed, 4_000);
    }

    #[test]
    fn test_zero_weights_split_equally() {
        let w = ids(4);
        let weights: Vec<_> = w.iter().map(|id| (*id, 0)).collect();

        let dist = cap_proportional(&weights, 1_000, 10_000);
        assert!(dist.allocations.iter().all(|(_, a)| *a == 250));
    }

    #[test]
    fn test_rounding_dust_distributed() {
        let w = ids(3);
        let weights: Vec<_> = w.iter().map(|id| (*id, 1)).collect();

        let dist = cap_proportional(&weights, 1_000, 10_000);
        assert_eq!(dist.distributed(), 1_000);
        assert_eq!(dist.undistributed, 0);
    }
}
