//! Target allocation
//!
//! Each active worker's share of the pool is proportional to its weighted
//! score, `score * 0.70 + uptime * 0.30`. Score (0-1000) and uptime (0-100)
//! are summed on their raw scales; the formula is kept exactly as the
//! allocation outcomes depend on it. Weights are held in hundredths so the
//! ratios stay exact.
//!
//! Workers below the strategy thresholds stay in the output with weight 0.
//! No per-worker ceiling is applied here; see [`apply_allocation_cap`].

use serde::{Deserialize, Serialize};

use super::strategy::RebalanceStrategy;
use crate::core::{apply_bps, bps_of, mul_div, WorkerId, BPS_DENOMINATOR};
use crate::validators::{cap_proportional, RegistryState, ValidatorRecord};

/// Score weight, in hundredths
pub const PERFORMANCE_WEIGHT: u64 = 70;

/// Uptime weight, in hundredths
pub const UPTIME_WEIGHT: u64 = 30;

/// Desired and current share of one worker, for one rebalance computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationTarget {
    pub worker: WorkerId,
    pub target_bps: u64,
    pub current_bps: u64,
    pub allocation_amount: u64,
}

impl AllocationTarget {
    /// |target - current| in basis points
    pub fn deviation_bps(&self) -> u64 {
        self.target_bps.abs_diff(self.current_bps)
    }
}

/// `100 * (score * 0.70 + uptime * 0.30)`
pub fn weighted_score(performance_score: u16, uptime_percent: u8) -> u64 {
    performance_score as u64 * PERFORMANCE_WEIGHT + uptime_percent as u64 * UPTIME_WEIGHT
}

pub fn is_eligible(record: &ValidatorRecord, strategy: &RebalanceStrategy) -> bool {
    record.active
        && record.performance_score >= strategy.performance_threshold
        && record.uptime_percent >= strategy.uptime_threshold
}

/// Weighted score, or 0 for workers failing the strategy thresholds
pub fn effective_weight(record: &ValidatorRecord, strategy: &RebalanceStrategy) -> u64 {
    if is_eligible(record, strategy) {
        weighted_score(record.performance_score, record.uptime_percent)
    } else {
        0
    }
}

/// Targets from `(worker, weight, current stake)` triples.
///
/// Falls back to an equal split when every weight is zero.
pub fn targets_from_weights(entries: &[(WorkerId, u64, u64)], total_stake: u64) -> Vec<AllocationTarget> {
    if entries.is_empty() {
        return Vec::new();
    }

    let total_weighted: u64 = entries.iter().map(|(_, w, _)| *w).sum();
    let equal_share = BPS_DENOMINATOR / entries.len() as u64;

    entries
        .iter()
        .map(|&(worker, weight, current_stake)| {
            let target_bps = if total_weighted > 0 {
                mul_div(weight, BPS_DENOMINATOR, total_weighted).unwrap_or(0)
            } else {
                equal_share
            };
            AllocationTarget {
                worker,
                target_bps,
                current_bps: bps_of(current_stake, total_stake),
                allocation_amount: apply_bps(total_stake, target_bps),
            }
        })
        .collect()
}

/// Optimal allocation of `total_stake` across the registry's active set,
/// in active-set order
pub fn calculate_optimal_allocation(
    registry: &RegistryState,
    strategy: &RebalanceStrategy,
    total_stake: u64,
) -> Vec<AllocationTarget> {
    let entries: Vec<(WorkerId, u64, u64)> = registry
        .active_records()
        .map(|r| (r.id, effective_weight(r, strategy), r.total_stake))
        .collect();

    targets_from_weights(&entries, total_stake)
}

/// Largest deviation across `targets`
pub fn max_drift(targets: &[AllocationTarget]) -> u64 {
    targets.iter().map(|t| t.deviation_bps()).max().unwrap_or(0)
}

/// Re-cap targets so no worker exceeds `max_share_bps`, spreading the excess
/// over the rest in proportion to their targets
pub fn apply_allocation_cap(
    targets: &[AllocationTarget],
    max_share_bps: u64,
    total_stake: u64,
) -> Vec<AllocationTarget> {
    let weights: Vec<(WorkerId, u64)> = targets.iter().map(|t| (t.worker, t.target_bps)).collect();
    let capped = cap_proportional(&weights, BPS_DENOMINATOR, max_share_bps);

    targets
        .iter()
        .zip(capped.allocations)
        .map(|(t, (_, target_bps))| AllocationTarget {
            target_bps,
            allocation_amount: apply_bps(total_stake, target_bps),
            ..*t
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;

    fn id(n: u8) -> WorkerId {
        Address::from_seed(&[n])
    }

    #[test]
    fn test_weighted_score_sums_raw_scales() {
        assert_eq!(weighted_score(1_000, 100), 73_000);
        assert_eq!(weighted_score(990, 90), 72_000);
        assert_eq!(weighted_score(0, 100), 3_000);
    }

    #[test]
    fn test_proportional_targets() {
        let targets = targets_from_weights(&[(id(1), 800, 0), (id(2), 200, 0)], 10_000);
        assert_eq!(targets[0].target_bps, 8_000);
        assert_eq!(targets[1].target_bps, 2_000);
        assert_eq!(targets[0].allocation_amount, 8_000);
        assert_eq!(targets[1].allocation_amount, 2_000);
    }

    #[test]
    fn test_equal_split_fallback() {
        let entries: Vec<_> = (0..3).map(|n| (id(n), 0, 0)).collect();
        let targets = targets_from_weights(&entries, 9_000);
        assert!(targets.iter().all(|t| t.target_bps == 3_333));
        assert_eq!(targets.iter().map(|t| t.target_bps).sum::<u64>(), 9_999);
    }

    #[test]
    fn test_closure_within_rounding() {
        let entries: Vec<_> = [7_001u64, 13, 52_340, 999, 31_000, 1]
            .iter()
            .enumerate()
            .map(|(i, w)| (id(i as u8), *w, 0))
            .collect();
        let sum: u64 = targets_from_weights(&entries, 1).iter().map(|t| t.target_bps).sum();
        assert!(sum <= BPS_DENOMINATOR);
        assert!(BPS_DENOMINATOR - sum < entries.len() as u64);
    }

    #[test]
    fn test_current_bps_zero_when_no_stake() {
        let targets = targets_from_weights(&[(id(1), 1, 500)], 0);
        assert_eq!(targets[0].current_bps, 0);
        assert_eq!(targets[0].allocation_amount, 0);
    }

    #[test]
    fn test_allocation_cap() {
        let targets = targets_from_weights(
            &[(id(1), 900, 0), (id(2), 100, 0), (id(3), 100, 0), (id(4), 100, 0), (id(5), 100, 0), (id(6), 100, 0)],
            10_000,
        );
        let capped = apply_allocation_cap(&targets, 2_000, 10_000);
        assert_eq!(capped[0].target_bps, 2_000);
        assert!(capped.iter().all(|t| t.target_bps <= 2_000));
        assert_eq!(capped.iter().map(|t| t.allocation_amount).sum::<u64>(), 10_000);
    }
}
