//! Transfer matching
//!
//! Pairs over-allocated workers with under-allocated ones in a single greedy
//! pass. Amounts are derived from each side's basis-point deviation against
//! the total stake and then tracked as they are consumed, so no source ever
//! gives more than its own excess. Floor rounding on both sides means a pass
//! can leave a few units of drift behind; later passes pick it up once the
//! drift crosses the strategy tolerance again.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::allocation::AllocationTarget;
use crate::core::{apply_bps, PoolError, PoolResult, WorkerId};

/// A single stake movement between two workers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceOperation {
    pub from_worker: WorkerId,
    pub to_worker: WorkerId,
    pub amount: u64,
    pub reason: String,
}

/// Greedy excess/deficit matching over `targets`.
///
/// Excess and deficit workers are visited in input order. Zero-amount
/// transfers are skipped.
///
/// A side's amount is computed from its bps once, when it is first visited,
/// and only decreases after that. Recomputing it from the unchanged bps at
/// every step would hand a source its full excess again for each deficit it
/// meets. One pass therefore closes all drift down to floor-rounding dust,
/// and dust below one unit per worker is never moved by a later pass either.
pub fn match_transfers(targets: &[AllocationTarget], total_stake: u64) -> Vec<RebalanceOperation> {
    let excess: Vec<&AllocationTarget> =
        targets.iter().filter(|t| t.current_bps > t.target_bps).collect();
    let deficit: Vec<&AllocationTarget> =
        targets.iter().filter(|t| t.current_bps < t.target_bps).collect();

    let gap = |t: &AllocationTarget| apply_bps(total_stake, t.deviation_bps());

    let mut operations = Vec::new();
    let (mut i, mut j) = (0, 0);
    let mut give = excess.first().map(|t| gap(t)).unwrap_or(0);
    let mut take = deficit.first().map(|t| gap(t)).unwrap_or(0);

    while i < excess.len() && j < deficit.len() {
        let amount = give.min(take);
        if amount > 0 {
            operations.push(RebalanceOperation {
                from_worker: excess[i].worker,
                to_worker: deficit[j].worker,
                amount,
                reason: format!(
                    "drift: {} bps over / {} bps under target",
                    excess[i].deviation_bps(),
                    deficit[j].deviation_bps()
                ),
            });
        }
        give -= amount;
        take -= amount;

        if give == 0 {
            i += 1;
            give = excess.get(i).map(|t| gap(t)).unwrap_or(0);
        }
        if take == 0 {
            j += 1;
            take = deficit.get(j).map(|t| gap(t)).unwrap_or(0);
        }
    }

    operations
}

/// Apply `operations` to a copy of `stakes`.
///
/// Fails without touching the input if any source would go negative or any
/// destination would overflow.
pub fn apply_operations(
    stakes: &HashMap<WorkerId, u64>,
    operations: &[RebalanceOperation],
) -> PoolResult<HashMap<WorkerId, u64>> {
    let mut next = stakes.clone();
    for op in operations {
        let from = next
            .get_mut(&op.from_worker)
            .ok_or(PoolError::NotFound(op.from_worker))?;
        let available = *from;
        *from = available.checked_sub(op.amount).ok_or_else(|| {
            PoolError::invalid_state(format!(
                "transfer of {} exceeds stake {} of {}",
                op.amount, available, op.from_worker
            ))
        })?;

        let to = next
            .get_mut(&op.to_worker)
            .ok_or(PoolError::NotFound(op.to_worker))?;
        let held = *to;
        *to = held.checked_add(op.amount).ok_or(PoolError::OutOfRange {
            field: "total_stake",
            value: op.amount,
            max: u64::MAX - held,
        })?;
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;

    fn id(n: u8) -> WorkerId {
        Address::from_seed(&[b'm', n])
    }

    fn target(n: u8, target_bps: u64, current_bps: u64) -> AllocationTarget {
        AllocationTarget {
            worker: id(n),
            target_bps,
            current_bps,
            allocation_amount: 0,
        }
    }

    #[test]
    fn test_single_pair() {
        let ops = match_transfers(&[target(1, 4_000, 6_000), target(2, 6_000, 4_000)], 10_000);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].from_worker, id(1));
        assert_eq!(ops[0].to_worker, id(2));
        assert_eq!(ops[0].amount, 2_000);
    }

    #[test]
    fn test_one_source_feeds_many() {
        let targets = [
            target(1, 3_333, 10_000),
            target(2, 3_333, 0),
            target(3, 3_333, 0),
        ];
        let ops = match_transfers(&targets, 1_000);
        assert_eq!(ops.len(), 2);
        assert_eq!((ops[0].to_worker, ops[0].amount), (id(2), 333));
        assert_eq!((ops[1].to_worker, ops[1].amount), (id(3), 333));
    }

    #[test]
    fn test_amounts_carry_forward_between_pairs() {
        // worker 1 covers two deficits but gives only its own excess
        let targets = [
            target(1, 2_000, 5_000),
            target(2, 3_000, 1_000),
            target(3, 4_000, 2_000),
            target(4, 1_000, 2_000),
        ];
        let ops = match_transfers(&targets, 10_000);

        // the second move is the 1_000 left of worker 1's excess, not a fresh 2_000
        let moves: Vec<(WorkerId, WorkerId, u64)> =
            ops.iter().map(|o| (o.from_worker, o.to_worker, o.amount)).collect();
        assert_eq!(
            moves,
            vec![(id(1), id(2), 2_000), (id(1), id(3), 1_000), (id(4), id(3), 1_000)]
        );

        let given_by = |n: u8| -> u64 {
            ops.iter().filter(|o| o.from_worker == id(n)).map(|o| o.amount).sum()
        };
        assert_eq!(given_by(1), 3_000);
        assert_eq!(given_by(4), 1_000);

        let stakes: HashMap<_, _> =
            [(id(1), 5_000), (id(2), 1_000), (id(3), 2_000), (id(4), 2_000)].into_iter().collect();
        let after = apply_operations(&stakes, &ops).unwrap();
        assert_eq!(after[&id(1)], 2_000);
        assert_eq!(after[&id(2)], 3_000);
        assert_eq!(after[&id(3)], 4_000);
        assert_eq!(after[&id(4)], 1_000);
    }

    #[test]
    fn test_zero_amount_transfers_skipped() {
        let ops = match_transfers(&[target(1, 5_000, 10_000), target(2, 5_000, 0)], 1);
        assert!(ops.is_empty());
    }

    #[test]
    fn test_balanced_input_yields_nothing() {
        let ops = match_transfers(&[target(1, 5_000, 5_000), target(2, 5_000, 5_000)], 10_000);
        assert!(ops.is_empty());
    }

    #[test]
    fn test_apply_rejects_overdraw() {
        let stakes: HashMap<_, _> = [(id(1), 100), (id(2), 0)].into_iter().collect();
        let ops = vec![RebalanceOperation {
            from_worker: id(1),
            to_worker: id(2),
            amount: 101,
            reason: String::new(),
        }];
        assert!(matches!(apply_operations(&stakes, &ops), Err(PoolError::InvalidState(_))));
        assert_eq!(stakes[&id(1)], 100);
    }
}
