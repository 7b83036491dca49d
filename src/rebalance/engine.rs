//! Rebalancing engine
//!
//! Decides when the pool's stake has drifted far enough from its
//! performance-weighted targets, plans the transfers that close the gap,
//! and applies them to the registry in one step. Also handles slashing-style
//! penalties that move stake away from under-performing workers.
//!
//! Locks are always taken strategy, then vault, then registry.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::allocation::{calculate_optimal_allocation, max_drift, AllocationTarget};
use super::matching::{apply_operations, match_transfers, RebalanceOperation};
use super::strategy::RebalanceStrategy;
use crate::audit::{AuditEvent, AuditSink};
use crate::core::{mul_div, AdminCap, Authority, PoolError, PoolResult, WorkerId};
use crate::validators::{RegistryState, ValidatorRegistry};
use crate::vault::Vault;

/// Number of top workers that share a penalized worker's stake
pub const PENALTY_RECIPIENTS: usize = 3;

/// Outcome of checking whether a rebalance should run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceDecision {
    /// Too soon after the last rebalance
    CoolingDown { epochs_remaining: u64 },
    NoActiveWorkers,
    /// Every worker is within `max_deviation_bps` of its target
    WithinTolerance { max_drift_bps: u64 },
    Drifted { max_drift_bps: u64 },
}

impl RebalanceDecision {
    pub fn should_rebalance(&self) -> bool {
        matches!(self, Self::Drifted { .. })
    }
}

/// Result of a penalty that moved stake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyOutcome {
    pub worker: WorkerId,
    pub penalty_percent: u64,
    pub stake_before: u64,
    pub stake_after: u64,
    /// Transfers to each recipient
    pub operations: Vec<RebalanceOperation>,
}

impl PenaltyOutcome {
    /// Stake actually moved off the penalized worker
    pub fn moved(&self) -> u64 {
        self.stake_before - self.stake_after
    }
}

/// Rebalancing engine
pub struct RebalancingEngine {
    authority: Authority,
    strategy: RwLock<RebalanceStrategy>,
    audit: Arc<dyn AuditSink>,
}

impl RebalancingEngine {
    pub fn new(
        strategy: RebalanceStrategy,
        cap: &AdminCap,
        audit: Arc<dyn AuditSink>,
    ) -> PoolResult<Self> {
        strategy.validate()?;
        info!(
            "Rebalancing engine created: thresholds score>={} uptime>={}%, max deviation {} bps, every {} epochs",
            strategy.performance_threshold,
            strategy.uptime_threshold,
            strategy.max_deviation_bps,
            strategy.rebalance_frequency_epochs
        );
        Ok(Self {
            authority: Authority::bind(cap),
            strategy: RwLock::new(strategy),
            audit,
        })
    }

    /// Current strategy
    pub fn strategy(&self) -> RebalanceStrategy {
        *self.strategy.read()
    }

    /// Replace the strategy. Returns the previous one.
    pub fn update_strategy(
        &self,
        cap: &AdminCap,
        strategy: RebalanceStrategy,
    ) -> PoolResult<RebalanceStrategy> {
        self.authority.verify(cap)?;
        strategy.validate()?;

        let before = std::mem::replace(&mut *self.strategy.write(), strategy);
        info!("Rebalance strategy updated: {:?} -> {:?}", before, strategy);
        self.audit.record(AuditEvent::StrategyUpdated {
            before,
            after: strategy,
        });
        Ok(before)
    }

    /// Target allocation for the current active set. Mutates nothing.
    pub fn preview_allocation(&self, registry: &ValidatorRegistry) -> Vec<AllocationTarget> {
        let strategy = self.strategy.read();
        let state = registry.read_state();
        calculate_optimal_allocation(&state, &strategy, state.total_active_stake())
    }

    /// Check cooldown and drift without mutating anything
    pub fn evaluate(&self, vault: &Vault, registry: &ValidatorRegistry) -> RebalanceDecision {
        let strategy = self.strategy.read();
        let last_rebalance_epoch = vault.read_state().last_rebalance_epoch;
        let state = registry.read_state();
        decide(&strategy, last_rebalance_epoch, registry.current_epoch(), &state).0
    }

    /// True iff the cooldown has elapsed and some active worker drifted
    /// strictly more than `max_deviation_bps` from its target
    pub fn should_rebalance(&self, vault: &Vault, registry: &ValidatorRegistry) -> bool {
        self.evaluate(vault, registry).should_rebalance()
    }

    /// Run a rebalance if one is due.
    ///
    /// Returns the transfers applied; empty when nothing was due. The plan is
    /// validated in full before any stake record changes.
    pub fn execute(
        &self,
        vault: &Vault,
        registry: &ValidatorRegistry,
    ) -> PoolResult<Vec<RebalanceOperation>> {
        let strategy = self.strategy.read();
        let mut vault_state = vault.write_state();
        let mut registry_state = registry.write_state();
        let epoch = registry.current_epoch();

        let (decision, targets, total_stake) =
            decide(&strategy, vault_state.last_rebalance_epoch, epoch, &registry_state);
        if !decision.should_rebalance() {
            debug!("Rebalance skipped at epoch {}: {:?}", epoch, decision);
            return Ok(Vec::new());
        }

        let operations = match_transfers(&targets, total_stake);
        let current: HashMap<WorkerId, u64> = targets
            .iter()
            .map(|t| {
                let stake = registry_state.get(&t.worker).map(|r| r.total_stake).unwrap_or(0);
                (t.worker, stake)
            })
            .collect();
        let next = apply_operations(&current, &operations).map_err(|e| {
            warn!("Rebalance plan at epoch {} rejected: {}", epoch, e);
            e
        })?;

        for target in &targets {
            let record = registry_state.get_mut(&target.worker)?;
            record.total_stake = next.get(&target.worker).copied().unwrap_or(record.total_stake);
            record.stake_weight = target.target_bps;
            record.last_updated = epoch;
        }
        vault_state.last_rebalance_epoch = epoch;

        drop(registry_state);
        drop(vault_state);
        drop(strategy);

        for op in &operations {
            debug!("Rebalance move {} -> {}: {} ({})", op.from_worker, op.to_worker, op.amount, op.reason);
        }
        info!(
            "Rebalanced at epoch {}: {} transfers over {} workers, {:?}",
            epoch,
            operations.len(),
            targets.len(),
            decision
        );
        self.audit.record(AuditEvent::Rebalanced {
            epoch,
            total_stake,
            operations: operations.clone(),
        });

        Ok(operations)
    }

    /// Move part of an under-performing worker's stake to the top performers.
    ///
    /// The penalty is the worker's shortfall against the performance
    /// threshold, or failing that the uptime threshold, capped at 100 and
    /// applied as a percentage of its stake. The moved stake is split evenly
    /// across up to three other active workers by descending score; the
    /// rounding remainder stays with the penalized worker.
    ///
    /// Returns `None` when nothing moved: the worker is inactive, meets both
    /// thresholds, holds too little stake or has no one to give to.
    pub fn penalize_worker(
        &self,
        cap: &AdminCap,
        registry: &ValidatorRegistry,
        id: &WorkerId,
        reason: &str,
    ) -> PoolResult<Option<PenaltyOutcome>> {
        self.authority.verify(cap)?;
        let strategy = self.strategy.read();
        let mut state = registry.write_state();

        let record = state.get(id).ok_or(PoolError::NotFound(*id))?;
        if !record.active {
            debug!("Penalty on {} skipped: worker inactive", id);
            return Ok(None);
        }

        let shortfall = if record.performance_score < strategy.performance_threshold {
            (strategy.performance_threshold - record.performance_score) as u64
        } else if record.uptime_percent < strategy.uptime_threshold {
            (strategy.uptime_threshold - record.uptime_percent) as u64
        } else {
            0
        };
        let penalty_percent = shortfall.min(100);
        if penalty_percent == 0 {
            debug!("Penalty on {} skipped: thresholds met", id);
            return Ok(None);
        }

        let stake_before = record.total_stake;
        let recipients: Vec<WorkerId> = state
            .top_workers(PENALTY_RECIPIENTS + 1)
            .into_iter()
            .filter(|w| w != id)
            .take(PENALTY_RECIPIENTS)
            .collect();
        if recipients.is_empty() {
            debug!("Penalty on {} skipped: no recipients", id);
            return Ok(None);
        }

        let penalty = mul_div(stake_before, penalty_percent, 100).unwrap_or(0);
        let share = penalty / recipients.len() as u64;
        if share == 0 {
            debug!("Penalty on {} skipped: stake {} too small to split", id, stake_before);
            return Ok(None);
        }
        let moved = share * recipients.len() as u64;

        // check every credit before touching any record
        for recipient in &recipients {
            let held = state.get(recipient).map(|r| r.total_stake).unwrap_or(0);
            if held.checked_add(share).is_none() {
                return Err(PoolError::OutOfRange {
                    field: "total_stake",
                    value: share,
                    max: u64::MAX - held,
                });
            }
        }

        let epoch = registry.current_epoch();
        let stake_after = stake_before - moved;
        state.set_stake(id, stake_after)?;
        state.get_mut(id)?.last_updated = epoch;
        for recipient in &recipients {
            let record = state.get_mut(recipient)?;
            record.total_stake += share;
            record.last_updated = epoch;
        }
        drop(state);
        drop(strategy);

        let operations: Vec<RebalanceOperation> = recipients
            .iter()
            .map(|to| RebalanceOperation {
                from_worker: *id,
                to_worker: *to,
                amount: share,
                reason: format!("penalty {}%: {}", penalty_percent, reason),
            })
            .collect();

        warn!(
            "Worker {} penalized {}% ({}): {} moved to {} workers",
            id,
            penalty_percent,
            reason,
            moved,
            recipients.len()
        );
        self.audit.record(AuditEvent::WorkerPenalized {
            worker: *id,
            reason: reason.to_string(),
            penalty_percent,
            stake_before,
            stake_after,
            recipients: recipients.iter().map(|r| (*r, share)).collect(),
        });

        Ok(Some(PenaltyOutcome {
            worker: *id,
            penalty_percent,
            stake_before,
            stake_after,
            operations,
        }))
    }
}

/// Cooldown and drift check over a locked view.
///
/// Returns the decision with the targets and stake basis it was made on.
fn decide(
    strategy: &RebalanceStrategy,
    last_rebalance_epoch: u64,
    epoch: u64,
    state: &RegistryState,
) -> (RebalanceDecision, Vec<AllocationTarget>, u64) {
    let elapsed = epoch.saturating_sub(last_rebalance_epoch);
    if elapsed < strategy.rebalance_frequency_epochs {
        let decision = RebalanceDecision::CoolingDown {
            epochs_remaining: strategy.rebalance_frequency_epochs - elapsed,
        };
        return (decision, Vec::new(), 0);
    }

    let total_stake = state.total_active_stake();
    let targets = calculate_optimal_allocation(state, strategy, total_stake);
    if targets.is_empty() {
        return (RebalanceDecision::NoActiveWorkers, targets, total_stake);
    }

    let max_drift_bps = max_drift(&targets);
    let decision = if max_drift_bps > strategy.max_deviation_bps {
        RebalanceDecision::Drifted { max_drift_bps }
    } else {
        RebalanceDecision::WithinTolerance { max_drift_bps }
    };
    (decision, targets, total_stake)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditKind, AuditLog};
    use crate::core::Address;
    use crate::validators::RegistryConfig;
    use crate::vault::VaultConfig;

    struct Pool {
        cap: AdminCap,
        vault: Vault,
        registry: ValidatorRegistry,
        engine: RebalancingEngine,
        log: Arc<AuditLog>,
    }

    fn pool(registry_config: RegistryConfig, strategy: RebalanceStrategy) -> Pool {
        let cap = AdminCap::generate();
        let log = Arc::new(AuditLog::new());
        Pool {
            vault: Vault::new(VaultConfig::default(), &cap, log.clone()),
            registry: ValidatorRegistry::new(registry_config, &cap, log.clone()),
            engine: RebalancingEngine::new(strategy, &cap, log.clone()).unwrap(),
            cap,
            log,
        }
    }

    fn open_strategy() -> RebalanceStrategy {
        RebalanceStrategy {
            performance_threshold: 0,
            uptime_threshold: 0,
            ..Default::default()
        }
    }

    fn worker(n: u8) -> WorkerId {
        Address::from_seed(&[b'e', n])
    }

    impl Pool {
        fn add(&self, n: u8, score: u16, uptime: u8, stake: u64) {
            self.registry.add_worker(&self.cap, worker(n), format!("w{}", n), 500).unwrap();
            self.registry.update_performance(&self.cap, &worker(n), score, uptime).unwrap();
            self.registry.update_stake_allocation(&self.cap, &worker(n), stake).unwrap();
        }

        fn stake(&self, n: u8) -> u64 {
            self.registry.get_worker(&worker(n)).unwrap().total_stake
        }
    }

    #[test]
    fn test_allocation_follows_weighted_score() {
        let p = pool(
            RegistryConfig {
                min_uptime_threshold: 40,
                ..Default::default()
            },
            open_strategy(),
        );
        p.add(1, 990, 90, 5_000);
        p.add(2, 240, 40, 5_000);

        let targets = p.engine.preview_allocation(&p.registry);
        assert_eq!(targets.len(), 2);
        assert_eq!((targets[0].target_bps, targets[0].allocation_amount), (8_000, 8_000));
        assert_eq!((targets[1].target_bps, targets[1].allocation_amount), (2_000, 2_000));
        assert_eq!(targets[0].current_bps, 5_000);
    }

    #[test]
    fn test_drift_triggers_and_execute_closes_it() {
        let p = pool(RegistryConfig::default(), open_strategy());
        p.add(1, 400, 100, 6_000);
        p.add(2, 624, 94, 4_000);
        p.registry.set_epoch(&p.cap, 1).unwrap();

        assert_eq!(
            p.engine.evaluate(&p.vault, &p.registry),
            RebalanceDecision::Drifted { max_drift_bps: 2_000 }
        );

        let ops = p.engine.execute(&p.vault, &p.registry).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!((ops[0].from_worker, ops[0].to_worker, ops[0].amount), (worker(1), worker(2), 2_000));

        assert_eq!((p.stake(1), p.stake(2)), (4_000, 6_000));
        assert_eq!(p.registry.get_worker(&worker(1)).unwrap().stake_weight, 4_000);
        assert_eq!(p.registry.get_worker(&worker(2)).unwrap().stake_weight, 6_000);
        assert_eq!(p.vault.config().last_rebalance_epoch, 1);
        assert_eq!(p.log.entries_of(AuditKind::Rebalanced).len(), 1);

        p.registry.set_epoch(&p.cap, 2).unwrap();
        assert_eq!(
            p.engine.evaluate(&p.vault, &p.registry),
            RebalanceDecision::WithinTolerance { max_drift_bps: 0 }
        );
    }

    #[test]
    fn test_drift_at_tolerance_does_not_trigger() {
        let p = pool(RegistryConfig::default(), open_strategy());
        p.add(1, 400, 100, 4_500);
        p.add(2, 624, 94, 5_500);
        p.registry.set_epoch(&p.cap, 1).unwrap();

        assert!(!p.engine.should_rebalance(&p.vault, &p.registry));
        assert!(p.engine.execute(&p.vault, &p.registry).unwrap().is_empty());
        assert_eq!(p.vault.config().last_rebalance_epoch, 0);
    }

    #[test]
    fn test_cooldown_gates_rebalance() {
        let p = pool(
            RegistryConfig::default(),
            RebalanceStrategy {
                rebalance_frequency_epochs: 5,
                ..open_strategy()
            },
        );
        p.add(1, 400, 100, 9_000);
        p.add(2, 624, 94, 1_000);

        p.registry.set_epoch(&p.cap, 3).unwrap();
        assert_eq!(
            p.engine.evaluate(&p.vault, &p.registry),
            RebalanceDecision::CoolingDown { epochs_remaining: 2 }
        );
        assert!(p.engine.execute(&p.vault, &p.registry).unwrap().is_empty());
        assert_eq!(p.stake(1), 9_000);

        p.registry.set_epoch(&p.cap, 5).unwrap();
        assert!(p.engine.should_rebalance(&p.vault, &p.registry));
        assert!(!p.engine.execute(&p.vault, &p.registry).unwrap().is_empty());

        p.registry.update_stake_allocation(&p.cap, &worker(1), 9_000).unwrap();
        p.registry.set_epoch(&p.cap, 7).unwrap();
        assert!(!p.engine.should_rebalance(&p.vault, &p.registry));
    }

    #[test]
    fn test_ineligible_workers_get_zero_target() {
        let p = pool(RegistryConfig::default(), RebalanceStrategy::default());
        p.add(1, 900, 100, 1_000);
        p.add(2, 300, 100, 1_000);
        p.add(3, 600, 85, 1_000);

        let targets = p.engine.preview_allocation(&p.registry);
        assert_eq!(targets.len(), 3);
        assert!(targets[0].target_bps > 0);
        assert_eq!(targets[1].target_bps, 0);
        assert_eq!(targets[2].target_bps, 0);
        assert_eq!(targets[0].target_bps, 10_000);
    }

    #[test]
    fn test_equal_split_when_nobody_qualifies() {
        let p = pool(
            RegistryConfig::default(),
            RebalanceStrategy {
                performance_threshold: 1_000,
                ..Default::default()
            },
        );
        for n in 1..=3 {
            p.add(n, 500, 100, 0);
        }
        let targets = p.engine.preview_allocation(&p.registry);
        assert!(targets.iter().all(|t| t.target_bps == 3_333));
    }

    #[test]
    fn test_preview_is_pure() {
        let p = pool(RegistryConfig::default(), open_strategy());
        p.add(1, 400, 100, 6_000);
        p.add(2, 624, 94, 4_000);

        let first = p.engine.preview_allocation(&p.registry);
        let second = p.engine.preview_allocation(&p.registry);
        assert_eq!(first, second);
        assert_eq!((p.stake(1), p.stake(2)), (6_000, 4_000));
    }

    #[test]
    fn test_no_active_workers() {
        let p = pool(RegistryConfig::default(), open_strategy());
        p.registry.set_epoch(&p.cap, 1).unwrap();
        assert_eq!(p.engine.evaluate(&p.vault, &p.registry), RebalanceDecision::NoActiveWorkers);
        assert!(p.engine.execute(&p.vault, &p.registry).unwrap().is_empty());
    }

    #[test]
    fn test_single_pass_leaves_rounding_residue() {
        let p = pool(RegistryConfig::default(), open_strategy());
        p.add(1, 500, 100, 1_000);
        p.add(2, 500, 100, 0);
        p.add(3, 500, 100, 0);
        p.registry.set_epoch(&p.cap, 1).unwrap();

        let ops = p.engine.execute(&p.vault, &p.registry).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!((p.stake(1), p.stake(2), p.stake(3)), (334, 333, 333));
        assert_eq!(p.registry.total_active_stake(), 1_000);

        // residue is inside tolerance, so the next pass leaves it alone
        p.registry.set_epoch(&p.cap, 2).unwrap();
        assert!(!p.engine.should_rebalance(&p.vault, &p.registry));
    }

    #[test]
    fn test_second_pass_cannot_move_sub_unit_dust() {
        let p = pool(
            RegistryConfig::default(),
            RebalanceStrategy {
                max_deviation_bps: 0,
                ..open_strategy()
            },
        );
        p.add(1, 500, 100, 1_000);
        p.add(2, 500, 100, 0);
        p.add(3, 500, 100, 0);
        p.registry.set_epoch(&p.cap, 1).unwrap();
        p.engine.execute(&p.vault, &p.registry).unwrap();
        assert_eq!((p.stake(1), p.stake(2), p.stake(3)), (334, 333, 333));

        // 7 bps of 1_000 floors to 0, so drift is reported but nothing moves
        p.registry.set_epoch(&p.cap, 2).unwrap();
        assert_eq!(
            p.engine.evaluate(&p.vault, &p.registry),
            RebalanceDecision::Drifted { max_drift_bps: 7 }
        );
        assert!(p.engine.execute(&p.vault, &p.registry).unwrap().is_empty());
        assert_eq!((p.stake(1), p.stake(2), p.stake(3)), (334, 333, 333));
        assert_eq!(p.vault.snapshot().last_rebalance_epoch, 2);
    }

    #[test]
    fn test_preview_near_stake_limit() {
        let p = pool(RegistryConfig::default(), open_strategy());
        p.add(1, 500, 100, u64::MAX - 1);
        p.add(2, 500, 100, 1);

        let targets = p.engine.preview_allocation(&p.registry);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].target_bps, 5_000);
        assert_eq!(targets[0].current_bps, 9_999);
        assert_eq!(p.registry.total_active_stake(), u64::MAX);
    }

    #[test]
    fn test_penalty_moves_stake_to_top_performers() {
        let p = pool(RegistryConfig::default(), RebalanceStrategy::default());
        p.add(1, 450, 100, 9_000);
        p.add(2, 900, 100, 0);
        p.add(3, 800, 100, 0);
        p.add(4, 700, 100, 0);
        p.add(5, 600, 100, 0);

        let outcome = p
            .engine
            .penalize_worker(&p.cap, &p.registry, &worker(1), "missed blocks")
            .unwrap()
            .unwrap();
        assert_eq!(outcome.penalty_percent, 50);
        assert_eq!(outcome.moved(), 4_500);
        assert_eq!(outcome.operations.len(), 3);

        assert_eq!(p.stake(1), 4_500);
        assert_eq!((p.stake(2), p.stake(3), p.stake(4), p.stake(5)), (1_500, 1_500, 1_500, 0));
        assert_eq!(p.log.entries_of(AuditKind::WorkerPenalized).len(), 1);
    }

    #[test]
    fn test_penalty_remainder_stays_with_worker() {
        let p = pool(RegistryConfig::default(), RebalanceStrategy::default());
        p.add(1, 500, 85, 1_000);
        for n in 2..=4 {
            p.add(n, 900, 100, 0);
        }

        let outcome = p
            .engine
            .penalize_worker(&p.cap, &p.registry, &worker(1), "downtime")
            .unwrap()
            .unwrap();
        assert_eq!(outcome.penalty_percent, 5);
        assert_eq!(outcome.stake_after, 952);
        let total: u64 = (1..=4).map(|n| p.stake(n)).sum();
        assert_eq!(total, 1_000);
    }

    #[test]
    fn test_penalty_noops() {
        let p = pool(RegistryConfig::default(), RebalanceStrategy::default());
        p.add(1, 900, 100, 1_000);
        let none = |n: u8| p.engine.penalize_worker(&p.cap, &p.registry, &worker(n), "x").unwrap();

        // nobody to receive
        p.registry.update_performance(&p.cap, &worker(1), 100, 100).unwrap();
        assert!(none(1).is_none());

        p.add(2, 900, 100, 0);
        // meets thresholds
        assert!(none(2).is_none());

        // inactive
        p.registry.update_performance(&p.cap, &worker(1), 100, 50).unwrap();
        assert!(none(1).is_none());
        assert_eq!(p.stake(1), 1_000);

        let missing = p.engine.penalize_worker(&p.cap, &p.registry, &worker(9), "x");
        assert_eq!(missing, Err(PoolError::NotFound(worker(9))));
    }

    #[test]
    fn test_admin_operations_require_capability() {
        let p = pool(RegistryConfig::default(), RebalanceStrategy::default());
        p.add(1, 100, 100, 1_000);
        let other = AdminCap::generate();

        assert_eq!(
            p.engine.penalize_worker(&other, &p.registry, &worker(1), "x"),
            Err(PoolError::Unauthorized)
        );
        assert_eq!(
            p.engine.update_strategy(&other, RebalanceStrategy::default()),
            Err(PoolError::Unauthorized)
        );
        assert_eq!(p.registry.set_epoch(&other, 100), Err(PoolError::Unauthorized));
        assert_eq!(p.registry.current_epoch(), 0);
    }

    #[test]
    fn test_update_strategy() {
        let p = pool(RegistryConfig::default(), RebalanceStrategy::default());
        let next = RebalanceStrategy {
            max_deviation_bps: 100,
            ..Default::default()
        };

        let before = p.engine.update_strategy(&p.cap, next).unwrap();
        assert_eq!(before, RebalanceStrategy::default());
        assert_eq!(p.engine.strategy(), next);
        assert_eq!(p.log.entries_of(AuditKind::StrategyUpdated).len(), 1);

        let bad = RebalanceStrategy {
            uptime_threshold: 101,
            ..Default::default()
        };
        assert!(p.engine.update_strategy(&p.cap, bad).is_err());
        assert_eq!(p.engine.strategy(), next);
    }
}
