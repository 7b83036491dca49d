//! Validator Registry
//!
//! Maintains the authoritative set of workers, their performance and stake
//! records, and the ordered active set. Every lookup is by identity.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::distribution::{cap_proportional, StakeDistribution, DEFAULT_MAX_STAKE_SHARE_BPS};
use crate::audit::{AuditEvent, AuditSink};
use crate::core::{AdminCap, Authority, PoolError, PoolResult, WorkerId, BPS_DENOMINATOR};

/// Highest performance score
pub const MAX_PERFORMANCE_SCORE: u16 = 1_000;

/// Highest uptime percentage
pub const MAX_UPTIME_PERCENT: u8 = 100;

/// Score given to newly added workers
pub const DEFAULT_PERFORMANCE_SCORE: u16 = 500;

/// Default registry capacity
pub const DEFAULT_MAX_WORKERS: usize = 100;

/// Default uptime below which a worker is deactivated
pub const DEFAULT_MIN_UPTIME_THRESHOLD: u8 = 80;

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum number of registered workers
    pub max_workers: usize,
    /// Uptime (percent) below which a worker leaves the active set
    pub min_uptime_threshold: u8,
    /// Per-worker ceiling used by the distribution helper (basis points)
    pub max_stake_share_bps: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            min_uptime_threshold: DEFAULT_MIN_UPTIME_THRESHOLD,
            max_stake_share_bps: DEFAULT_MAX_STAKE_SHARE_BPS,
        }
    }
}

/// Registered worker with performance and stake state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    /// Worker identity
    pub id: WorkerId,
    /// Human readable name
    pub name: String,
    /// Performance score (0-1000)
    pub performance_score: u16,
    /// Uptime (0-100%)
    pub uptime_percent: u8,
    /// Weight assigned by the last rebalance (basis points)
    pub stake_weight: u64,
    /// Capital currently assigned
    pub total_stake: u64,
    /// Commission rate (0-10000 = 0-100%)
    pub commission_bps: u16,
    /// In the active set
    pub active: bool,
    /// Epoch of the last performance update
    pub last_updated: u64,
    /// Epoch when registered
    pub epoch_added: u64,
}

impl ValidatorRecord {
    /// Create a new record with default score, full uptime and no stake
    pub fn new(id: WorkerId, name: String, commission_bps: u16, epoch: u64) -> Self {
        Self {
            id,
            name,
            performance_score: DEFAULT_PERFORMANCE_SCORE,
            uptime_percent: MAX_UPTIME_PERCENT,
            stake_weight: 0,
            total_stake: 0,
            commission_bps,
            active: true,
            last_updated: epoch,
            epoch_added: epoch,
        }
    }

    /// Get commission as percentage (0.0 - 100.0)
    pub fn commission_percent(&self) -> f64 {
        self.commission_bps as f64 / 100.0
    }
}

/// Registry contents: records by identity plus the ordered active set.
///
/// `record.active` is true exactly when its id is in `active_set`.
#[derive(Debug, Clone, Default)]
pub struct RegistryState {
    workers: HashMap<WorkerId, ValidatorRecord>,
    active_set: Vec<WorkerId>,
}

impl RegistryState {
    pub fn get(&self, id: &WorkerId) -> Option<&ValidatorRecord> {
        self.workers.get(id)
    }

    pub fn contains(&self, id: &WorkerId) -> bool {
        self.workers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Active identities in active-set order
    pub fn active_ids(&self) -> &[WorkerId] {
        &self.active_set
    }

    /// Active records in active-set order
    pub fn active_records(&self) -> impl Iterator<Item = &ValidatorRecord> {
        self.active_set.iter().filter_map(|id| self.workers.get(id))
    }

    /// Stake assigned to active workers
    pub fn total_active_stake(&self) -> u64 {
        stake_sum(self.active_records())
    }

    /// Stake assigned to every registered worker
    pub fn total_stake(&self) -> u64 {
        stake_sum(self.workers.values())
    }

    /// Up to `n` active workers by descending score; ties keep active-set order
    pub fn top_workers(&self, n: usize) -> Vec<WorkerId> {
        let mut ranked: Vec<&ValidatorRecord> = self.active_records().collect();
        // stable sort keeps first-seen order among equal scores
        ranked.sort_by(|a, b| b.performance_score.cmp(&a.performance_score));
        ranked.into_iter().take(n).map(|r| r.id).collect()
    }

    /// Capped split of `total_amount` across active workers by performance score
    pub fn stake_distribution(&self, total_amount: u64, max_share_bps: u64) -> StakeDistribution {
        let weights: Vec<(WorkerId, u64)> = self
            .active_records()
            .map(|r| (r.id, r.performance_score as u64))
            .collect();
        cap_proportional(&weights, total_amount, max_share_bps)
    }

    pub(crate) fn get_mut(&mut self, id: &WorkerId) -> PoolResult<&mut ValidatorRecord> {
        self.workers.get_mut(id).ok_or(PoolError::NotFound(*id))
    }

    pub(crate) fn insert(&mut self, record: ValidatorRecord) {
        let id = record.id;
        if record.active {
            self.active_set.push(id);
        }
        self.workers.insert(id, record);
    }

    pub(crate) fn remove(&mut self, id: &WorkerId) -> PoolResult<ValidatorRecord> {
        let record = self.workers.remove(id).ok_or(PoolError::NotFound(*id))?;
        self.active_set.retain(|a| a != id);
        Ok(record)
    }

    pub(crate) fn set_active(&mut self, id: &WorkerId, active: bool) -> PoolResult<()> {
        let record = self.get_mut(id)?;
        if record.active == active {
            return Ok(());
        }
        record.active = active;
        if active {
            self.active_set.push(*id);
        } else {
            self.active_set.retain(|a| a != id);
        }
        Ok(())
    }

    /// Replace a worker's stake. Fails if the registry-wide total would
    /// exceed `u64::MAX`.
    pub(crate) fn set_stake(&mut self, id: &WorkerId, amount: u64) -> PoolResult<u64> {
        let current = self.get(id).ok_or(PoolError::NotFound(*id))?.total_stake;
        let others = self.total_stake() - current;
        if others.checked_add(amount).is_none() {
            return Err(PoolError::OutOfRange {
                field: "total_stake",
                value: amount,
                max: u64::MAX - others,
            });
        }
        let record = self.get_mut(id)?;
        Ok(std::mem::replace(&mut record.total_stake, amount))
    }
}

/// Sum of stakes; `set_stake` keeps the registry-wide total within `u64`
fn stake_sum<'a>(records: impl Iterator<Item = &'a ValidatorRecord>) -> u64 {
    records.fold(0u64, |acc, r| acc.saturating_add(r.total_stake))
}

/// Registry statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_workers: usize,
    pub active_workers: usize,
    /// Stake across every registered worker
    pub total_stake: u64,
    /// Stake across active workers
    pub active_stake: u64,
    /// Mean score of active workers
    pub average_performance: u64,
    /// Mean uptime of active workers
    pub average_uptime: u64,
    pub capacity: usize,
}

/// Validator registry
pub struct ValidatorRegistry {
    authority: Authority,
    config: RegistryConfig,
    state: RwLock<RegistryState>,
    /// Current epoch
    current_epoch: AtomicU64,
    audit: Arc<dyn AuditSink>,
}

impl ValidatorRegistry {
    /// Create a new validator registry bound to `cap`'s authority
    pub fn new(config: RegistryConfig, cap: &AdminCap, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            authority: Authority::bind(cap),
            config,
            state: RwLock::new(RegistryState::default()),
            current_epoch: AtomicU64::new(0),
            audit,
        }
    }

    /// Set current epoch. The engine's cooldown reads this clock.
    pub fn set_epoch(&self, cap: &AdminCap, epoch: u64) -> PoolResult<()> {
        self.authority.verify(cap)?;
        let before = self.current_epoch.swap(epoch, AtomicOrdering::SeqCst);
        debug!("Registry epoch {} -> {}", before, epoch);
        Ok(())
    }

    pub fn current_epoch(&self) -> u64 {
        self.current_epoch.load(AtomicOrdering::SeqCst)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a new worker. It starts active with score 500, uptime 100 and no stake.
    pub fn add_worker(
        &self,
        cap: &AdminCap,
        id: WorkerId,
        name: impl Into<String>,
        commission_bps: u16,
    ) -> PoolResult<()> {
        self.authority.verify(cap)?;
        if commission_bps as u64 > BPS_DENOMINATOR {
            return Err(PoolError::OutOfRange {
                field: "commission_bps",
                value: commission_bps as u64,
                max: BPS_DENOMINATOR,
            });
        }

        let name = name.into();
        let epoch = self.current_epoch();
        let mut state = self.state.write();

        if state.contains(&id) {
            return Err(PoolError::AlreadyExists(id));
        }
        if state.len() >= self.config.max_workers {
            warn!("Registry full, rejecting worker {}", id);
            return Err(PoolError::CapacityExceeded {
                capacity: self.config.max_workers,
            });
        }

        state.insert(ValidatorRecord::new(id, name.clone(), commission_bps, epoch));
        drop(state);

        info!("Added worker {} ({}) at epoch {}", id, name, epoch);
        self.audit.record(AuditEvent::WorkerAdded {
            worker: id,
            name,
            commission_bps,
            epoch,
        });
        Ok(())
    }

    /// Remove a worker from the registry and the active set.
    ///
    /// Returns the removed record; any stake it held is the caller's to reassign.
    pub fn remove_worker(
        &self,
        cap: &AdminCap,
        id: &WorkerId,
        reason: impl Into<String>,
    ) -> PoolResult<ValidatorRecord> {
        self.authority.verify(cap)?;
        let reason = reason.into();

        let record = self.state.write().remove(id)?;

        if record.total_stake > 0 {
            warn!("Removed worker {} still holding {} stake", id, record.total_stake);
        }
        info!("Removed worker {}: {}", id, reason);
        self.audit.record(AuditEvent::WorkerRemoved {
            worker: *id,
            reason,
            stake_at_removal: record.total_stake,
        });
        Ok(record)
    }

    /// Update score and uptime, then re-evaluate active-set membership
    pub fn update_performance(
        &self,
        cap: &AdminCap,
        id: &WorkerId,
        score: u16,
        uptime: u8,
    ) -> PoolResult<()> {
        self.authority.verify(cap)?;
        if score > MAX_PERFORMANCE_SCORE {
            return Err(PoolError::OutOfRange {
                field: "performance_score",
                value: score as u64,
                max: MAX_PERFORMANCE_SCORE as u64,
            });
        }
        if uptime > MAX_UPTIME_PERCENT {
            return Err(PoolError::OutOfRange {
                field: "uptime_percent",
                value: uptime as u64,
                max: MAX_UPTIME_PERCENT as u64,
            });
        }

        let epoch = self.current_epoch();
        let mut state = self.state.write();

        let record = state.get_mut(id)?;
        let (score_before, uptime_before, active_before) =
            (record.performance_score, record.uptime_percent, record.active);
        record.performance_score = score;
        record.uptime_percent = uptime;
        record.last_updated = epoch;

        let active_after = uptime >= self.config.min_uptime_threshold;
        state.set_active(id, active_after)?;
        drop(state);

        match (active_before, active_after) {
            (true, false) => warn!("Worker {} deactivated: uptime {}%", id, uptime),
            (false, true) => info!("Worker {} reactivated: uptime {}%", id, uptime),
            _ => debug!("Worker {} performance: score {}, uptime {}%", id, score, uptime),
        }
        self.audit.record(AuditEvent::PerformanceUpdated {
            worker: *id,
            score_before,
            score_after: score,
            uptime_before,
            uptime_after: uptime,
            active_before,
            active_after,
        });
        Ok(())
    }

    /// Set the stake recorded for a worker. `stake_weight` is left to the caller.
    pub fn update_stake_allocation(
        &self,
        cap: &AdminCap,
        id: &WorkerId,
        amount: u64,
    ) -> PoolResult<()> {
        self.authority.verify(cap)?;
        let stake_before = self.state.write().set_stake(id, amount)?;

        debug!("Worker {} stake: {} -> {}", id, stake_before, amount);
        self.audit.record(AuditEvent::StakeAllocationUpdated {
            worker: *id,
            stake_before,
            stake_after: amount,
        });
        Ok(())
    }

    /// Get worker by identity
    pub fn get_worker(&self, id: &WorkerId) -> Option<ValidatorRecord> {
        self.state.read().get(id).cloned()
    }

    /// Active identities in active-set order
    pub fn active_workers(&self) -> Vec<WorkerId> {
        self.state.read().active_ids().to_vec()
    }

    /// Active records in active-set order
    pub fn active_records(&self) -> Vec<ValidatorRecord> {
        self.state.read().active_records().cloned().collect()
    }

    /// Up to `n` active workers by descending performance score
    pub fn top_workers(&self, n: usize) -> Vec<WorkerId> {
        self.state.read().top_workers(n)
    }

    pub fn is_active(&self, id: &WorkerId) -> bool {
        self.state.read().get(id).map(|r| r.active).unwrap_or(false)
    }

    pub fn total_active_stake(&self) -> u64 {
        self.state.read().total_active_stake()
    }

    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.state.read();
        let active: Vec<&ValidatorRecord> = state.active_records().collect();
        let active_count = active.len() as u64;

        let average = |sum: u64| if active_count > 0 { sum / active_count } else { 0 };

        RegistryStats {
            total_workers: state.len(),
            active_workers: active.len(),
            total_stake: state.total_stake(),
            active_stake: state.total_active_stake(),
            average_performance: average(active.iter().map(|r| r.performance_score as u64).sum()),
            average_uptime: average(active.iter().map(|r| r.uptime_percent as u64).sum()),
            capacity: self.config.max_workers,
        }
    }

    /// Split `total_amount` across active workers by performance score,
    /// capping each at `max_stake_share_bps` of the total
    pub fn calculate_stake_distribution(&self, total_amount: u64) -> StakeDistribution {
        let distribution = self
            .state
            .read()
            .stake_distribution(total_amount, self.config.max_stake_share_bps);
        if distribution.undistributed > 0 {
            warn!(
                "{} of {} left undistributed: {} active workers cannot absorb it under the {} bps cap",
                distribution.undistributed,
                total_amount,
                distribution.allocations.len(),
                self.config.max_stake_share_bps
            );
        }
        distribution
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read()
    }

    pub(crate) fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write()
    }
}
