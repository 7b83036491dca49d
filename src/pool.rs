//! Pool wiring
//!
//! Builds the vault, registry and engine from one [`ProtocolConfig`], all
//! bound to the same admin capability and audit sink.
//!
//! Calls that touch both vault and registry lock vault, then registry.

use std::sync::Arc;
use tracing::{debug, info};

use crate::audit::{AuditEvent, AuditSink, CapitalMove};
use crate::config::ProtocolConfig;
use crate::core::{AdminCap, Authority, PoolError, PoolResult, WorkerId};
use crate::rebalance::{RebalanceOperation, RebalancingEngine};
use crate::validators::{StakeDistribution, ValidatorRegistry};
use crate::vault::Vault;

/// The three ledger components of one staking pool
pub struct StakingPool {
    pub vault: Vault,
    pub registry: ValidatorRegistry,
    pub engine: RebalancingEngine,
    authority: Authority,
    audit: Arc<dyn AuditSink>,
}

impl StakingPool {
    pub fn new(config: &ProtocolConfig, cap: &AdminCap, audit: Arc<dyn AuditSink>) -> PoolResult<Self> {
        let pool = Self {
            vault: Vault::new(config.vault.clone(), cap, audit.clone()),
            registry: ValidatorRegistry::new(config.registry.clone(), cap, audit.clone()),
            engine: RebalancingEngine::new(config.strategy, cap, audit.clone())?,
            authority: Authority::bind(cap),
            audit,
        };
        info!("Staking pool ready");
        Ok(pool)
    }

    /// Move the registry clock to `epoch` and rebalance if due
    pub fn advance_epoch(&self, cap: &AdminCap, epoch: u64) -> PoolResult<Vec<RebalanceOperation>> {
        self.registry.set_epoch(cap, epoch)?;
        self.engine.execute(&self.vault, &self.registry)
    }

    /// Delegate up to `amount` of pooled capital across the active set.
    ///
    /// Uses the registry's capped distribution; whatever the cap leaves
    /// undistributed stays pooled. The split, the vault move and every
    /// worker credit happen under one vault and registry write section, and
    /// nothing is written unless all of them fit.
    pub fn delegate_idle(&self, cap: &AdminCap, amount: u64) -> PoolResult<StakeDistribution> {
        self.authority.verify(cap)?;
        let mut vault_state = self.vault.write_state();
        let mut registry_state = self.registry.write_state();

        let distribution =
            registry_state.stake_distribution(amount, self.registry.config().max_stake_share_bps);
        let distributed = distribution.distributed();
        if distributed == 0 {
            return Ok(distribution);
        }

        let pooled_before = vault_state.pooled_balance;
        let delegated_before = vault_state.delegated_capital;
        if distributed > pooled_before {
            return Err(PoolError::InsufficientLiquidity {
                requested: distributed,
                available: pooled_before,
            });
        }
        let delegated_after = delegated_before.checked_add(distributed).ok_or(PoolError::OutOfRange {
            field: "delegated_capital",
            value: distributed,
            max: u64::MAX - delegated_before,
        })?;
        // bounds every single credit as well
        let registry_total = registry_state.total_stake();
        if registry_total.checked_add(distributed).is_none() {
            return Err(PoolError::OutOfRange {
                field: "total_stake",
                value: distributed,
                max: u64::MAX - registry_total,
            });
        }

        let mut credits: Vec<(WorkerId, u64, u64)> = Vec::new();
        for (worker, share) in distribution.allocations.iter().filter(|(_, a)| *a > 0) {
            let stake_before = registry_state
                .get(worker)
                .ok_or(PoolError::NotFound(*worker))?
                .total_stake;
            credits.push((*worker, stake_before, stake_before + share));
        }

        for (worker, _, stake_after) in &credits {
            registry_state.get_mut(worker)?.total_stake = *stake_after;
        }
        vault_state.pooled_balance = pooled_before - distributed;
        vault_state.delegated_capital = delegated_after;
        drop(registry_state);
        drop(vault_state);

        debug!(
            "Delegated {} of {} across {} workers",
            distributed,
            amount,
            credits.len()
        );
        self.audit.record(AuditEvent::CapitalMoved {
            direction: CapitalMove::Delegate,
            amount: distributed,
            pooled_before,
            pooled_after: pooled_before - distributed,
            delegated_before,
            delegated_after,
        });
        for (worker, stake_before, stake_after) in credits {
            self.audit.record(AuditEvent::StakeAllocationUpdated {
                worker,
                stake_before,
                stake_after,
            });
        }
        Ok(distribution)
    }
}
