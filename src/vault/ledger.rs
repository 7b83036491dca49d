//! The shared vault
//!
//! Wraps [`VaultState`] in a single `RwLock`. Deposits, withdrawals and
//! admin bookkeeping take the write lock for their whole read-modify-write;
//! queries take the read lock and see one consistent snapshot.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::receipt::ReceiptToken;
use super::state::VaultState;
use crate::audit::{AuditEvent, AuditSink, CapitalMove};
use crate::core::{AccountId, AdminCap, Authority, PoolError, PoolResult};

/// Minimum deposit (1 CEL in base units)
pub const DEFAULT_MINIMUM_DEPOSIT: u64 = 1_000_000_000;

/// Vault construction parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Smallest accepted deposit
    pub minimum_deposit: u64,
    /// Epochs between vault-side rebalance checks
    pub rebalance_interval_epochs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            minimum_deposit: DEFAULT_MINIMUM_DEPOSIT,
            rebalance_interval_epochs: 1,
        }
    }
}

/// Current vault settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSettings {
    pub paused: bool,
    pub minimum_deposit: u64,
    pub rebalance_interval_epochs: u64,
    pub last_rebalance_epoch: u64,
}

/// Consistent view of every vault field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub pooled_balance: u64,
    pub receipt_supply: u64,
    pub delegated_capital: u64,
    pub accrued_rewards: u64,
    pub total_value: u64,
    pub exchange_rate: u64,
    pub paused: bool,
    pub last_rebalance_epoch: u64,
}

/// Pooled-capital vault
pub struct Vault {
    authority: Authority,
    state: RwLock<VaultState>,
    audit: Arc<dyn AuditSink>,
}

impl Vault {
    /// Create the vault, bound to `cap`'s authority
    pub fn new(config: VaultConfig, cap: &AdminCap, audit: Arc<dyn AuditSink>) -> Self {
        info!(
            "Vault created: minimum deposit {}, rebalance interval {} epochs",
            config.minimum_deposit, config.rebalance_interval_epochs
        );
        Self {
            authority: Authority::bind(cap),
            state: RwLock::new(VaultState::new(
                config.minimum_deposit,
                config.rebalance_interval_epochs,
            )),
            audit,
        }
    }

    /// Deposit `amount` and mint receipt units to `depositor`.
    ///
    /// Returns the receipt units minted.
    pub fn deposit(
        &self,
        amount: u64,
        depositor: &AccountId,
        token: &mut dyn ReceiptToken,
    ) -> PoolResult<u64> {
        let mut state = self.state.write();

        let minted = state.receipt_for_deposit(amount).map_err(|e| {
            warn!("Deposit of {} from {} rejected: {}", amount, depositor, e);
            e
        })?;

        let pooled_after = state.pooled_balance.checked_add(amount);
        let supply_after = state.receipt_supply.checked_add(minted);
        let (pooled_after, supply_after) = match (pooled_after, supply_after) {
            (Some(p), Some(s))
                if state
                    .checked_total(p, state.delegated_capital, state.accrued_rewards)
                    .is_some() =>
            {
                (p, s)
            }
            _ => {
                return Err(PoolError::OutOfRange {
                    field: "deposit_amount",
                    value: amount,
                    max: u64::MAX - state.total_value(),
                })
            }
        };

        // external mint first: a failure leaves the vault untouched
        token.mint(depositor, minted)?;

        let before = state.clone();
        state.pooled_balance = pooled_after;
        state.receipt_supply = supply_after;

        let event = AuditEvent::Deposit {
            depositor: *depositor,
            amount,
            receipt_minted: minted,
            supply_before: before.receipt_supply,
            supply_after: state.receipt_supply,
            pooled_before: before.pooled_balance,
            pooled_after: state.pooled_balance,
            rate_before: before.exchange_rate(),
            rate_after: state.exchange_rate(),
        };
        drop(state);

        info!("Deposit: {} from {} minted {} receipt", amount, depositor, minted);
        self.audit.record(event);
        Ok(minted)
    }

    /// Burn `receipt_amount` from `holder` and return the capital paid out
    pub fn withdraw(
        &self,
        receipt_amount: u64,
        holder: &AccountId,
        token: &mut dyn ReceiptToken,
    ) -> PoolResult<u64> {
        let mut state = self.state.write();

        let payout = state.payout_for_receipt(receipt_amount).map_err(|e| {
            warn!("Withdrawal of {} receipt by {} rejected: {}", receipt_amount, holder, e);
            e
        })?;

        token.burn(holder, receipt_amount)?;

        let before = state.clone();
        state.receipt_supply -= receipt_amount;
        state.pooled_balance -= payout;

        let event = AuditEvent::Withdraw {
            holder: *holder,
            receipt_burned: receipt_amount,
            amount_returned: payout,
            supply_before: before.receipt_supply,
            supply_after: state.receipt_supply,
            pooled_before: before.pooled_balance,
            pooled_after: state.pooled_balance,
            rate_before: before.exchange_rate(),
            rate_after: state.exchange_rate(),
        };
        drop(state);

        info!("Withdraw: {} receipt by {} returned {}", receipt_amount, holder, payout);
        self.audit.record(event);
        Ok(payout)
    }

    /// Receipt units a deposit of `amount` would mint now
    pub fn preview_deposit(&self, amount: u64) -> PoolResult<u64> {
        self.state.read().receipt_for_deposit(amount)
    }

    /// Capital a redemption of `receipt_amount` would return now
    pub fn preview_withdraw(&self, receipt_amount: u64) -> PoolResult<u64> {
        self.state.read().payout_for_receipt(receipt_amount)
    }

    /// Current exchange rate, scaled by `RATE_SCALE`
    pub fn exchange_rate(&self) -> u64 {
        self.state.read().exchange_rate()
    }

    /// Pooled + delegated + accrued capital
    pub fn total_value_locked(&self) -> u64 {
        self.state.read().total_value()
    }

    pub fn snapshot(&self) -> VaultSnapshot {
        let state = self.state.read();
        VaultSnapshot {
            pooled_balance: state.pooled_balance,
            receipt_supply: state.receipt_supply,
            delegated_capital: state.delegated_capital,
            accrued_rewards: state.accrued_rewards,
            total_value: state.total_value(),
            exchange_rate: state.exchange_rate(),
            paused: state.paused,
            last_rebalance_epoch: state.last_rebalance_epoch,
        }
    }

    pub fn config(&self) -> VaultSettings {
        let state = self.state.read();
        VaultSettings {
            paused: state.paused,
            minimum_deposit: state.minimum_deposit,
            rebalance_interval_epochs: state.rebalance_interval_epochs,
            last_rebalance_epoch: state.last_rebalance_epoch,
        }
    }

    pub fn is_rebalance_due(&self, current_epoch: u64) -> bool {
        self.state.read().is_rebalance_due(current_epoch)
    }

    /// Record rewards earned by delegated capital
    pub fn record_rewards(&self, cap: &AdminCap, amount: u64) -> PoolResult<()> {
        self.authority.verify(cap)?;
        let mut state = self.state.write();

        let accrued_after = state
            .accrued_rewards
            .checked_add(amount)
            .filter(|a| {
                state
                    .checked_total(state.pooled_balance, state.delegated_capital, *a)
                    .is_some()
            })
            .ok_or(PoolError::OutOfRange {
                field: "rewards",
                value: amount,
                max: u64::MAX - state.total_value(),
            })?;

        let rate_before = state.exchange_rate();
        let accrued_before = state.accrued_rewards;
        state.accrued_rewards = accrued_after;

        let event = AuditEvent::RewardsRecorded {
            amount,
            accrued_before,
            accrued_after,
            rate_before,
            rate_after: state.exchange_rate(),
        };
        drop(state);

        debug!("Recorded {} rewards", amount);
        self.audit.record(event);
        Ok(())
    }

    /// Record capital assigned to workers outside the pooled balance
    pub fn record_delegation(&self, cap: &AdminCap, amount: u64) -> PoolResult<()> {
        self.authority.verify(cap)?;
        let mut state = self.state.write();

        let delegated_after = state
            .delegated_capital
            .checked_add(amount)
            .filter(|d| {
                state
                    .checked_total(state.pooled_balance, *d, state.accrued_rewards)
                    .is_some()
            })
            .ok_or(PoolError::OutOfRange {
                field: "delegation",
                value: amount,
                max: u64::MAX - state.total_value(),
            })?;

        let delegated_before = state.delegated_capital;
        state.delegated_capital = delegated_after;
        drop(state);

        debug!("Recorded {} delegated capital", amount);
        self.audit.record(AuditEvent::DelegationRecorded {
            amount,
            delegated_before,
            delegated_after,
        });
        Ok(())
    }

    /// Move `amount` of pooled capital into delegation. Total value is unchanged.
    pub fn delegate(&self, cap: &AdminCap, amount: u64) -> PoolResult<()> {
        self.authority.verify(cap)?;
        let mut state = self.state.write();

        if amount > state.pooled_balance {
            return Err(PoolError::InsufficientLiquidity {
                requested: amount,
                available: state.pooled_balance,
            });
        }

        let before = state.clone();
        state.pooled_balance -= amount;
        state.delegated_capital += amount;

        let event = capital_moved(CapitalMove::Delegate, amount, &before, &state);
        drop(state);

        info!("Delegated {} from pool", amount);
        self.audit.record(event);
        Ok(())
    }

    /// Return `amount` of delegated capital to the pool
    pub fn undelegate(&self, cap: &AdminCap, amount: u64) -> PoolResult<()> {
        self.authority.verify(cap)?;
        let mut state = self.state.write();

        if amount > state.delegated_capital {
            return Err(PoolError::InsufficientLiquidity {
                requested: amount,
                available: state.delegated_capital,
            });
        }

        let before = state.clone();
        state.delegated_capital -= amount;
        state.pooled_balance += amount;

        let event = capital_moved(CapitalMove::Undelegate, amount, &before, &state);
        drop(state);

        info!("Undelegated {} back to pool", amount);
        self.audit.record(event);
        Ok(())
    }

    /// Fold accrued rewards into the pooled balance. Returns the amount folded.
    pub fn harvest_rewards(&self, cap: &AdminCap) -> PoolResult<u64> {
        self.authority.verify(cap)?;
        let mut state = self.state.write();

        let amount = state.accrued_rewards;
        let pooled_before = state.pooled_balance;
        // pooled + accrued is already bounded by total value
        state.pooled_balance += amount;
        state.accrued_rewards = 0;
        let pooled_after = state.pooled_balance;
        drop(state);

        if amount > 0 {
            info!("Harvested {} rewards into pool", amount);
            self.audit.record(AuditEvent::RewardsHarvested {
                amount,
                pooled_before,
                pooled_after,
            });
        }
        Ok(amount)
    }

    pub fn set_paused(&self, cap: &AdminCap, paused: bool) -> PoolResult<()> {
        self.authority.verify(cap)?;
        let before = std::mem::replace(&mut self.state.write().paused, paused);

        info!("Vault paused: {} -> {}", before, paused);
        self.audit.record(AuditEvent::PauseChanged {
            before,
            after: paused,
        });
        Ok(())
    }

    pub fn set_minimum_deposit(&self, cap: &AdminCap, amount: u64) -> PoolResult<()> {
        self.authority.verify(cap)?;
        let before = std::mem::replace(&mut self.state.write().minimum_deposit, amount);

        info!("Minimum deposit: {} -> {}", before, amount);
        self.audit.record(AuditEvent::MinimumDepositChanged {
            before,
            after: amount,
        });
        Ok(())
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, VaultState> {
        self.state.read()
    }

    pub(crate) fn write_state(&self) -> RwLockWriteGuard<'_, VaultState> {
        self.state.write()
    }
}

fn capital_moved(
    direction: CapitalMove,
    amount: u64,
    before: &VaultState,
    after: &VaultState,
) -> AuditEvent {
    AuditEvent::CapitalMoved {
        direction,
        amount,
        pooled_before: before.pooled_balance,
        pooled_after: after.pooled_balance,
        delegated_before: before.delegated_capital,
        delegated_after: after.delegated_capital,
    }
}
