//! Vault share accounting
//!
//! Pure arithmetic over the vault's fields. The same functions back the
//! mutating calls and the read-only previews, so a preview always matches
//! what would be applied.

use serde::{Deserialize, Serialize};

use crate::core::{mul_div, PoolError, PoolResult, INITIAL_EXCHANGE_RATE, RATE_SCALE};

/// Mutable vault state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    /// Liquid capital held by the pool
    pub pooled_balance: u64,
    /// Outstanding receipt-token units
    pub receipt_supply: u64,
    /// Capital reported as assigned to workers
    pub delegated_capital: u64,
    /// Capital earned but not yet folded into the pooled balance
    pub accrued_rewards: u64,
    pub paused: bool,
    pub minimum_deposit: u64,
    pub last_rebalance_epoch: u64,
    pub rebalance_interval_epochs: u64,
}

impl VaultState {
    pub fn new(minimum_deposit: u64, rebalance_interval_epochs: u64) -> Self {
        Self {
            pooled_balance: 0,
            receipt_supply: 0,
            delegated_capital: 0,
            accrued_rewards: 0,
            paused: false,
            minimum_deposit,
            last_rebalance_epoch: 0,
            rebalance_interval_epochs,
        }
    }

    /// `pooled + delegated + accrued`.
    ///
    /// Mutators reject any change that would overflow this sum.
    pub fn total_value(&self) -> u64 {
        self.checked_total(self.pooled_balance, self.delegated_capital, self.accrued_rewards)
            .unwrap_or(u64::MAX)
    }

    pub(crate) fn checked_total(&self, pooled: u64, delegated: u64, accrued: u64) -> Option<u64> {
        pooled.checked_add(delegated)?.checked_add(accrued)
    }

    /// Pooled value per receipt unit, scaled by `RATE_SCALE`
    pub fn exchange_rate(&self) -> u64 {
        if self.receipt_supply == 0 {
            return INITIAL_EXCHANGE_RATE;
        }
        mul_div(self.total_value(), RATE_SCALE, self.receipt_supply).unwrap_or(u64::MAX)
    }

    /// Receipt units minted for a deposit of `amount`, against the
    /// pre-deposit total value
    pub fn receipt_for_deposit(&self, amount: u64) -> PoolResult<u64> {
        if self.paused {
            return Err(PoolError::invalid_state("vault is paused"));
        }
        if amount < self.minimum_deposit {
            return Err(PoolError::BelowMinimum {
                amount,
                minimum: self.minimum_deposit,
            });
        }

        if self.receipt_supply == 0 {
            return Ok(amount);
        }

        let total = self.total_value();
        if total == 0 {
            return Err(PoolError::invalid_state(
                "receipt supply outstanding against zero total value",
            ));
        }

        let minted = mul_div(amount, self.receipt_supply, total).ok_or(PoolError::OutOfRange {
            field: "receipt_minted",
            value: amount,
            max: u64::MAX,
        })?;
        if minted == 0 {
            return Err(PoolError::invalid_state(format!(
                "deposit of {} mints no receipt units at the current rate ({} per unit)",
                amount,
                total / self.receipt_supply
            )));
        }
        Ok(minted)
    }

    /// Capital returned for redeeming `receipt_amount`
    pub fn payout_for_receipt(&self, receipt_amount: u64) -> PoolResult<u64> {
        if self.paused {
            return Err(PoolError::invalid_state("vault is paused"));
        }
        if self.receipt_supply == 0 {
            return Err(PoolError::invalid_state("no receipt supply outstanding"));
        }
        if receipt_amount == 0 {
            return Err(PoolError::invalid_state("zero receipt amount"));
        }
        if receipt_amount > self.receipt_supply {
            return Err(PoolError::OutOfRange {
                field: "receipt_amount",
                value: receipt_amount,
                max: self.receipt_supply,
            });
        }

        // receipt <= supply, so the quotient never exceeds total value
        let payout = mul_div(receipt_amount, self.total_value(), self.receipt_supply)
            .unwrap_or(u64::MAX);

        if payout > self.pooled_balance {
            return Err(PoolError::InsufficientLiquidity {
                requested: payout,
                available: self.pooled_balance,
            });
        }
        Ok(payout)
    }

    /// True once `rebalance_interval_epochs` have elapsed since the last run
    pub fn is_rebalance_due(&self, current_epoch: u64) -> bool {
        current_epoch.saturating_sub(self.last_rebalance_epoch) >= self.rebalance_interval_epochs
    }
}
