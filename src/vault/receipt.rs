//! Receipt token seam
//!
//! The vault owns the authoritative receipt supply. Holder balances live in
//! whatever implements [`ReceiptToken`], passed explicitly into every
//! deposit and withdrawal.

use std::collections::HashMap;

use crate::core::{AccountId, PoolError, PoolResult};

/// Mint/burn handle for the receipt token
pub trait ReceiptToken {
    /// Credit `amount` receipt units to `to`
    fn mint(&mut self, to: &AccountId, amount: u64) -> PoolResult<()>;

    /// Debit `amount` receipt units from `from`
    fn burn(&mut self, from: &AccountId, amount: u64) -> PoolResult<()>;

    /// Balance held by `holder`
    fn balance_of(&self, holder: &AccountId) -> u64;

    /// Sum of all balances
    fn total_supply(&self) -> u64;
}

/// Receipt token kept in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryReceiptToken {
    balances: HashMap<AccountId, u64>,
    supply: u64,
}

impl InMemoryReceiptToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of holders with a nonzero balance
    pub fn holders(&self) -> usize {
        self.balances.len()
    }
}

impl ReceiptToken for InMemoryReceiptToken {
    fn mint(&mut self, to: &AccountId, amount: u64) -> PoolResult<()> {
        let supply = self.supply.checked_add(amount).ok_or(PoolError::OutOfRange {
            field: "receipt_supply",
            value: amount,
            max: u64::MAX - self.supply,
        })?;
        *self.balances.entry(*to).or_insert(0) += amount;
        self.supply = supply;
        Ok(())
    }

    fn burn(&mut self, from: &AccountId, amount: u64) -> PoolResult<()> {
        let balance = self.balance_of(from);
        if amount > balance {
            return Err(PoolError::OutOfRange {
                field: "receipt_amount",
                value: amount,
                max: balance,
            });
        }

        let remaining = balance - amount;
        if remaining == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, remaining);
        }
        self.supply -= amount;
        Ok(())
    }

    fn balance_of(&self, holder: &AccountId) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u64 {
        self.supply
    }
}
