//! Pooled-capital vault
//!
//! Participants deposit the base asset and receive receipt units at the
//! current exchange rate; redeeming burns receipt units for capital at the
//! same rate.
//!
//! # Invariants
//! - `total_value = pooled + delegated + accrued` is the only basis for the rate
//! - An empty supply always prices at `INITIAL_EXCHANGE_RATE` (1.0)
//! - Supply changes only through deposit (mint) and withdraw (burn)
//! - Minted and returned amounts are floored, in the pool's favour
//! - Only the pooled balance can cover a redemption

pub mod ledger;
pub mod receipt;
pub mod state;

pub use ledger::{Vault, VaultConfig, VaultSettings, VaultSnapshot, DEFAULT_MINIMUM_DEPOSIT};
pub use receipt::{InMemoryReceiptToken, ReceiptToken};
pub use state::VaultState;
