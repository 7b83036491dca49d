//! # Celereum Liquid Staking
//!
//! Pooled staking ledger: depositors put native units into a shared vault
//! and receive receipt units that appreciate as rewards accrue. Pooled
//! capital is delegated across registered workers, and a rebalancing engine
//! keeps each worker's stake proportional to its performance.
//!
//! ## Components
//! - Vault: share-based accounting and the exchange rate
//! - Validator registry: worker records and the active set
//! - Rebalancing engine: drift detection, transfer planning, penalties
//! - Audit trail: before/after records for every mutation
//!
//! All amounts are `u64` base units; 1 CEL = 10^9 celers.

pub mod audit;
pub mod config;
pub mod core;
pub mod pool;
pub mod rebalance;
pub mod validators;
pub mod vault;

// Re-exports
pub use crate::core::*;
pub use audit::{AuditEvent, AuditKind, AuditLog, AuditSink, TracingAuditSink};
pub use config::{ConfigError, ProtocolConfig};
pub use pool::StakingPool;
pub use rebalance::{
    AllocationTarget, PenaltyOutcome, RebalanceDecision, RebalanceOperation, RebalanceStrategy,
    RebalancingEngine,
};
pub use validators::{RegistryConfig, RegistryStats, StakeDistribution, ValidatorRecord, ValidatorRegistry};
pub use vault::{InMemoryReceiptToken, ReceiptToken, Vault, VaultConfig, VaultSnapshot};

/// Crate version
pub const CELEREUM_LST_VERSION: &str = "0.1.0";

/// Celers per CEL (1 CEL = 10^9 celers)
pub const CELERS_PER_CEL: u64 = 1_000_000_000;
