//! Validator Management
//!
//! Tracks the workers the pool can delegate to: identity, performance
//! score, uptime, assigned stake and active-set membership.
//!
//! # Features
//! - Capacity-limited registration with default score/uptime
//! - Uptime-gated active set, re-evaluated on every performance update
//! - Top-performer ranking for stake redirection
//! - Capped proportional distribution of new capital

pub mod distribution;
pub mod registry;

pub use distribution::{cap_proportional, StakeDistribution, DEFAULT_MAX_STAKE_SHARE_BPS};
pub use registry::{
    RegistryConfig, RegistryState, RegistryStats, ValidatorRecord, ValidatorRegistry,
    DEFAULT_MAX_WORKERS, DEFAULT_MIN_UPTIME_THRESHOLD, DEFAULT_PERFORMANCE_SCORE,
    MAX_PERFORMANCE_SCORE, MAX_UPTIME_PERCENT,
};
