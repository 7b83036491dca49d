//! Rebalancing Module
//!
//! Keeps stake spread across workers in proportion to their
//! performance-weighted score.
//!
//! # Key Concepts
//! - **Target**: a worker's desired share, in basis points of active stake
//! - **Drift**: |target - current| for one worker
//! - **Cooldown**: minimum epochs between two rebalances
//! - **Penalty**: stake moved off a worker below the strategy thresholds

pub mod allocation;
pub mod engine;
pub mod matching;
pub mod strategy;

pub use allocation::{
    apply_allocation_cap, calculate_optimal_allocation, effective_weight, is_eligible, max_drift,
    targets_from_weights, weighted_score, AllocationTarget, PERFORMANCE_WEIGHT, UPTIME_WEIGHT,
};
pub use engine::{PenaltyOutcome, RebalanceDecision, RebalancingEngine, PENALTY_RECIPIENTS};
pub use matching::{apply_operations, match_transfers, RebalanceOperation};
pub use strategy::RebalanceStrategy;
