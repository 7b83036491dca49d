//! Error taxonomy shared by the vault, registry and rebalancing engine

use super::address::WorkerId;

/// Ledger errors
///
/// Every error is returned synchronously; nothing is retried internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Amount {amount} below minimum {minimum}")]
    BelowMinimum { amount: u64, minimum: u64 },

    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: u64, available: u64 },

    #[error("Worker not found: {0}")]
    NotFound(WorkerId),

    #[error("Worker already registered: {0}")]
    AlreadyExists(WorkerId),

    #[error("Registry at capacity ({capacity} workers)")]
    CapacityExceeded { capacity: usize },

    #[error("{field} out of range: {value} (max {max})")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("Unauthorized: capability does not match authority")]
    Unauthorized,
}

impl PoolError {
    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

/// Result alias for ledger operations
pub type PoolResult<T> = Result<T, PoolError>;
