//! Audit event payloads
//!
//! Each event carries the values before and after the mutation it records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{AccountId, WorkerId};
use crate::rebalance::{RebalanceOperation, RebalanceStrategy};

/// Direction of a pooled/delegated capital move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapitalMove {
    /// Pooled balance -> delegated capital
    Delegate,
    /// Delegated capital -> pooled balance
    Undelegate,
}

/// Immutable audit record emitted by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    Deposit {
        depositor: AccountId,
        amount: u64,
        receipt_minted: u64,
        supply_before: u64,
        supply_after: u64,
        pooled_before: u64,
        pooled_after: u64,
        rate_before: u64,
        rate_after: u64,
    },
    Withdraw {
        holder: AccountId,
        receipt_burned: u64,
        amount_returned: u64,
        supply_before: u64,
        supply_after: u64,
        pooled_before: u64,
        pooled_after: u64,
        rate_before: u64,
        rate_after: u64,
    },
    RewardsRecorded {
        amount: u64,
        accrued_before: u64,
        accrued_after: u64,
        rate_before: u64,
        rate_after: u64,
    },
    DelegationRecorded {
        amount: u64,
        delegated_before: u64,
        delegated_after: u64,
    },
    CapitalMoved {
        direction: CapitalMove,
        amount: u64,
        pooled_before: u64,
        pooled_after: u64,
        delegated_before: u64,
        delegated_after: u64,
    },
    RewardsHarvested {
        amount: u64,
        pooled_before: u64,
        pooled_after: u64,
    },
    PauseChanged {
        before: bool,
        after: bool,
    },
    MinimumDepositChanged {
        before: u64,
        after: u64,
    },
    WorkerAdded {
        worker: WorkerId,
        name: String,
        commission_bps: u16,
        epoch: u64,
    },
    WorkerRemoved {
        worker: WorkerId,
        reason: String,
        stake_at_removal: u64,
    },
    PerformanceUpdated {
        worker: WorkerId,
        score_before: u16,
        score_after: u16,
        uptime_before: u8,
        uptime_after: u8,
        active_before: bool,
        active_after: bool,
    },
    StakeAllocationUpdated {
        worker: WorkerId,
        stake_before: u64,
        stake_after: u64,
    },
    Rebalanced {
        epoch: u64,
        total_stake: u64,
        operations: Vec<RebalanceOperation>,
    },
    WorkerPenalized {
        worker: WorkerId,
        reason: String,
        penalty_percent: u64,
        stake_before: u64,
        stake_after: u64,
        recipients: Vec<(WorkerId, u64)>,
    },
    StrategyUpdated {
        before: RebalanceStrategy,
        after: RebalanceStrategy,
    },
}

/// Event discriminant, used for filtering and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditKind {
    Deposit,
    Withdraw,
    RewardsRecorded,
    DelegationRecorded,
    CapitalMoved,
    RewardsHarvested,
    PauseChanged,
    MinimumDepositChanged,
    WorkerAdded,
    WorkerRemoved,
    PerformanceUpdated,
    StakeAllocationUpdated,
    Rebalanced,
    WorkerPenalized,
    StrategyUpdated,
}

impl AuditEvent {
    pub fn kind(&self) -> AuditKind {
        match self {
            Self::Deposit { .. } => AuditKind::Deposit,
            Self::Withdraw { .. } => AuditKind::Withdraw,
            Self::RewardsRecorded { .. } => AuditKind::RewardsRecorded,
            Self::DelegationRecorded { .. } => AuditKind::DelegationRecorded,
            Self::CapitalMoved { .. } => AuditKind::CapitalMoved,
            Self::RewardsHarvested { .. } => AuditKind::RewardsHarvested,
            Self::PauseChanged { .. } => AuditKind::PauseChanged,
            Self::MinimumDepositChanged { .. } => AuditKind::MinimumDepositChanged,
            Self::WorkerAdded { .. } => AuditKind::WorkerAdded,
            Self::WorkerRemoved { .. } => AuditKind::WorkerRemoved,
            Self::PerformanceUpdated { .. } => AuditKind::PerformanceUpdated,
            Self::StakeAllocationUpdated { .. } => AuditKind::StakeAllocationUpdated,
            Self::Rebalanced { .. } => AuditKind::Rebalanced,
            Self::WorkerPenalized { .. } => AuditKind::WorkerPenalized,
            Self::StrategyUpdated { .. } => AuditKind::StrategyUpdated,
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "DEPOSIT"),
            Self::Withdraw => write!(f, "WITHDRAW"),
            Self::RewardsRecorded => write!(f, "REWARDS_RECORDED"),
            Self::DelegationRecorded => write!(f, "DELEGATION_RECORDED"),
            Self::CapitalMoved => write!(f, "CAPITAL_MOVED"),
            Self::RewardsHarvested => write!(f, "REWARDS_HARVESTED"),
            Self::PauseChanged => write!(f, "PAUSE_CHANGED"),
            Self::MinimumDepositChanged => write!(f, "MINIMUM_DEPOSIT_CHANGED"),
            Self::WorkerAdded => write!(f, "WORKER_ADDED"),
            Self::WorkerRemoved => write!(f, "WORKER_REMOVED"),
            Self::PerformanceUpdated => write!(f, "PERFORMANCE_UPDATED"),
            Self::StakeAllocationUpdated => write!(f, "STAKE_ALLOCATION_UPDATED"),
            Self::Rebalanced => write!(f, "REBALANCED"),
            Self::WorkerPenalized => write!(f, "WORKER_PENALIZED"),
            Self::StrategyUpdated => write!(f, "STRATEGY_UPDATED"),
        }
    }
}
