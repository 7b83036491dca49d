//! Rebalance strategy parameters

use serde::{Deserialize, Serialize};

use crate::core::{PoolError, PoolResult, BPS_DENOMINATOR};
use crate::validators::{MAX_PERFORMANCE_SCORE, MAX_UPTIME_PERCENT};

/// Strategy governing eligibility, drift tolerance and cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceStrategy {
    /// Minimum performance score (0-1000) to receive allocation
    pub performance_threshold: u16,
    /// Minimum uptime (0-100%) to receive allocation
    pub uptime_threshold: u8,
    /// Drift (basis points) tolerated before rebalancing
    pub max_deviation_bps: u64,
    /// Epochs between rebalances; 0 disables the cooldown
    pub rebalance_frequency_epochs: u64,
}

impl Default for RebalanceStrategy {
    fn default() -> Self {
        Self {
            performance_threshold: 500,
            uptime_threshold: 90,
            max_deviation_bps: 500,
            rebalance_frequency_epochs: 1,
        }
    }
}

impl RebalanceStrategy {
    pub fn validate(&self) -> PoolResult<()> {
        if self.performance_threshold > MAX_PERFORMANCE_SCORE {
            return Err(PoolError::OutOfRange {
                field: "performance_threshold",
                value: self.performance_threshold as u64,
                max: MAX_PERFORMANCE_SCORE as u64,
            });
        }
        if self.uptime_threshold > MAX_UPTIME_PERCENT {
            return Err(PoolError::OutOfRange {
                field: "uptime_threshold",
                value: self.uptime_threshold as u64,
                max: MAX_UPTIME_PERCENT as u64,
            });
        }
        if self.max_deviation_bps > BPS_DENOMINATOR {
            return Err(PoolError::OutOfRange {
                field: "max_deviation_bps",
                value: self.max_deviation_bps,
                max: BPS_DENOMINATOR,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RebalanceStrategy::default().validate().is_ok());
    }

    #[test]
    fn test_bounds_enforced() {
        let s = RebalanceStrategy {
            performance_threshold: 1_001,
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(PoolError::OutOfRange { field: "performance_threshold", .. })));

        let s = RebalanceStrategy {
            max_deviation_bps: 10_001,
            ..Default::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s: RebalanceStrategy = serde_json::from_str(r#"{"max_deviation_bps": 250}"#).unwrap();
        assert_eq!(s.max_deviation_bps, 250);
        assert_eq!(s.performance_threshold, 500);
    }
}
