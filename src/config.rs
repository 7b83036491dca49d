//! Protocol configuration
//!
//! One JSON document holding the vault, registry and strategy settings.
//! Missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::core::{PoolError, BPS_DENOMINATOR};
use crate::rebalance::RebalanceStrategy;
use crate::validators::{RegistryConfig, MAX_UPTIME_PERCENT};
use crate::vault::VaultConfig;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(#[from] PoolError),
}

/// Full protocol configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub vault: VaultConfig,
    pub registry: RegistryConfig,
    pub strategy: RebalanceStrategy,
}

impl ProtocolConfig {
    /// Check every bound
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.max_workers == 0 {
            return Err(PoolError::invalid_state("max_workers must be at least 1").into());
        }
        if self.registry.min_uptime_threshold > MAX_UPTIME_PERCENT {
            return Err(PoolError::OutOfRange {
                field: "min_uptime_threshold",
                value: self.registry.min_uptime_threshold as u64,
                max: MAX_UPTIME_PERCENT as u64,
            }
            .into());
        }
        if self.registry.max_stake_share_bps == 0 || self.registry.max_stake_share_bps > BPS_DENOMINATOR {
            return Err(PoolError::OutOfRange {
                field: "max_stake_share_bps",
                value: self.registry.max_stake_share_bps,
                max: BPS_DENOMINATOR,
            }
            .into());
        }
        self.strategy.validate()?;
        Ok(())
    }

    /// Load and validate a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate and write as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        info!("Saved config to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");

        let mut config = ProtocolConfig::default();
        config.vault.minimum_deposit = 42;
        config.strategy.max_deviation_bps = 250;
        config.save(&path).unwrap();

        assert_eq!(ProtocolConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"registry": {"max_workers": 7}}"#).unwrap();

        let config = ProtocolConfig::load(&path).unwrap();
        assert_eq!(config.registry.max_workers, 7);
        assert_eq!(config.registry.min_uptime_threshold, 80);
        assert_eq!(config.vault, VaultConfig::default());
        assert_eq!(config.strategy, RebalanceStrategy::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"strategy": {"uptime_threshold": 150}}"#).unwrap();
        assert!(matches!(ProtocolConfig::load(&path), Err(ConfigError::Invalid(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(ProtocolConfig::load(&path), Err(ConfigError::Parse(_))));

        assert!(matches!(
            ProtocolConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_share_cap_bounds() {
        let mut config = ProtocolConfig::default();
        config.registry.max_stake_share_bps = 0;
        assert!(config.validate().is_err());
        config.registry.max_stake_share_bps = 10_000;
        assert!(config.validate().is_ok());
    }
}
