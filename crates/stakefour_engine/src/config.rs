//! # Engine Configuration
//!
//! Stake bounds and outbox sizing, loaded once at startup from TOML.
//!
//! ```toml
//! min_stake = 1
//! max_stake = 2000000000000000000
//! subscriber_buffer = 1024
//! ```

use std::path::Path;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Default upper bound on a single stake: 2 ether in wei.
pub const DEFAULT_MAX_STAKE: u64 = 2_000_000_000_000_000_000;

/// Default capacity of each subscriber channel.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 1024;

/// Engine configuration.
///
/// Stakes are expressed in wei. TOML integers are 64-bit, which covers
/// every realistic bound.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Smallest accepted stake. Must be at least 1.
    pub min_stake: u64,
    /// Largest accepted stake.
    pub max_stake: u64,
    /// Capacity of each subscriber channel in the outbox.
    pub subscriber_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_stake: 1,
            max_stake: DEFAULT_MAX_STAKE,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

impl EngineConfig {
    /// Creates a config with the given stake bounds and default buffering.
    #[must_use]
    pub fn with_stakes(min_stake: u64, max_stake: u64) -> Self {
        Self {
            min_stake,
            max_stake,
            ..Self::default()
        }
    }

    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks the invariants between fields.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] describing the first violation.
    pub fn validate(&self) -> EngineResult<()> {
        if self.min_stake == 0 {
            return Err(EngineError::InvalidConfig(
                "min_stake must be at least 1".to_string(),
            ));
        }
        if self.min_stake > self.max_stake {
            return Err(EngineError::InvalidConfig(format!(
                "min_stake {} exceeds max_stake {}",
                self.min_stake, self.max_stake
            )));
        }
        if self.subscriber_buffer == 0 {
            return Err(EngineError::InvalidConfig(
                "subscriber_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Minimum stake as a wei amount.
    #[inline]
    #[must_use]
    pub fn min_stake_wei(&self) -> U256 {
        U256::from(self.min_stake)
    }

    /// Maximum stake as a wei amount.
    #[inline]
    #[must_use]
    pub fn max_stake_wei(&self) -> U256 {
        U256::from(self.max_stake)
    }
}
