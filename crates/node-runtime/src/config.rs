//! # Node Configuration
//!
//! Unified configuration for the pipeline stages and the runtime around them.
//!
//! Defaults are production values. `NodeConfig::from_env` applies `HG_*`
//! overrides on top of them.

use hg_01_event_intake::IntakeConfig;
use hg_03_consensus::ConsensusConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub intake: IntakeConfig,
    pub consensus: ConsensusConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Async wiring configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of the bounded command channel feeding the pipeline task.
    pub channel_capacity: usize,
    /// Capacity of the channel carrying consensus rounds to the application.
    pub round_channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            round_channel_capacity: 64,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when neither `HG_LOG_LEVEL` nor `RUST_LOG` is set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("rounds_expired ({expired}) must not be below rounds_non_ancient ({non_ancient})")]
    ExpiredBeforeAncient { expired: u64, non_ancient: u64 },

    #[error("digest_length {0} does not match the event hash length {1}")]
    DigestLength(usize, usize),
}

impl NodeConfig {
    /// Defaults with `HG_*` environment overrides applied.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        override_from_env("HG_MAX_TRANSACTION_BYTES", &mut config.intake.max_transaction_bytes_per_event);
        override_from_env("HG_ROUNDS_NON_ANCIENT", &mut config.consensus.rounds_non_ancient);
        override_from_env("HG_ROUNDS_EXPIRED", &mut config.consensus.rounds_expired);
        override_from_env("HG_COIN_FREQ", &mut config.consensus.coin_freq);
        override_from_env("HG_CHANNEL_CAPACITY", &mut config.pipeline.channel_capacity);
        override_from_env("HG_ROUND_CHANNEL_CAPACITY", &mut config.pipeline.round_channel_capacity);
        override_from_env("HG_LOG_JSON", &mut config.logging.json);
        if let Ok(level) = std::env::var("HG_LOG_LEVEL") {
            config.logging.level = level;
        }
        config
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("rounds_non_ancient", self.consensus.rounds_non_ancient as usize),
            ("coin_freq", self.consensus.coin_freq as usize),
            ("channel_capacity", self.pipeline.channel_capacity),
            ("round_channel_capacity", self.pipeline.round_channel_capacity),
            ("max_transaction_bytes_per_event", self.intake.max_transaction_bytes_per_event),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Zero { field: *field });
        }
        if self.consensus.rounds_expired < self.consensus.rounds_non_ancient {
            return Err(ConfigError::ExpiredBeforeAncient {
                expired: self.consensus.rounds_expired,
                non_ancient: self.consensus.rounds_non_ancient,
            });
        }
        if self.intake.digest_length != shared_types::DIGEST_LENGTH {
            return Err(ConfigError::DigestLength(
                self.intake.digest_length,
                shared_types::DIGEST_LENGTH,
            ));
        }
        Ok(())
    }
}

/// Replace `target` with the parsed value of `key` when it is set.
///
/// Unparseable values are ignored with a warning.
pub fn override_from_env<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => warn!(key, value = %raw, "Ignoring unparseable environment override"),
        }
    }
}
