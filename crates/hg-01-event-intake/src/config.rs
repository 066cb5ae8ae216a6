//! Intake configuration.

use serde::{Deserialize, Serialize};
use shared_types::DIGEST_LENGTH;

/// Configuration for event intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Upper bound on the summed size of all transactions in one event.
    pub max_transaction_bytes_per_event: usize,
    /// Expected length of every parent hash.
    pub digest_length: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_transaction_bytes_per_event: 245_760,
            digest_length: DIGEST_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IntakeConfig::default();
        assert_eq!(config.max_transaction_bytes_per_event, 245_760);
        assert_eq!(config.digest_length, 48);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: IntakeConfig =
            serde_json::from_str(r#"{"max_transaction_bytes_per_event": 10}"#).unwrap();
        assert_eq!(config.max_transaction_bytes_per_event, 10);
        assert_eq!(config.digest_length, DIGEST_LENGTH);
    }
}
