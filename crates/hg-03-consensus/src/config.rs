//! Consensus configuration.

use serde::{Deserialize, Serialize};

/// Tunables of the voting algorithm and the event window it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Rounds behind the latest decided round that are still non-ancient.
    pub rounds_non_ancient: u64,
    /// Rounds behind the latest decided round that are still non-expired.
    pub rounds_expired: u64,
    /// Every `coin_freq`-th voting round is a coin round.
    pub coin_freq: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            rounds_non_ancient: 26,
            rounds_expired: 500,
            coin_freq: 12,
        }
    }
}

impl ConsensusConfig {
    /// Oldest round that is still within `window` rounds of `latest_decided`.
    pub(crate) fn oldest_round_within(latest_decided: u64, window: u64) -> u64 {
        (latest_decided + 1)
            .saturating_sub(window)
            .max(shared_types::ROUND_FIRST)
    }
}
