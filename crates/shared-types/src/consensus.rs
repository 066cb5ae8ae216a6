//! # Consensus Output
//!
//! The event window fed back to earlier stages, and the finalized rounds
//! handed to the application.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{ROUND_FIRST, ROUND_NEGATIVE_INFINITY};
use crate::entities::{EventDescriptor, EventHash, NodeId, PlatformEvent, Timestamp};

/// The moving boundary below which events are no longer tracked.
///
/// All thresholds are birth rounds. `ancient_threshold` never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventWindow {
    /// The most recent round that has reached consensus.
    pub latest_consensus_round: u64,
    /// Birth round to stamp on newly created events.
    pub new_event_birth_round: u64,
    /// Events with a lower birth round are ancient.
    pub ancient_threshold: u64,
    /// Events with a lower birth round may be dropped from storage.
    pub expired_threshold: u64,
}

impl EventWindow {
    pub fn new(
        latest_consensus_round: u64,
        new_event_birth_round: u64,
        ancient_threshold: u64,
        expired_threshold: u64,
    ) -> Self {
        Self {
            latest_consensus_round,
            new_event_birth_round,
            ancient_threshold,
            expired_threshold,
        }
    }

    /// The window before any round has reached consensus.
    pub fn genesis() -> Self {
        Self::new(ROUND_NEGATIVE_INFINITY, ROUND_FIRST, ROUND_FIRST, ROUND_FIRST)
    }

    pub fn is_ancient_round(&self, birth_round: u64) -> bool {
        birth_round < self.ancient_threshold
    }

    pub fn is_ancient(&self, descriptor: &EventDescriptor) -> bool {
        self.is_ancient_round(descriptor.birth_round)
    }

    pub fn is_event_ancient(&self, event: &PlatformEvent) -> bool {
        self.is_ancient_round(event.birth_round())
    }
}

impl Default for EventWindow {
    fn default() -> Self {
        Self::genesis()
    }
}

/// Identifies one judge of a decided round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JudgeId {
    pub creator_id: NodeId,
    pub hash: EventHash,
}

/// Minimal consensus state as of a decided round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusSnapshot {
    pub round: u64,
    pub judge_ids: Vec<JudgeId>,
    /// Consensus order the next consensus event will receive.
    pub next_consensus_number: u64,
    /// The last consensus time handed out.
    pub consensus_timestamp: Timestamp,
}

/// An event together with its final position in the total order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusEvent {
    pub event: Arc<PlatformEvent>,
    pub round_received: u64,
    /// Globally increasing across all rounds.
    pub consensus_order: u64,
    /// Strictly increasing across all rounds.
    pub consensus_timestamp: Timestamp,
}

/// A finalized round. Never revised once emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusRound {
    pub round_number: u64,
    /// In consensus order.
    pub events: Vec<ConsensusEvent>,
    pub event_window: EventWindow,
    pub snapshot: ConsensusSnapshot,
}

impl ConsensusRound {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_window_has_nothing_ancient() {
        let window = EventWindow::genesis();
        assert!(!window.is_ancient_round(ROUND_FIRST));
        assert_eq!(window.new_event_birth_round, ROUND_FIRST);
    }

    #[test]
    fn test_ancient_is_strictly_below_threshold() {
        let window = EventWindow::new(30, 31, 5, 1);
        assert!(window.is_ancient_round(4));
        assert!(!window.is_ancient_round(5));
    }
}
