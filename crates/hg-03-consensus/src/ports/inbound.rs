//! Driving ports (Inbound API)

use std::sync::Arc;

use shared_types::{ConsensusRound, EventWindow, PlatformEvent};

use crate::domain::ConsensusResult;

/// Consensus engine API.
pub trait ConsensusApi {
    /// Link a released event and run virtual voting.
    ///
    /// The event must carry a generation number and every non-ancient parent
    /// must already have been added. Returns the rounds decided as a result,
    /// in increasing round order.
    fn add_event(&mut self, event: PlatformEvent) -> ConsensusResult<Vec<ConsensusRound>>;

    /// The window as of the latest decided round.
    fn event_window(&self) -> EventWindow;

    /// Linked events that have not reached consensus, in insertion order.
    fn pre_consensus_events(&self) -> Vec<Arc<PlatformEvent>>;

    /// Drop every event and return to genesis.
    fn clear(&mut self);
}
