//! # Consensus Engine
//!
//! Owns the linked DAG and the voting state, and keeps the linker's window in
//! step with the rounds it decides.
//!
//! ```text
//! released event ─► ConsensusLinker ─► Consensus ─► [ConsensusRound]
//!                        ▲                               │
//!                        └────── latest EventWindow ◄────┘
//! ```
//!
//! Every released event is linked. Membership was settled by intake against
//! the roster of the event's birth round; an event that is not a member of
//! that roster here is counted, linked and carries no vote weight.

use std::sync::Arc;

use shared_types::{ConsensusRound, ConsensusSnapshot, EventWindow, PlatformEvent, Roster, RosterHistory};
use tracing::{debug, warn};

use crate::config::ConsensusConfig;
use crate::domain::{Consensus, ConsensusLinker, ConsensusResult};
use crate::ports::inbound::ConsensusApi;


/// Links events and runs virtual voting over a roster history.
#[derive(Debug)]
pub struct ConsensusEngine {
    linker: ConsensusLinker,
    consensus: Consensus,
    non_member_events: u64,
}

impl ConsensusEngine {
    pub fn new(config: ConsensusConfig, history: Arc<RosterHistory>) -> Self {
        Self {
            linker: ConsensusLinker::new(),
            consensus: Consensus::new(config, history),
            non_member_events: 0,
        }
    }

    /// The roster votes are currently weighed by.
    pub fn roster(&self) -> &Arc<Roster> {
        self.consensus.roster()
    }

    /// Replace the roster history. Linked events keep their place in the DAG.
    pub fn update_roster_history(&mut self, history: Arc<RosterHistory>) {
        self.consensus.update_roster_history(history);
    }

    /// Drop every event and resume from `snapshot`.
    ///
    /// Returns the window the earlier stages must adopt. Rounds are decided
    /// again once every judge of the snapshot has been added.
    pub fn load_snapshot(&mut self, snapshot: &ConsensusSnapshot) -> EventWindow {
        self.linker.clear();
        self.consensus.load_snapshot(snapshot);
        let window = self.consensus.event_window();
        self.linker.set_event_window(window);
        window
    }

    pub fn waiting_for_init_judges(&self) -> bool {
        self.consensus.waiting_for_init_judges()
    }

    pub fn latest_decided_round(&self) -> u64 {
        self.consensus.latest_decided_round()
    }

    pub fn max_round(&self) -> u64 {
        self.consensus.max_round()
    }

    /// Events currently held in the linked DAG.
    pub fn linked_count(&self) -> usize {
        self.linker.store().len()
    }

    /// Linked events whose creator is absent from the roster of their birth
    /// round.
    pub fn non_member_events(&self) -> u64 {
        self.non_member_events
    }

    /// Parent links dropped by linker sanity checks.
    pub fn dropped_links(&self) -> u64 {
        self.linker.dropped_links()
    }
}

impl ConsensusApi for ConsensusEngine {
    fn add_event(&mut self, event: PlatformEvent) -> ConsensusResult<Vec<ConsensusRound>> {
        let member = self
            .consensus
            .roster_history()
            .roster_for_round(event.birth_round())
            .is_some_and(|roster| roster.contains(event.creator_id()));
        if !member {
            warn!(event = %event, "Creator is not in the roster of the event's birth round");
            self.non_member_events += 1;
        }

        let Some(id) = self.linker.link_event(event)? else {
            return Ok(Vec::new());
        };
        let rounds = self.consensus.add_event(self.linker.store_mut(), id);

        if let Some(last) = rounds.last() {
            debug!(
                decided = rounds.len(),
                ancient_threshold = last.event_window.ancient_threshold,
                "Advancing linker window"
            );
            self.linker.set_event_window(last.event_window);
        }
        Ok(rounds)
    }

    fn event_window(&self) -> EventWindow {
        self.consensus.event_window()
    }

    fn pre_consensus_events(&self) -> Vec<Arc<PlatformEvent>> {
        self.consensus.pre_consensus_events(self.linker.store())
    }

    fn clear(&mut self) {
        self.linker.clear();
        self.consensus.clear();
    }
}
