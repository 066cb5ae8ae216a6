//! # Event Pipeline
//!
//! The single-owner sequential chain every replica runs:
//!
//! ```text
//! event ─► EventIntakeProcessor ─► OrphanBuffer ─► ConsensusEngine ─► [ConsensusRound]
//!               ▲                       ▲                │
//!               └───────────────────────┴── EventWindow ◄┘
//! ```
//!
//! Each decided round's window is handed back to intake and the orphan
//! buffer before the next released event reaches consensus.

use std::collections::VecDeque;
use std::sync::Arc;

use hg_01_event_intake::{
    DefaultEventIntakeProcessor, Ed25519VerifierFactory, EventIntakeApi, IntakeDependencies,
    IntakeEventCounter, InternalEventValidator,
};
use hg_02_orphan_buffer::OrphanBuffer;
use hg_03_consensus::{ConsensusApi, ConsensusEngine, ConsensusError};
use shared_types::{
    ConsensusRound, ConsensusSnapshot, EventWindow, PlatformEvent, RosterHistory, RosterHistoryCell,
};
use tracing::{debug, info};

use crate::config::NodeConfig;

/// Intake, orphan buffer and consensus for one replica.
pub struct EventPipeline {
    intake: DefaultEventIntakeProcessor,
    orphans: OrphanBuffer,
    engine: ConsensusEngine,
    counter: Arc<IntakeEventCounter>,
}

impl EventPipeline {
    /// Build a pipeline. Intake and consensus resolve rosters from the same
    /// history.
    pub fn new(config: &NodeConfig, history: RosterHistory) -> Self {
        let history = Arc::new(history);
        let roster = Arc::clone(history.current_roster());
        let counter = Arc::new(IntakeEventCounter::new());
        let intake = DefaultEventIntakeProcessor::new(IntakeDependencies {
            validator: Arc::new(InternalEventValidator::new(
                config.intake.clone(),
                Arc::clone(&counter),
            )),
            verifier_factory: Arc::new(Ed25519VerifierFactory),
            roster_history: Arc::new(RosterHistoryCell::new((*history).clone())),
            counter: Arc::clone(&counter),
        });
        info!(
            rosters = history.pairs().len(),
            members = roster.len(),
            total_weight = roster.total_weight(),
            "Event pipeline created"
        );

        Self {
            intake,
            orphans: OrphanBuffer::new(),
            engine: ConsensusEngine::new(config.consensus.clone(), history),
            counter,
        }
    }

    /// Push one hashed event through every stage.
    ///
    /// Returns the rounds it caused to be decided, oldest first. Discards are
    /// not errors; only a broken linker invariant is.
    pub fn submit(&mut self, event: PlatformEvent) -> Result<Vec<ConsensusRound>, ConsensusError> {
        let Some(event) = self.intake.process_hashed_event(event) else {
            return Ok(Vec::new());
        };

        let mut ready: VecDeque<PlatformEvent> = self.orphans.handle_event(event).into();
        let mut rounds = Vec::new();
        while let Some(next) = ready.pop_front() {
            let decided = self.engine.add_event(next)?;
            if let Some(last) = decided.last() {
                let window = last.event_window;
                self.intake.set_event_window(window);
                let released = self.orphans.set_event_window(window);
                if !released.is_empty() {
                    debug!(
                        released = released.len(),
                        ancient_threshold = window.ancient_threshold,
                        "Orphans released by advancing window"
                    );
                }
                ready.extend(released);
            }
            rounds.extend(decided);
        }
        Ok(rounds)
    }

    /// Replace the roster history of intake and consensus together. Events
    /// already linked keep the roster they were validated against.
    pub fn update_roster_history(&mut self, history: RosterHistory) {
        let history = Arc::new(history);
        info!(rosters = history.pairs().len(), "Updating roster history");
        self.intake.update_roster_history(Arc::clone(&history));
        self.engine.update_roster_history(history);
    }

    /// Reset every stage and resume consensus from `snapshot`.
    pub fn load_snapshot(&mut self, snapshot: &ConsensusSnapshot) {
        self.intake.clear();
        self.orphans.clear();
        let window = self.engine.load_snapshot(snapshot);
        self.intake.set_event_window(window);
        self.orphans.set_event_window(window);
        info!(
            round = snapshot.round,
            ancient_threshold = window.ancient_threshold,
            "Event pipeline resumed from snapshot"
        );
    }

    pub fn event_window(&self) -> EventWindow {
        self.engine.event_window()
    }

    /// Linked events that have not reached consensus.
    pub fn pre_consensus_events(&self) -> Vec<Arc<PlatformEvent>> {
        self.engine.pre_consensus_events()
    }

    pub fn counter(&self) -> &Arc<IntakeEventCounter> {
        &self.counter
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.orphan_count()
    }

    pub fn engine(&self) -> &ConsensusEngine {
        &self.engine
    }

    /// Reset every stateful stage.
    pub fn clear(&mut self) {
        info!("Clearing event pipeline");
        self.intake.clear();
        self.orphans.clear();
        self.engine.clear();
    }
}
