//! # Event Intake Processor
//!
//! Stateful gate in front of the orphan buffer. Checks run in order and stop
//! at the first failure, cheapest first:
//!
//! ```text
//! event ─► ancient? ─► roster for birth round? ─► creator in roster?
//!       ─► field validation ─► dedup ─► signature (gossip origin only) ─► out
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use shared_types::{
    EventOrigin, EventWindow, NodeId, PlatformEvent, Roster, RosterHash, RosterHistory,
    RosterHistoryCell,
};
use tracing::{debug, trace};

use crate::domain::{DedupOutcome, DiscardReason, EventDeduplicator, IntakeEventCounter, VerifierError};
use crate::ports::inbound::EventIntakeApi;
use crate::ports::outbound::{BytesSignatureVerifier, EventFieldValidator, VerifierFactory};


/// Dependencies for [`EventIntakeProcessor`].
pub struct IntakeDependencies<V, F> {
    pub validator: Arc<V>,
    pub verifier_factory: Arc<F>,
    pub roster_history: Arc<RosterHistoryCell>,
    pub counter: Arc<IntakeEventCounter>,
}

/// Verifiers built for one roster history snapshot.
///
/// Rebuilt lazily whenever the published snapshot changes identity.
#[derive(Default)]
struct VerifierCache {
    snapshot: Option<Arc<RosterHistory>>,
    verifiers: HashMap<(RosterHash, NodeId), Arc<dyn BytesSignatureVerifier>>,
}

impl VerifierCache {
    fn sync(&mut self, history: &Arc<RosterHistory>) {
        let current = self
            .snapshot
            .as_ref()
            .is_some_and(|cached| Arc::ptr_eq(cached, history));
        if !current {
            self.verifiers.clear();
            self.snapshot = Some(Arc::clone(history));
        }
    }
}

/// Event Intake Processor
pub struct EventIntakeProcessor<V, F>
where
    V: EventFieldValidator,
    F: VerifierFactory,
{
    validator: Arc<V>,
    verifier_factory: Arc<F>,
    roster_history: Arc<RosterHistoryCell>,
    counter: Arc<IntakeEventCounter>,
    dedup: EventDeduplicator,
    event_window: EventWindow,
    verifiers: VerifierCache,
}

impl<V, F> EventIntakeProcessor<V, F>
where
    V: EventFieldValidator,
    F: VerifierFactory,
{
    pub fn new(deps: IntakeDependencies<V, F>) -> Self {
        Self {
            validator: deps.validator,
            verifier_factory: deps.verifier_factory,
            roster_history: deps.roster_history,
            counter: deps.counter,
            dedup: EventDeduplicator::new(),
            event_window: EventWindow::genesis(),
            verifiers: VerifierCache::default(),
        }
    }

    pub fn counter(&self) -> &Arc<IntakeEventCounter> {
        &self.counter
    }

    pub fn event_window(&self) -> &EventWindow {
        &self.event_window
    }

    /// Number of distinct descriptors in the dedup cache.
    pub fn dedup_len(&self) -> usize {
        self.dedup.len()
    }

    fn discard(&self, event: &PlatformEvent, reason: DiscardReason) -> Option<PlatformEvent> {
        debug!(
            creator = %event.creator_id(),
            birth_round = event.birth_round(),
            hash = %event.hash().short(),
            reason = reason.label(),
            "Discarding event at intake"
        );
        self.counter.record_discard(reason);
        None
    }

    fn verifier_for(
        &mut self,
        history: &Arc<RosterHistory>,
        roster: &Roster,
        creator: NodeId,
    ) -> Result<Arc<dyn BytesSignatureVerifier>, VerifierError> {
        self.verifiers.sync(history);
        let key = (roster.hash().clone(), creator);
        if let Some(verifier) = self.verifiers.verifiers.get(&key) {
            return Ok(Arc::clone(verifier));
        }

        let public_key = roster
            .entry(creator)
            .map(|e| e.public_key.as_slice())
            .unwrap_or_default();
        let verifier = self.verifier_factory.create(public_key)?;
        self.verifiers.verifiers.insert(key, Arc::clone(&verifier));
        Ok(verifier)
    }
}

impl<V, F> EventIntakeApi for EventIntakeProcessor<V, F>
where
    V: EventFieldValidator,
    F: VerifierFactory,
{
    fn process_hashed_event(&mut self, event: PlatformEvent) -> Option<PlatformEvent> {
        if self.event_window.is_event_ancient(&event) {
            return self.discard(&event, DiscardReason::Ancient);
        }

        let history = self.roster_history.load();
        let Some(roster) = history.roster_for_round(event.birth_round()) else {
            return self.discard(&event, DiscardReason::UnknownRoster);
        };
        if !roster.contains(event.creator_id()) {
            return self.discard(&event, DiscardReason::NonMember);
        }

        // The validator records its own discards.
        if self.validator.validate(&event, roster).is_err() {
            return None;
        }

        match self.dedup.observe(&event) {
            DedupOutcome::Duplicate => return self.discard(&event, DiscardReason::Duplicate),
            DedupOutcome::DisparateSignature => {
                debug!(
                    creator = %event.creator_id(),
                    hash = %event.hash().short(),
                    "Known event received with a different signature"
                );
                self.counter.record_disparate_signature();
            }
            DedupOutcome::New => {}
        }

        if event.origin() == EventOrigin::Runtime {
            trace!(hash = %event.hash().short(), "Skipping signature check for self event");
            return Some(event);
        }

        let verifier = match self.verifier_for(&history, roster, event.creator_id()) {
            Ok(verifier) => verifier,
            Err(err) => {
                debug!(creator = %event.creator_id(), "Unusable roster key: {}", err);
                return self.discard(&event, DiscardReason::NonMember);
            }
        };
        if !verifier.verify(event.hash().as_bytes(), event.signature()) {
            return self.discard(&event, DiscardReason::SignatureFailure);
        }

        Some(event)
    }

    fn set_event_window(&mut self, window: EventWindow) {
        if window.ancient_threshold < self.event_window.ancient_threshold {
            debug!(
                current = self.event_window.ancient_threshold,
                offered = window.ancient_threshold,
                "Ignoring event window that would lower the ancient threshold"
            );
            return;
        }
        self.event_window = window;
        self.dedup.set_event_window(&window);
    }

    fn update_roster_history(&mut self, history: Arc<RosterHistory>) {
        self.roster_history.store(history);
    }

    fn clear(&mut self) {
        self.dedup.clear();
        self.event_window = EventWindow::genesis();
        self.verifiers = VerifierCache::default();
    }
}
