//! Descriptor-keyed deduplication cache.

use std::collections::{HashMap, HashSet};

use shared_types::{EventDescriptor, EventWindow, PlatformEvent};

/// Outcome of offering an event to the deduplicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// First time this descriptor is seen.
    New,
    /// Known descriptor carrying a signature not seen before.
    DisparateSignature,
    /// Known descriptor and known signature.
    Duplicate,
}

/// Remembers every signature seen per descriptor until the descriptor's birth
/// round becomes ancient.
#[derive(Debug, Default)]
pub struct EventDeduplicator {
    seen: HashMap<EventDescriptor, HashSet<Vec<u8>>>,
}

impl EventDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &PlatformEvent) -> DedupOutcome {
        match self.seen.get_mut(event.descriptor()) {
            None => {
                self.seen.insert(
                    event.descriptor().clone(),
                    HashSet::from([event.signature().to_vec()]),
                );
                DedupOutcome::New
            }
            Some(signatures) => {
                if signatures.insert(event.signature().to_vec()) {
                    DedupOutcome::DisparateSignature
                } else {
                    DedupOutcome::Duplicate
                }
            }
        }
    }

    /// Forget descriptors that are now ancient.
    pub fn set_event_window(&mut self, window: &EventWindow) {
        self.seen.retain(|descriptor, _| !window.is_ancient(descriptor));
    }

    /// Number of distinct descriptors tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}
