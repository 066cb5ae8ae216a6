//! # Consensus Linker
//!
//! Turns released events into arena nodes. Parents are resolved through the
//! store's hash index; ancient parents are not linked.

use std::collections::HashMap;
use std::sync::Arc;

use shared_types::{EventDescriptor, EventWindow, NodeId, PlatformEvent};
use tracing::{debug, warn};

use super::errors::LinkerError;
use super::store::{EventId, EventStore};

/// Links events into the [`EventStore`].
#[derive(Debug, Default)]
pub struct ConsensusLinker {
    store: EventStore,
    event_window: EventWindow,
    latest_by_creator: HashMap<NodeId, EventId>,
    dropped_links: u64,
}

impl ConsensusLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link an event whose non-ancient parents are already linked.
    ///
    /// Returns `Ok(None)` for ancient or already-linked events. A missing
    /// non-ancient parent is an upstream contract breach and is returned as
    /// an error.
    pub fn link_event(&mut self, event: PlatformEvent) -> Result<Option<EventId>, LinkerError> {
        if event.n_gen().is_none() {
            return Err(LinkerError::UnassignedGeneration(event.hash().clone()));
        }
        if self.event_window.is_event_ancient(&event) {
            debug!(event = %event, "Not linking ancient event");
            return Ok(None);
        }
        if self.store.id_of(event.hash()).is_some() {
            debug!(event = %event, "Event already linked");
            return Ok(None);
        }

        let self_parent = match event.self_parent() {
            Some(descriptor) => self.resolve_parent(&event, descriptor, true)?,
            None => None,
        };
        let mut other_parents = Vec::new();
        for descriptor in event.other_parents() {
            if let Some(id) = self.resolve_parent(&event, descriptor, false)? {
                if Some(id) != self_parent && !other_parents.contains(&id) {
                    other_parents.push(id);
                }
            }
        }

        let creator = event.creator_id();
        let time_created = event.time_created();
        let id = self.store.insert(Arc::new(event), self_parent, other_parents);

        let newer = match self.latest_by_creator.get(&creator).and_then(|id| self.store.get(*id)) {
            Some(latest) => time_created > latest.event().time_created(),
            None => true,
        };
        if newer {
            self.latest_by_creator.insert(creator, id);
        }
        Ok(Some(id))
    }

    fn resolve_parent(
        &mut self,
        child: &PlatformEvent,
        descriptor: &EventDescriptor,
        is_self_parent: bool,
    ) -> Result<Option<EventId>, LinkerError> {
        if self.event_window.is_ancient(descriptor) {
            return Ok(None);
        }
        let Some(id) = self.store.id_of(&descriptor.hash) else {
            return Err(LinkerError::MissingParent {
                child: child.hash().clone(),
                parent: descriptor.clone(),
            });
        };
        let Some(parent) = self.store.get(id) else {
            return Err(LinkerError::MissingParent {
                child: child.hash().clone(),
                parent: descriptor.clone(),
            });
        };

        if parent.event().descriptor() != descriptor {
            warn!(
                child = %child,
                parent = %parent.event(),
                claimed_birth_round = descriptor.birth_round,
                claimed_creator = %descriptor.creator,
                "Parent descriptor does not match linked event, dropping link"
            );
            self.dropped_links += 1;
            return Ok(None);
        }
        if is_self_parent && parent.event().time_created() >= child.time_created() {
            warn!(
                child = %child,
                parent = %parent.event(),
                "Self-parent was not created before child, dropping link"
            );
            self.dropped_links += 1;
            return Ok(None);
        }
        Ok(Some(id))
    }

    /// Adopt a new window and prune everything that became ancient.
    pub fn set_event_window(&mut self, window: EventWindow) {
        if window.ancient_threshold < self.event_window.ancient_threshold {
            return;
        }
        self.event_window = window;
        let pruned = self.store.prune_below(window.ancient_threshold);
        if pruned > 0 {
            debug!(pruned, threshold = window.ancient_threshold, "Pruned ancient events");
        }
        let store = &self.store;
        self.latest_by_creator.retain(|_, id| store.get(*id).is_some());
    }

    /// Most recent linked event by `creator`, by creation time.
    pub fn latest_event_by(&self, creator: NodeId) -> Option<EventId> {
        self.latest_by_creator.get(&creator).copied()
    }

    pub fn event_window(&self) -> &EventWindow {
        &self.event_window
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EventStore {
        &mut self.store
    }

    /// Parent links dropped because they failed sanity checks.
    pub fn dropped_links(&self) -> u64 {
        self.dropped_links
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.event_window = EventWindow::genesis();
        self.latest_by_creator.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::testing::{phantom_descriptor, TestingEventBuilder};
    use shared_types::Timestamp;

    fn with_gen(mut event: PlatformEvent, n_gen: u64) -> PlatformEvent {
        event.set_n_gen(n_gen);
        event
    }

    #[test]
    fn test_links_parents_and_tracks_latest() {
        let mut linker = ConsensusLinker::new();
        let a = TestingEventBuilder::new(NodeId(0)).build();
        let b = TestingEventBuilder::new(NodeId(1)).build();
        let c = TestingEventBuilder::new(NodeId(0)).self_parent(&a).other_parent(&b).build();

        let a_id = linker.link_event(with_gen(a, 1)).unwrap().unwrap();
        let b_id = linker.link_event(with_gen(b, 1)).unwrap().unwrap();
        let c_id = linker.link_event(with_gen(c, 2)).unwrap().unwrap();

        let linked = linker.store().get(c_id).unwrap();
        assert_eq!(linked.self_parent(), Some(a_id));
        assert_eq!(linked.all_parents(), &[a_id, b_id]);
        assert_eq!(linker.latest_event_by(NodeId(0)), Some(c_id));
    }

    #[test]
    fn test_requires_generation() {
        let mut linker = ConsensusLinker::new();
        let event = TestingEventBuilder::new(NodeId(0)).build();
        assert!(matches!(
            linker.link_event(event),
            Err(LinkerError::UnassignedGeneration(_))
        ));
    }

    #[test]
    fn test_ancient_event_not_linked() {
        let mut linker = ConsensusLinker::new();
        linker.set_event_window(EventWindow::new(30, 31, 5, 1));
        let event = TestingEventBuilder::new(NodeId(0)).birth_round(4).build();
        assert_eq!(linker.link_event(with_gen(event, 1)), Ok(None));
    }

    #[test]
    fn test_ancient_parent_not_linked() {
        let mut linker = ConsensusLinker::new();
        linker.set_event_window(EventWindow::new(30, 31, 5, 1));
        let event = TestingEventBuilder::new(NodeId(0))
            .parent_descriptor(phantom_descriptor(NodeId(0), 4, 1))
            .birth_round(5)
            .build();
        let id = linker.link_event(with_gen(event, 1)).unwrap().unwrap();
        assert!(linker.store().get(id).unwrap().all_parents().is_empty());
    }

    #[test]
    fn test_missing_parent_is_an_error() {
        let mut linker = ConsensusLinker::new();
        let event = TestingEventBuilder::new(NodeId(0))
            .parent_descriptor(phantom_descriptor(NodeId(1), 1, 1))
            .build();
        assert!(matches!(
            linker.link_event(with_gen(event, 2)),
            Err(LinkerError::MissingParent { .. })
        ));
    }

    #[test]
    fn test_mismatched_birth_round_parent_dropped() {
        let mut linker = ConsensusLinker::new();
        let parent = TestingEventBuilder::new(NodeId(1)).birth_round(2).build();
        let mut lying = parent.descriptor().clone();
        lying.birth_round = 1;
        let child = TestingEventBuilder::new(NodeId(0))
            .parent_descriptor(lying)
            .birth_round(2)
            .build();

        linker.link_event(with_gen(parent, 1)).unwrap();
        let id = linker.link_event(with_gen(child, 2)).unwrap().unwrap();
        assert!(linker.store().get(id).unwrap().all_parents().is_empty());
        assert_eq!(linker.dropped_links(), 1);
    }

    #[test]
    fn test_self_parent_created_later_dropped() {
        let mut linker = ConsensusLinker::new();
        let parent = TestingEventBuilder::new(NodeId(0))
            .time_created(Timestamp(500))
            .build();
        let child = TestingEventBuilder::new(NodeId(0))
            .self_parent(&parent)
            .time_created(Timestamp(500))
            .build();

        linker.link_event(with_gen(parent, 1)).unwrap();
        let id = linker.link_event(with_gen(child, 2)).unwrap().unwrap();
        assert_eq!(linker.store().get(id).unwrap().self_parent(), None);
        assert_eq!(linker.dropped_links(), 1);
    }

    #[test]
    fn test_window_prunes_store_and_latest() {
        let mut linker = ConsensusLinker::new();
        let event = TestingEventBuilder::new(NodeId(0)).birth_round(2).build();
        linker.link_event(with_gen(event, 1)).unwrap();

        linker.set_event_window(EventWindow::new(30, 31, 3, 1));
        assert!(linker.store().is_empty());
        assert_eq!(linker.latest_event_by(NodeId(0)), None);
    }
}
