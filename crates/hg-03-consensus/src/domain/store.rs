//! # Event Store
//!
//! Arena of linked events. Parent references are [`EventId`]s into the arena,
//! never owning pointers, so diamonds in the DAG need no shared ownership.
//! Events are removed only by [`EventStore::prune_below`]; a reference to a
//! pruned event simply fails to resolve and is treated as ancient.

use std::collections::HashMap;
use std::sync::Arc;

use shared_types::{EventHash, NodeId, PlatformEvent, Timestamp};

/// Arena index of a linked event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

/// Per-event state of the voting algorithm. Reset on every recalculation.
///
/// Vectors are indexed by roster position. An empty vector means "not yet
/// computed".
#[derive(Debug, Clone, Default)]
pub struct ConsensusMetadata {
    /// `None` until computed.
    pub round_created: Option<u64>,
    /// Generation counted only through non-consensus, non-ancient ancestors.
    /// Zero while not computed and for retired events.
    pub de_gen: u64,
    pub witness: bool,
    pub famous: bool,
    pub last_see: Vec<Option<EventId>>,
    pub strongly_see_p: Vec<Option<EventId>>,
    pub first_self_witness_s: Option<EventId>,
    pub first_witness_s: Option<EventId>,
    /// Votes on the current election's candidates, by candidate index.
    pub votes: Vec<bool>,
}

/// A DAG node.
#[derive(Debug, Clone)]
pub struct LinkedEvent {
    event: Arc<PlatformEvent>,
    /// Self-parent first when present, then other parents.
    parents: Vec<EventId>,
    has_self_parent: bool,
    pub(crate) meta: ConsensusMetadata,
    pub(crate) round_received: Option<u64>,
}

impl LinkedEvent {
    pub fn event(&self) -> &Arc<PlatformEvent> {
        &self.event
    }

    pub fn hash(&self) -> &EventHash {
        self.event.hash()
    }

    pub fn creator_id(&self) -> NodeId {
        self.event.creator_id()
    }

    pub fn birth_round(&self) -> u64 {
        self.event.birth_round()
    }

    pub fn time_created(&self) -> Timestamp {
        self.event.time_created().unwrap_or_default()
    }

    /// Deterministic generation as of the latest recalculation.
    pub fn de_gen(&self) -> u64 {
        self.meta.de_gen
    }

    pub fn self_parent(&self) -> Option<EventId> {
        if self.has_self_parent {
            self.parents.first().copied()
        } else {
            None
        }
    }

    pub fn all_parents(&self) -> &[EventId] {
        &self.parents
    }

    pub fn is_consensus(&self) -> bool {
        self.round_received.is_some()
    }

    pub fn round_received(&self) -> Option<u64> {
        self.round_received
    }

    pub fn metadata(&self) -> &ConsensusMetadata {
        &self.meta
    }
}

/// Arena of linked events with a hash index.
#[derive(Debug, Default)]
pub struct EventStore {
    events: HashMap<EventId, LinkedEvent>,
    by_hash: HashMap<EventHash, EventId>,
    next_id: u64,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        event: Arc<PlatformEvent>,
        self_parent: Option<EventId>,
        other_parents: Vec<EventId>,
    ) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;

        let has_self_parent = self_parent.is_some();
        let mut parents = Vec::with_capacity(other_parents.len() + 1);
        parents.extend(self_parent);
        parents.extend(other_parents);

        self.by_hash.insert(event.hash().clone(), id);
        self.events.insert(
            id,
            LinkedEvent {
                event,
                parents,
                has_self_parent,
                meta: ConsensusMetadata::default(),
                round_received: None,
            },
        );
        id
    }

    pub fn get(&self, id: EventId) -> Option<&LinkedEvent> {
        self.events.get(&id)
    }

    pub fn get_mut(&mut self, id: EventId) -> Option<&mut LinkedEvent> {
        self.events.get_mut(&id)
    }

    pub fn id_of(&self, hash: &EventHash) -> Option<EventId> {
        self.by_hash.get(hash).copied()
    }

    /// Remove every event whose birth round is below `threshold`.
    pub fn prune_below(&mut self, threshold: u64) -> usize {
        let before = self.events.len();
        self.events.retain(|_, e| e.birth_round() >= threshold);
        let events = &self.events;
        self.by_hash.retain(|_, id| events.contains_key(id));
        before - self.events.len()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.by_hash.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::testing::TestingEventBuilder;

    #[test]
    fn test_insert_orders_self_parent_first() {
        let mut store = EventStore::new();
        let a = store.insert(Arc::new(TestingEventBuilder::new(NodeId(0)).build()), None, vec![]);
        let b = store.insert(Arc::new(TestingEventBuilder::new(NodeId(1)).build()), None, vec![]);
        let c_event = TestingEventBuilder::new(NodeId(0)).transactions(vec![vec![1]]).build();
        let c = store.insert(Arc::new(c_event.clone()), Some(a), vec![b]);

        let linked = store.get(c).unwrap();
        assert_eq!(linked.self_parent(), Some(a));
        assert_eq!(linked.all_parents(), &[a, b]);
        assert_eq!(store.id_of(c_event.hash()), Some(c));
        assert_eq!(store.get(b).unwrap().self_parent(), None);
    }

    #[test]
    fn test_prune_removes_from_both_indexes() {
        let mut store = EventStore::new();
        let old = TestingEventBuilder::new(NodeId(0)).birth_round(2).build();
        let new = TestingEventBuilder::new(NodeId(0)).birth_round(5).build();
        store.insert(Arc::new(old.clone()), None, vec![]);
        store.insert(Arc::new(new.clone()), None, vec![]);

        assert_eq!(store.prune_below(3), 1);
        assert_eq!(store.len(), 1);
        assert!(store.id_of(old.hash()).is_none());
        assert!(store.id_of(new.hash()).is_some());
    }
}
