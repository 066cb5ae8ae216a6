//! # Event Entities
//!
//! The gossiped event and its locally derived wrapper.
//!
//! ## Clusters
//!
//! - **Identity**: `NodeId`, `EventHash`, `EventDescriptor`
//! - **Wire Shape**: `EventCore`, `GossipEvent`
//! - **Local View**: `PlatformEvent`, `EventOrigin`

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::hashing::hash_gossip_event;

// =============================================================================
// IDENTITY
// =============================================================================

/// Identifier of a roster member.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Digest of an event's canonical encoding.
///
/// Kept as a byte vector rather than a fixed array: parent references arrive
/// from untrusted peers and their length is checked by intake validation.
#[serde_as]
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct EventHash(#[serde_as(as = "Bytes")] pub Vec<u8>);

impl EventHash {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short hex prefix for log output.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..self.0.len().min(4)])
    }
}

impl fmt::Debug for EventHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHash({})", self.short())
    }
}

impl fmt::Display for EventHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// Wall-clock instant in nanoseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn as_nanos(self) -> u64 {
        self.0
    }

    pub fn plus_nanos(self, nanos: u64) -> Self {
        Timestamp(self.0.saturating_add(nanos))
    }
}

/// The handle other events use to reference an event as a parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub hash: EventHash,
    pub creator: NodeId,
    pub birth_round: u64,
}

impl EventDescriptor {
    pub fn new(hash: EventHash, creator: NodeId, birth_round: u64) -> Self {
        Self {
            hash,
            creator,
            birth_round,
        }
    }
}

// =============================================================================
// WIRE SHAPE
// =============================================================================

/// Creator-supplied metadata of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCore {
    pub creator_id: NodeId,
    pub birth_round: u64,
    /// Absent only for malformed input; intake validation rejects it.
    pub time_created: Option<Timestamp>,
}

/// An event exactly as delivered by gossip or local creation.
///
/// `parents` may contain `None` entries when a peer sent a malformed
/// reference; such events never pass intake validation.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GossipEvent {
    pub core: EventCore,
    pub parents: Vec<Option<EventDescriptor>>,
    pub transactions: Vec<Vec<u8>>,
    #[serde_as(as = "Bytes")]
    pub signature: Vec<u8>,
}

// =============================================================================
// LOCAL VIEW
// =============================================================================

/// Where an event entered this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventOrigin {
    /// Received from a peer. Signature must be verified.
    Gossip,
    /// Created by this node at runtime. Signature is trusted.
    Runtime,
}

/// A hashed event as it travels through the pipeline.
///
/// The hash and descriptor are fixed at construction. The generation
/// number is attached once by the orphan buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEvent {
    gossip: GossipEvent,
    origin: EventOrigin,
    descriptor: EventDescriptor,
    n_gen: Option<u64>,
}

impl PlatformEvent {
    pub fn new(gossip: GossipEvent, origin: EventOrigin) -> Self {
        let hash = hash_gossip_event(&gossip);
        let descriptor = EventDescriptor::new(hash, gossip.core.creator_id, gossip.core.birth_round);
        Self {
            gossip,
            origin,
            descriptor,
            n_gen: None,
        }
    }

    pub fn gossip_event(&self) -> &GossipEvent {
        &self.gossip
    }

    pub fn origin(&self) -> EventOrigin {
        self.origin
    }

    pub fn hash(&self) -> &EventHash {
        &self.descriptor.hash
    }

    pub fn descriptor(&self) -> &EventDescriptor {
        &self.descriptor
    }

    pub fn creator_id(&self) -> NodeId {
        self.gossip.core.creator_id
    }

    pub fn birth_round(&self) -> u64 {
        self.gossip.core.birth_round
    }

    pub fn time_created(&self) -> Option<Timestamp> {
        self.gossip.core.time_created
    }

    pub fn signature(&self) -> &[u8] {
        &self.gossip.signature
    }

    pub fn transactions(&self) -> &[Vec<u8>] {
        &self.gossip.transactions
    }

    pub fn transaction_count(&self) -> usize {
        self.gossip.transactions.len()
    }

    /// Raw parent list, including malformed `None` entries.
    pub fn parent_slots(&self) -> &[Option<EventDescriptor>] {
        &self.gossip.parents
    }

    /// All well-formed parent descriptors, in declaration order.
    pub fn all_parents(&self) -> impl Iterator<Item = &EventDescriptor> {
        self.gossip.parents.iter().flatten()
    }

    /// The first parent created by this event's creator.
    pub fn self_parent(&self) -> Option<&EventDescriptor> {
        let creator = self.creator_id();
        self.all_parents().find(|p| p.creator == creator)
    }

    /// Every parent except the self-parent.
    pub fn other_parents(&self) -> impl Iterator<Item = &EventDescriptor> {
        let self_parent_hash = self.self_parent().map(|p| p.hash.clone());
        let mut skipped = false;
        self.all_parents().filter(move |p| {
            if !skipped && Some(&p.hash) == self_parent_hash.as_ref() {
                skipped = true;
                return false;
            }
            true
        })
    }

    pub fn has_parents(&self) -> bool {
        self.all_parents().next().is_some()
    }

    /// Highest birth round among the parents, if any.
    pub fn max_parent_birth_round(&self) -> Option<u64> {
        self.all_parents().map(|p| p.birth_round).max()
    }

    pub fn n_gen(&self) -> Option<u64> {
        self.n_gen
    }

    /// Attach the generation number. Called once by the orphan buffer.
    pub fn set_n_gen(&mut self, n_gen: u64) {
        debug_assert!(self.n_gen.is_none(), "nGen is written exactly once");
        self.n_gen = Some(n_gen);
    }
}

impl fmt::Display for PlatformEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({} br={} {})",
            self.creator_id(),
            self.birth_round(),
            self.hash().short()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(byte: u8, creator: u64, birth_round: u64) -> EventDescriptor {
        EventDescriptor::new(EventHash(vec![byte; 48]), NodeId(creator), birth_round)
    }

    fn event(parents: Vec<Option<EventDescriptor>>) -> PlatformEvent {
        PlatformEvent::new(
            GossipEvent {
                core: EventCore {
                    creator_id: NodeId(1),
                    birth_round: 3,
                    time_created: Some(Timestamp(10)),
                },
                parents,
                transactions: vec![b"tx".to_vec()],
                signature: vec![7; 64],
            },
            EventOrigin::Gossip,
        )
    }

    #[test]
    fn test_self_parent_is_first_parent_by_same_creator() {
        let e = event(vec![
            Some(descriptor(1, 2, 1)),
            Some(descriptor(2, 1, 2)),
            Some(descriptor(3, 3, 1)),
        ]);

        assert_eq!(e.self_parent(), Some(&descriptor(2, 1, 2)));
        let others: Vec<_> = e.other_parents().cloned().collect();
        assert_eq!(others, vec![descriptor(1, 2, 1), descriptor(3, 3, 1)]);
    }

    #[test]
    fn test_identical_self_and_other_parent_keeps_one_other() {
        let e = event(vec![Some(descriptor(1, 1, 1)), Some(descriptor(1, 1, 1))]);

        assert_eq!(e.self_parent(), Some(&descriptor(1, 1, 1)));
        assert_eq!(e.other_parents().count(), 1);
    }

    #[test]
    fn test_descriptor_derived_from_core() {
        let e = event(vec![]);
        assert_eq!(e.descriptor().creator, NodeId(1));
        assert_eq!(e.descriptor().birth_round, 3);
        assert_eq!(e.hash().len(), crate::DIGEST_LENGTH);
        assert!(!e.has_parents());
        assert_eq!(e.max_parent_birth_round(), None);
    }

    #[test]
    fn test_null_parent_slots_are_skipped_by_iterators() {
        let e = event(vec![None, Some(descriptor(4, 2, 5))]);
        assert_eq!(e.parent_slots().len(), 2);
        assert_eq!(e.all_parents().count(), 1);
        assert_eq!(e.max_parent_birth_round(), Some(5));
    }

    #[test]
    fn test_gossip_event_serde_preserves_hash() {
        let e = event(vec![Some(descriptor(9, 2, 2))]);
        let json = serde_json::to_string(e.gossip_event()).unwrap();
        let decoded: GossipEvent = serde_json::from_str(&json).unwrap();
        let rebuilt = PlatformEvent::new(decoded, EventOrigin::Gossip);
        assert_eq!(rebuilt.hash(), e.hash());
    }
}
