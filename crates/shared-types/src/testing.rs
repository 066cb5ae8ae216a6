//! # Test Fixtures
//!
//! Deterministic signing keys, roster construction, a fluent event builder and
//! a seeded random DAG generator. Enabled by the `test-utils` feature.

use std::collections::HashMap;

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::constants::{FIRST_GENERATION, ROUND_FIRST};
use crate::entities::{
    EventCore, EventDescriptor, EventHash, EventOrigin, GossipEvent, NodeId, PlatformEvent,
    Timestamp,
};
use crate::hashing::hash_gossip_event;
use crate::roster::{Roster, RosterEntry, RosterHistory};

/// Nanoseconds in a millisecond.
const MILLIS: u64 = 1_000_000;

/// Deterministic Ed25519 key for a node.
pub fn signing_key(node_id: NodeId) -> SigningKey {
    let mut seed = [0xA5u8; 32];
    seed[..8].copy_from_slice(&node_id.0.to_be_bytes());
    SigningKey::from_bytes(&seed)
}

/// Sign the hash of `gossip` with `key`.
pub fn sign(key: &SigningKey, gossip: &GossipEvent) -> Vec<u8> {
    let hash = hash_gossip_event(gossip);
    key.sign(hash.as_bytes()).to_bytes().to_vec()
}

/// A roster with matching signing keys.
#[derive(Debug, Clone)]
pub struct TestNetwork {
    pub roster: Roster,
    keys: HashMap<NodeId, SigningKey>,
}

impl TestNetwork {
    /// `size` members with ids `0..size` and weight 1 each.
    pub fn new(size: usize) -> Self {
        Self::with_weights(&vec![1; size])
    }

    /// One member per weight, ids `0..weights.len()`.
    pub fn with_weights(weights: &[u64]) -> Self {
        Self::with_ids_and_weights(
            &weights
                .iter()
                .enumerate()
                .map(|(i, &w)| (NodeId(i as u64), w))
                .collect::<Vec<_>>(),
        )
    }

    pub fn with_ids_and_weights(members: &[(NodeId, u64)]) -> Self {
        let mut keys = HashMap::new();
        let entries = members
            .iter()
            .map(|&(node_id, weight)| {
                let key = signing_key(node_id);
                let public_key = key.verifying_key().to_bytes().to_vec();
                keys.insert(node_id, key);
                RosterEntry {
                    node_id,
                    weight,
                    public_key,
                }
            })
            .collect();
        let roster = Roster::new(entries).expect("test roster is valid");
        Self { roster, keys }
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.roster.entries().iter().map(|e| e.node_id).collect()
    }

    pub fn key(&self, node_id: NodeId) -> &SigningKey {
        &self.keys[&node_id]
    }

    pub fn history(&self) -> RosterHistory {
        RosterHistory::single(self.roster.clone())
    }

    /// This roster from the first round, then the same roster without
    /// `removed` from `effective_round` on.
    pub fn transition_history(&self, removed: &[NodeId], effective_round: u64) -> RosterHistory {
        let remaining = self
            .roster
            .entries()
            .iter()
            .filter(|e| !removed.contains(&e.node_id))
            .cloned()
            .collect();
        let next = Roster::new(remaining).expect("transition keeps a member");
        RosterHistory::from_rosters(vec![(ROUND_FIRST, self.roster.clone()), (effective_round, next)])
            .expect("effective round follows the first round")
    }
}

/// Fluent builder for individual test events.
#[derive(Debug, Clone)]
pub struct TestingEventBuilder {
    creator: NodeId,
    birth_round: Option<u64>,
    time_created: Option<Timestamp>,
    omit_time_created: bool,
    self_parent_time: Option<Timestamp>,
    parents: Vec<Option<EventDescriptor>>,
    transactions: Vec<Vec<u8>>,
    signature: Option<Vec<u8>>,
    key: Option<SigningKey>,
    origin: EventOrigin,
}

impl TestingEventBuilder {
    pub fn new(creator: NodeId) -> Self {
        Self {
            creator,
            birth_round: None,
            time_created: None,
            omit_time_created: false,
            self_parent_time: None,
            parents: Vec::new(),
            transactions: Vec::new(),
            signature: None,
            key: None,
            origin: EventOrigin::Gossip,
        }
    }

    pub fn birth_round(mut self, birth_round: u64) -> Self {
        self.birth_round = Some(birth_round);
        self
    }

    pub fn time_created(mut self, time_created: Timestamp) -> Self {
        self.time_created = Some(time_created);
        self
    }

    pub fn without_time_created(mut self) -> Self {
        self.omit_time_created = true;
        self
    }

    pub fn self_parent(mut self, parent: &PlatformEvent) -> Self {
        self.self_parent_time = parent.time_created();
        self.parents.push(Some(parent.descriptor().clone()));
        self
    }

    pub fn other_parent(mut self, parent: &PlatformEvent) -> Self {
        self.parents.push(Some(parent.descriptor().clone()));
        self
    }

    pub fn parent_descriptor(mut self, descriptor: EventDescriptor) -> Self {
        self.parents.push(Some(descriptor));
        self
    }

    pub fn null_parent(mut self) -> Self {
        self.parents.push(None);
        self
    }

    pub fn transactions(mut self, transactions: Vec<Vec<u8>>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn signed_by(mut self, key: &SigningKey) -> Self {
        self.key = Some(key.clone());
        self
    }

    pub fn origin(mut self, origin: EventOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn build(self) -> PlatformEvent {
        let birth_round = self.birth_round.unwrap_or_else(|| {
            self.parents
                .iter()
                .flatten()
                .map(|p| p.birth_round)
                .max()
                .unwrap_or(ROUND_FIRST)
        });
        let time_created = if self.omit_time_created {
            None
        } else {
            Some(self.time_created.unwrap_or_else(|| match self.self_parent_time {
                Some(t) => t.plus_nanos(MILLIS),
                None => Timestamp(1_000 * MILLIS),
            }))
        };

        let mut gossip = GossipEvent {
            core: EventCore {
                creator_id: self.creator,
                birth_round,
                time_created,
            },
            parents: self.parents,
            transactions: self.transactions,
            signature: Vec::new(),
        };
        gossip.signature = match (self.signature, &self.key) {
            (Some(sig), _) => sig,
            (None, Some(key)) => sign(key, &gossip),
            (None, None) => vec![0xAB; 64],
        };
        PlatformEvent::new(gossip, self.origin)
    }
}

/// A descriptor for an event that was never delivered.
pub fn phantom_descriptor(creator: NodeId, birth_round: u64, seed: u8) -> EventDescriptor {
    EventDescriptor::new(EventHash(vec![seed; crate::DIGEST_LENGTH]), creator, birth_round)
}

/// Seeded generator of random, validly signed hashgraphs.
///
/// Every generated event cites its creator's latest event as self-parent and
/// the latest event of one other random member as other-parent. Output is in
/// causal order.
#[derive(Debug)]
pub struct GraphGenerator {
    network: TestNetwork,
    rng: StdRng,
    latest: HashMap<NodeId, PlatformEvent>,
    clock: u64,
    birth_round_floor: u64,
    retired: Vec<NodeId>,
}

impl GraphGenerator {
    pub fn new(network: TestNetwork, seed: u64) -> Self {
        Self {
            network,
            rng: StdRng::seed_from_u64(seed),
            latest: HashMap::new(),
            clock: 1_000 * MILLIS,
            birth_round_floor: ROUND_FIRST,
            retired: Vec::new(),
        }
    }

    pub fn network(&self) -> &TestNetwork {
        &self.network
    }

    /// Stop creating events for `node_id` and stop citing its events.
    pub fn retire(&mut self, node_id: NodeId) {
        if !self.retired.contains(&node_id) {
            self.retired.push(node_id);
        }
        self.latest.remove(&node_id);
    }

    /// Minimum birth round stamped on subsequent events.
    pub fn set_birth_round_floor(&mut self, round: u64) {
        self.birth_round_floor = round;
    }

    pub fn next_event(&mut self) -> PlatformEvent {
        let ids: Vec<NodeId> = self
            .network
            .node_ids()
            .into_iter()
            .filter(|id| !self.retired.contains(id))
            .collect();
        let creator = ids[self.rng.gen_range(0..ids.len())];
        let candidates: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| *id != creator && self.latest.contains_key(id))
            .collect();
        let other = candidates.choose(&mut self.rng).copied();

        self.clock += self.rng.gen_range(1..=50) * 1_000;
        let tx_count = self.rng.gen_range(0..3);
        let transactions = (0..tx_count)
            .map(|_| {
                let len = self.rng.gen_range(4..32);
                (0..len).map(|_| self.rng.gen()).collect()
            })
            .collect();

        let mut builder = TestingEventBuilder::new(creator)
            .time_created(Timestamp(self.clock))
            .transactions(transactions)
            .signed_by(self.network.key(creator));
        let mut birth_round = self.birth_round_floor;
        if let Some(parent) = self.latest.get(&creator) {
            birth_round = birth_round.max(parent.birth_round());
            builder = builder.self_parent(parent);
        }
        if let Some(parent) = other.and_then(|id| self.latest.get(&id)) {
            birth_round = birth_round.max(parent.birth_round());
            builder = builder.other_parent(parent);
        }

        let event = builder.birth_round(birth_round).build();
        self.latest.insert(creator, event.clone());
        event
    }

    pub fn generate(&mut self, count: usize) -> Vec<PlatformEvent> {
        (0..count).map(|_| self.next_event()).collect()
    }
}

/// Randomly permute events, ignoring causal order.
pub fn shuffled(mut events: Vec<PlatformEvent>, seed: u64) -> Vec<PlatformEvent> {
    events.shuffle(&mut StdRng::seed_from_u64(seed));
    events
}

/// Permute events within consecutive chunks of `chunk` events.
///
/// Models gossip reordering where no event is delayed by more than a chunk.
pub fn shuffled_within(mut events: Vec<PlatformEvent>, chunk: usize, seed: u64) -> Vec<PlatformEvent> {
    let mut rng = StdRng::seed_from_u64(seed);
    for window in events.chunks_mut(chunk.max(1)) {
        window.shuffle(&mut rng);
    }
    events
}

/// Attach generation numbers to events given in causal order.
pub fn assign_generations(events: &mut [PlatformEvent]) {
    let mut generations: HashMap<EventHash, u64> = HashMap::new();
    for event in events.iter_mut() {
        let n_gen = event
            .all_parents()
            .filter_map(|p| generations.get(&p.hash))
            .max()
            .map_or(FIRST_GENERATION, |g| g + 1);
        event.set_n_gen(n_gen);
        generations.insert(event.hash().clone(), n_gen);
    }
}
