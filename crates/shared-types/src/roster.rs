//! # Roster / Weight Model
//!
//! A `Roster` is the weighted membership that defines who may create events
//! and what a supermajority means. A `RosterHistory` maps effective rounds to
//! rosters; rosters are immutable once published and new ones only take
//! effect at a round boundary.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::entities::NodeId;
use crate::errors::RosterError;
use crate::hashing::hash_roster;

/// Digest identifying a roster.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RosterHash(pub Vec<u8>);

impl fmt::Debug for RosterHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RosterHash({})", hex::encode(&self.0[..self.0.len().min(4)]))
    }
}

impl fmt::Display for RosterHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// One member of a roster.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub node_id: NodeId,
    pub weight: u64,
    /// Raw public key bytes used to verify the member's event signatures.
    #[serde_as(as = "Bytes")]
    pub public_key: Vec<u8>,
}

/// An ordered set of members with unique ids and positive total weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    index: HashMap<NodeId, usize>,
    total_weight: u64,
    hash: RosterHash,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Result<Self, RosterError> {
        if entries.is_empty() {
            return Err(RosterError::Empty);
        }

        let mut index = HashMap::with_capacity(entries.len());
        let mut total_weight: u64 = 0;
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.node_id, i).is_some() {
                return Err(RosterError::DuplicateNodeId(entry.node_id));
            }
            total_weight = total_weight.saturating_add(entry.weight);
        }
        if total_weight == 0 {
            return Err(RosterError::ZeroTotalWeight);
        }

        let mut roster = Self {
            entries,
            index,
            total_weight,
            hash: RosterHash(Vec::new()),
        };
        roster.hash = hash_roster(&roster);
        Ok(roster)
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn hash(&self) -> &RosterHash {
        &self.hash
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.index.contains_key(&node_id)
    }

    /// Position of the node in roster order.
    pub fn index_of(&self, node_id: NodeId) -> Option<usize> {
        self.index.get(&node_id).copied()
    }

    pub fn entry(&self, node_id: NodeId) -> Option<&RosterEntry> {
        self.index_of(node_id).map(|i| &self.entries[i])
    }

    /// Weight of the node, zero for non-members.
    pub fn weight(&self, node_id: NodeId) -> u64 {
        self.entry(node_id).map_or(0, |e| e.weight)
    }
}

/// A `(effective round, roster hash)` entry of a roster history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRosterPair {
    pub effective_round: u64,
    pub roster_hash: RosterHash,
}

/// Effective-round ordered rosters.
///
/// ```text
///   effective:   1            10             25
///   roster:      A ─────────► B ───────────► C ───────►
///   lookup(9) = A, lookup(10) = B, lookup(40) = C
/// ```
#[derive(Debug, Clone)]
pub struct RosterHistory {
    /// Strictly increasing by `effective_round`.
    pairs: Vec<RoundRosterPair>,
    rosters: HashMap<RosterHash, Arc<Roster>>,
}

impl RosterHistory {
    pub fn new(
        pairs: Vec<RoundRosterPair>,
        rosters: HashMap<RosterHash, Arc<Roster>>,
    ) -> Result<Self, RosterError> {
        if pairs.is_empty() {
            return Err(RosterError::EmptyHistory);
        }
        for window in pairs.windows(2) {
            if window[1].effective_round <= window[0].effective_round {
                return Err(RosterError::NonIncreasingRound {
                    previous: window[0].effective_round,
                    round: window[1].effective_round,
                });
            }
        }
        for pair in &pairs {
            if !rosters.contains_key(&pair.roster_hash) {
                return Err(RosterError::UnknownRosterHash(pair.roster_hash.to_string()));
            }
        }
        Ok(Self { pairs, rosters })
    }

    /// Build a history from `(effective round, roster)` pairs.
    pub fn from_rosters(
        rosters: impl IntoIterator<Item = (u64, Roster)>,
    ) -> Result<Self, RosterError> {
        let mut pairs = Vec::new();
        let mut map = HashMap::new();
        for (effective_round, roster) in rosters {
            pairs.push(RoundRosterPair {
                effective_round,
                roster_hash: roster.hash().clone(),
            });
            map.insert(roster.hash().clone(), Arc::new(roster));
        }
        Self::new(pairs, map)
    }

    /// A history holding a single roster effective from the first round.
    pub fn single(roster: Roster) -> Self {
        let hash = roster.hash().clone();
        Self {
            pairs: vec![RoundRosterPair {
                effective_round: crate::ROUND_FIRST,
                roster_hash: hash.clone(),
            }],
            rosters: HashMap::from([(hash, Arc::new(roster))]),
        }
    }

    pub fn pairs(&self) -> &[RoundRosterPair] {
        &self.pairs
    }

    /// Roster with the greatest effective round not after `round`.
    ///
    /// A round before the first entry only resolves when the history holds a
    /// single roster.
    pub fn roster_for_round(&self, round: u64) -> Option<&Arc<Roster>> {
        let hash = self.roster_hash_for_round(round)?;
        self.rosters.get(hash)
    }

    pub fn roster_hash_for_round(&self, round: u64) -> Option<&RosterHash> {
        let idx = self.pairs.partition_point(|p| p.effective_round <= round);
        if idx == 0 {
            return match self.pairs.as_slice() {
                [only] => Some(&only.roster_hash),
                _ => None,
            };
        }
        Some(&self.pairs[idx - 1].roster_hash)
    }

    pub fn roster(&self, hash: &RosterHash) -> Option<&Arc<Roster>> {
        self.rosters.get(hash)
    }

    /// The most recently effective roster.
    pub fn current_roster(&self) -> &Arc<Roster> {
        let last = &self.pairs[self.pairs.len() - 1];
        &self.rosters[&last.roster_hash]
    }
}

/// Atomically swappable handle to the current roster history.
///
/// Readers take a snapshot with [`load`](Self::load) and keep using it; a
/// concurrent [`store`](Self::store) never changes a snapshot already taken.
/// Caches derived from a snapshot compare identities with [`Arc::ptr_eq`].
#[derive(Debug)]
pub struct RosterHistoryCell {
    current: RwLock<Arc<RosterHistory>>,
}

impl RosterHistoryCell {
    pub fn new(history: RosterHistory) -> Self {
        Self {
            current: RwLock::new(Arc::new(history)),
        }
    }

    pub fn load(&self) -> Arc<RosterHistory> {
        Arc::clone(&self.current.read())
    }

    pub fn store(&self, history: Arc<RosterHistory>) {
        *self.current.write() = history;
    }
}
