//! # Roster Weights
//!
//! Member positions and vote weights for virtual voting.
//!
//! Positions cover every member of every roster in the history and are
//! append-only, so metadata vectors memoized under one roster stay valid
//! after a transition. Weights come from the roster active for the round
//! being elected; a member absent from that roster weighs zero.
//!
//! ```text
//!   history:    A {0,1,2,3,4} @1 ──► B {0,1,2,3} @10
//!   positions:  0 1 2 3 4
//!   electing 9: 1 1 1 1 1   (A)
//!   electing 10: 1 1 1 1 0  (B)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use shared_types::{NodeId, Roster, RosterHistory, Threshold, ROUND_FIRST};

/// Position-indexed view of the roster history.
#[derive(Debug, Clone)]
pub struct RosterWeights {
    history: Arc<RosterHistory>,
    active: Arc<Roster>,
    active_round: u64,
    members: Vec<NodeId>,
    positions: HashMap<NodeId, usize>,
    weights: Vec<u64>,
    /// Some single member holds a supermajority on its own.
    single_node_supermajority: bool,
}

impl RosterWeights {
    pub fn new(history: Arc<RosterHistory>) -> Self {
        let active = Arc::clone(roster_at(&history, ROUND_FIRST));
        let mut weights = Self {
            history,
            active,
            active_round: ROUND_FIRST,
            members: Vec::new(),
            positions: HashMap::new(),
            weights: Vec::new(),
            single_node_supermajority: false,
        };
        weights.register_members();
        weights.reweigh();
        weights
    }

    /// Weights of a history holding only `roster`.
    pub fn for_roster(roster: Roster) -> Self {
        Self::new(Arc::new(RosterHistory::single(roster)))
    }

    /// Swap in a new history. Known members keep their positions.
    pub fn update_history(&mut self, history: Arc<RosterHistory>) -> bool {
        self.history = history;
        self.register_members();
        self.activate(self.active_round)
    }

    /// Weigh votes by the roster effective at `round`.
    ///
    /// Returns whether the active roster changed.
    pub fn activate(&mut self, round: u64) -> bool {
        self.active_round = round;
        let roster = roster_at(&self.history, round);
        if Arc::ptr_eq(roster, &self.active) || roster.hash() == self.active.hash() {
            return false;
        }
        self.active = Arc::clone(roster);
        self.reweigh();
        true
    }

    /// The roster votes are currently weighed by.
    pub fn roster(&self) -> &Arc<Roster> {
        &self.active
    }

    pub fn history(&self) -> &Arc<RosterHistory> {
        &self.history
    }

    /// Every member ever seen in the history.
    pub fn num_members(&self) -> usize {
        self.members.len()
    }

    pub fn index_of(&self, node_id: NodeId) -> Option<usize> {
        self.positions.get(&node_id).copied()
    }

    pub fn weight_at(&self, index: usize) -> u64 {
        self.weights.get(index).copied().unwrap_or_default()
    }

    pub fn total(&self) -> u64 {
        self.active.total_weight()
    }

    pub fn is_super_majority(&self, weight: u64) -> bool {
        Threshold::SuperMajority.is_satisfied_by(weight, self.total())
    }

    pub fn node_has_supermajority(&self) -> bool {
        self.single_node_supermajority
    }

    fn register_members(&mut self) {
        let history = Arc::clone(&self.history);
        let rosters = history
            .pairs()
            .iter()
            .filter_map(|pair| history.roster(&pair.roster_hash));
        for roster in rosters {
            for entry in roster.entries() {
                if !self.positions.contains_key(&entry.node_id) {
                    self.positions.insert(entry.node_id, self.members.len());
                    self.members.push(entry.node_id);
                }
            }
        }
        self.reweigh();
    }

    fn reweigh(&mut self) {
        self.weights = self.members.iter().map(|id| self.active.weight(*id)).collect();
        let total = self.active.total_weight();
        self.single_node_supermajority = self
            .weights
            .iter()
            .any(|w| Threshold::SuperMajority.is_satisfied_by(*w, total));
    }
}

/// The roster effective at `round`, or the earliest one for rounds the
/// history does not reach back to.
fn roster_at(history: &RosterHistory, round: u64) -> &Arc<Roster> {
    history
        .roster_for_round(round)
        .or_else(|| {
            history
                .pairs()
                .first()
                .and_then(|pair| history.roster(&pair.roster_hash))
        })
        .unwrap_or_else(|| history.current_roster())
}
