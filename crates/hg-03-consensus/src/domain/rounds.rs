//! # Rounds and Elections
//!
//! Tracks the round currently being decided, its candidate witnesses and the
//! thresholds derived from the latest decided round.

use std::collections::HashSet;

use shared_types::{EventHash, EventWindow, NodeId, ROUND_FIRST, ROUND_NEGATIVE_INFINITY};

use super::store::EventId;
use crate::config::ConsensusConfig;

/// A witness whose fame is being voted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateWitness {
    pub id: EventId,
    pub creator: NodeId,
    pub hash: EventHash,
    decided: bool,
    famous: bool,
}

impl CandidateWitness {
    pub fn new(id: EventId, creator: NodeId, hash: EventHash) -> Self {
        Self {
            id,
            creator,
            hash,
            decided: false,
            famous: false,
        }
    }

    pub fn is_decided(&self) -> bool {
        self.decided
    }

    pub fn is_famous(&self) -> bool {
        self.famous
    }
}

/// The election of one round's famous witnesses.
#[derive(Debug, Clone)]
pub struct RoundElections {
    round: u64,
    candidates: Vec<CandidateWitness>,
}

impl RoundElections {
    pub fn new(round: u64) -> Self {
        Self {
            round,
            candidates: Vec::new(),
        }
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn candidates(&self) -> &[CandidateWitness] {
        &self.candidates
    }

    pub fn add(&mut self, candidate: CandidateWitness) {
        self.candidates.push(candidate);
    }

    pub fn decide(&mut self, index: usize, famous: bool) {
        if let Some(candidate) = self.candidates.get_mut(index) {
            candidate.decided = true;
            candidate.famous = famous;
        }
    }

    /// Decided once every candidate is decided. An empty election is not.
    pub fn is_decided(&self) -> bool {
        !self.candidates.is_empty() && self.candidates.iter().all(|c| c.decided)
    }

    /// Famous witnesses, one per creator. A creator with several famous
    /// witnesses is represented by the lowest hash.
    pub fn find_all_judges(&self) -> Vec<CandidateWitness> {
        let mut judges: Vec<CandidateWitness> = Vec::new();
        for candidate in self.candidates.iter().filter(|c| c.famous) {
            match judges.iter_mut().find(|j| j.creator == candidate.creator) {
                Some(existing) if candidate.hash < existing.hash => *existing = candidate.clone(),
                Some(_) => {}
                None => judges.push(candidate.clone()),
            }
        }
        judges.sort_by_key(|j| j.creator);
        judges
    }
}

/// Round bookkeeping across elections.
#[derive(Debug, Clone)]
pub struct ConsensusRounds {
    config: ConsensusConfig,
    election: RoundElections,
    last_decided_judges: HashSet<EventId>,
    latest_decided: u64,
    max_round: u64,
    ancient_threshold: u64,
    expired_threshold: u64,
}

impl ConsensusRounds {
    pub fn new(config: ConsensusConfig) -> Self {
        Self {
            config,
            election: RoundElections::new(ROUND_FIRST),
            last_decided_judges: HashSet::new(),
            latest_decided: ROUND_NEGATIVE_INFINITY,
            max_round: ROUND_NEGATIVE_INFINITY,
            ancient_threshold: ROUND_FIRST,
            expired_threshold: ROUND_FIRST,
        }
    }

    /// Drop the candidates of the current election before a recalculation
    /// re-adds them.
    pub fn recalculating(&mut self) {
        self.election = RoundElections::new(self.election.round());
    }

    pub fn election_round(&self) -> u64 {
        self.election.round()
    }

    pub fn election(&self) -> &RoundElections {
        &self.election
    }

    pub fn election_mut(&mut self) -> &mut RoundElections {
        &mut self.election
    }

    /// Register a newly computed witness.
    pub fn new_witness(&mut self, candidate: CandidateWitness, round: u64) {
        self.max_round = self.max_round.max(round);
        if round == self.election.round() {
            self.election.add(candidate);
        }
    }

    /// Close the current election and open the next one.
    ///
    /// Returns the judges of the decided round.
    pub fn current_election_decided(&mut self) -> Vec<CandidateWitness> {
        let judges = self.election.find_all_judges();
        let decided = self.election.round();

        self.latest_decided = decided;
        self.last_decided_judges = judges.iter().map(|j| j.id).collect();
        self.ancient_threshold = self.ancient_threshold.max(ConsensusConfig::oldest_round_within(
            decided,
            self.config.rounds_non_ancient,
        ));
        self.expired_threshold = self
            .expired_threshold
            .max(ConsensusConfig::oldest_round_within(decided, self.config.rounds_expired));
        self.election = RoundElections::new(decided + 1);
        judges
    }

    /// Resume as if `round` had just been decided. Judges are supplied
    /// later through [`set_last_decided_judges`](Self::set_last_decided_judges).
    pub fn load_snapshot(&mut self, round: u64) {
        *self = Self::new(self.config.clone());
        self.latest_decided = round;
        self.max_round = round;
        self.ancient_threshold =
            ConsensusConfig::oldest_round_within(round, self.config.rounds_non_ancient);
        self.expired_threshold = ConsensusConfig::oldest_round_within(round, self.config.rounds_expired);
        self.election = RoundElections::new(round + 1);
    }

    pub fn set_last_decided_judges(&mut self, judges: impl IntoIterator<Item = EventId>) {
        self.last_decided_judges = judges.into_iter().collect();
    }

    pub fn is_last_decided_judge(&self, id: EventId) -> bool {
        self.last_decided_judges.contains(&id)
    }

    pub fn latest_decided_round(&self) -> u64 {
        self.latest_decided
    }

    pub fn max_round(&self) -> u64 {
        self.max_round
    }

    pub fn ancient_threshold(&self) -> u64 {
        self.ancient_threshold
    }

    pub fn is_ancient_round(&self, birth_round: u64) -> bool {
        birth_round < self.ancient_threshold
    }

    pub fn event_window(&self) -> EventWindow {
        EventWindow::new(
            self.latest_decided,
            self.latest_decided + 1,
            self.ancient_threshold,
            self.expired_threshold,
        )
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
