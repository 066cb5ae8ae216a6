//! # Virtual Voting
//!
//! Rounds, witnesses, fame elections and round decisions over the linked
//! DAG. Every query is memoized in the event's [`ConsensusMetadata`] and is
//! recomputed from scratch after each decided round.
//!
//! ```text
//!   add_event ─► calculate_and_vote ─► decided? ─► round_decided ─┐
//!                                                                 │
//!        ┌──────────── recalculate_and_vote ◄─────────────────────┘
//!        │  (replays every recent event against the next election)
//!        └─► decided again? loop : return rounds
//! ```
//!
//! Members are addressed by their position in [`RosterWeights`] throughout;
//! votes are weighed by the roster effective for the round being elected.
//! `ROUND_NEGATIVE_INFINITY` marks an event as irrelevant: consensus, ancient,
//! or only descended from such events.
//!
//! ## Restarting from a snapshot
//!
//! After [`Consensus::load_snapshot`] nothing is calculated until every judge
//! named by the snapshot has been added. Their common ancestors are then
//! marked as consensus and a full recalculation resumes voting at the round
//! after the snapshot.
//!
//! [`RosterWeights`]: super::weights::RosterWeights
//!
//! [`ConsensusMetadata`]: super::store::ConsensusMetadata

use std::collections::HashSet;
use std::sync::Arc;

use shared_types::{
    ConsensusEvent, ConsensusRound, ConsensusSnapshot, EventHash, EventWindow, JudgeId,
    PlatformEvent, Roster, RosterHistory, Timestamp, ROUND_FIRST, ROUND_NEGATIVE_INFINITY,
};
use tracing::{debug, error, info, trace, warn};

use super::order;
use super::rounds::{CandidateWitness, ConsensusRounds};
use super::store::{ConsensusMetadata, EventId, EventStore, LinkedEvent};
use super::weights::RosterWeights;
use crate::config::ConsensusConfig;
use crate::metrics;

/// The virtual-voting state machine.
///
/// Holds no events itself; every call operates on the caller's [`EventStore`].
#[derive(Debug)]
pub struct Consensus {
    config: ConsensusConfig,
    weights: RosterWeights,
    rounds: ConsensusRounds,
    /// Non-consensus, non-ancient events in insertion order, plus the last
    /// decided judges.
    recent_events: Vec<EventId>,
    num_consensus: u64,
    last_consensus_time: Option<Timestamp>,
    init_judges: Option<InitJudges>,
}

/// Judges of a loaded snapshot that have not all been added yet.
#[derive(Debug)]
struct InitJudges {
    round: u64,
    missing: HashSet<EventHash>,
    found: Vec<EventId>,
}

impl Consensus {
    pub fn new(config: ConsensusConfig, history: Arc<RosterHistory>) -> Self {
        Self {
            rounds: ConsensusRounds::new(config.clone()),
            config,
            weights: RosterWeights::new(history),
            recent_events: Vec::new(),
            num_consensus: 0,
            last_consensus_time: None,
            init_judges: None,
        }
    }

    /// The roster votes are currently weighed by.
    pub fn roster(&self) -> &Arc<Roster> {
        self.weights.roster()
    }

    pub fn roster_history(&self) -> &Arc<RosterHistory> {
        self.weights.history()
    }

    /// Adopt a new roster history. Rosters take effect when the round being
    /// elected reaches their effective round.
    pub fn update_roster_history(&mut self, history: Arc<RosterHistory>) {
        if self.weights.update_history(history) {
            warn!(
                election = self.rounds.election_round(),
                "Roster history changed the roster of the round being elected"
            );
        }
    }

    /// Restart from a snapshot taken when `snapshot.round` was decided.
    ///
    /// Every event known so far is forgotten; the caller supplies the store
    /// the judges will be linked into.
    pub fn load_snapshot(&mut self, snapshot: &ConsensusSnapshot) {
        self.clear();
        self.rounds.load_snapshot(snapshot.round);
        self.weights.activate(snapshot.round + 1);
        self.num_consensus = snapshot.next_consensus_number;
        self.last_consensus_time = Some(snapshot.consensus_timestamp);
        self.init_judges = Some(InitJudges {
            round: snapshot.round,
            missing: snapshot.judge_ids.iter().map(|j| j.hash.clone()).collect(),
            found: Vec::new(),
        });
        info!(
            round = snapshot.round,
            judges = snapshot.judge_ids.len(),
            next_consensus_number = snapshot.next_consensus_number,
            "Loaded consensus snapshot"
        );
    }

    /// Whether judges named by a loaded snapshot are still missing.
    pub fn waiting_for_init_judges(&self) -> bool {
        self.init_judges
            .as_ref()
            .is_some_and(|init| !init.missing.is_empty())
    }

    /// Add a freshly linked event. Returns every round decided as a result,
    /// in increasing round order.
    pub fn add_event(&mut self, store: &mut EventStore, id: EventId) -> Vec<ConsensusRound> {
        let Some(event) = store.get_mut(id) else {
            return Vec::new();
        };
        event.meta = ConsensusMetadata::default();
        self.recent_events.push(id);

        let last_judge_found = self.check_init_judges(store, id);
        if self.waiting_for_init_judges() {
            return Vec::new();
        }

        let mut decided = Vec::new();
        let mut next = if last_judge_found {
            self.recalculate_and_vote(store)
        } else {
            self.calculate_and_vote(store, id)
        };
        while let Some(round) = next {
            decided.push(round);
            next = self.recalculate_and_vote(store);
        }
        decided
    }

    /// Linked events that have not reached consensus, in insertion order.
    pub fn pre_consensus_events(&self, store: &EventStore) -> Vec<Arc<PlatformEvent>> {
        self.recent_events
            .iter()
            .filter_map(|id| store.get(*id))
            .filter(|e| !e.is_consensus())
            .map(|e| Arc::clone(e.event()))
            .collect()
    }

    pub fn event_window(&self) -> EventWindow {
        self.rounds.event_window()
    }

    pub fn latest_decided_round(&self) -> u64 {
        self.rounds.latest_decided_round()
    }

    pub fn max_round(&self) -> u64 {
        self.rounds.max_round()
    }

    /// Round created of a linked event, if computed.
    pub fn round_of(&self, store: &EventStore, id: EventId) -> Option<u64> {
        store.get(id).and_then(|e| e.meta.round_created)
    }

    pub fn clear(&mut self) {
        self.rounds.clear();
        self.weights.activate(ROUND_FIRST);
        self.recent_events.clear();
        self.num_consensus = 0;
        self.last_consensus_time = None;
        self.init_judges = None;
    }

    /// Mark `id` if it is a judge the loaded snapshot is waiting for.
    ///
    /// Returns true when it was the last one; the judges' common ancestors
    /// have then been marked as consensus.
    fn check_init_judges(&mut self, store: &mut EventStore, id: EventId) -> bool {
        let Some(init) = self.init_judges.as_mut() else {
            return false;
        };
        let Some(event) = store.get_mut(id) else {
            return false;
        };
        if !init.missing.remove(event.hash()) {
            return false;
        }
        event.meta.round_created = Some(init.round);
        event.meta.witness = true;
        event.meta.famous = true;
        init.found.push(id);
        info!(event = %event.event(), remaining = init.missing.len(), "Found init judge");
        if !init.missing.is_empty() {
            return false;
        }

        let Some(init) = self.init_judges.take() else {
            return false;
        };
        let rounds = &self.rounds;
        let ancestors = order::common_ancestors(store, &init.found, |e| {
            !e.is_consensus() && !rounds.is_ancient_round(e.birth_round())
        });
        for (ancestor, _) in &ancestors {
            if let Some(event) = store.get_mut(*ancestor) {
                event.round_received = Some(init.round);
            }
        }
        debug!(
            round = init.round,
            consensus = ancestors.len(),
            "All init judges found"
        );
        self.rounds.set_last_decided_judges(init.found);
        true
    }

    // ---------------------------------------------------------------------
    // Driving the elections
    // ---------------------------------------------------------------------

    fn recalculate_and_vote(&mut self, store: &mut EventStore) -> Option<ConsensusRound> {
        self.rounds.recalculating();

        let mut pending = std::mem::take(&mut self.recent_events).into_iter();
        let mut kept = Vec::with_capacity(pending.len());
        let mut decided = None;

        while let Some(id) = pending.next() {
            let Some(event) = store.get(id) else {
                continue;
            };

            if self.rounds.is_last_decided_judge(id) {
                let parents = event.all_parents().to_vec();
                let max_parent_round = parents
                    .into_iter()
                    .map(|p| self.round(store, Some(p)))
                    .max()
                    .unwrap_or(ROUND_NEGATIVE_INFINITY);
                if max_parent_round == ROUND_NEGATIVE_INFINITY {
                    // Metadata stays, but descendants count generations from here.
                    self.calculate_de_gen(store, id);
                    kept.push(id);
                    continue;
                }
            }

            let Some(event) = store.get_mut(id) else {
                continue;
            };
            let retire = event.is_consensus() || self.rounds.is_ancient_round(event.birth_round());
            event.meta = ConsensusMetadata::default();
            if retire {
                event.meta.round_created = Some(ROUND_NEGATIVE_INFINITY);
                continue;
            }

            kept.push(id);
            decided = self.calculate_and_vote(store, id);
            if decided.is_some() {
                break;
            }
        }

        kept.extend(pending);
        self.recent_events = kept;
        decided
    }

    fn calculate_and_vote(&mut self, store: &mut EventStore, id: EventId) -> Option<ConsensusRound> {
        self.calculate_de_gen(store, id);
        let round = self.round(store, Some(id));
        self.calculate_metadata(store, id);

        if !self.witness(store, id) {
            return None;
        }

        let election_round = self.rounds.election_round();
        let event = store.get_mut(id)?;
        event.meta.witness = true;
        if election_round <= round {
            let candidate = CandidateWitness::new(id, event.creator_id(), event.hash().clone());
            self.rounds.new_witness(candidate, round);
            if election_round < round {
                self.vote_in_all_elections(store, id);
            }
        } else {
            event.meta.famous = false;
        }

        if self.rounds.election().is_decided() {
            return Some(self.round_decided(store));
        }
        None
    }

    fn calculate_metadata(&self, store: &mut EventStore, id: EventId) {
        if self.not_relevant(store, id) || self.rounds.is_last_decided_judge(id) {
            return;
        }
        self.last_see(store, Some(id), 0);
        self.strongly_see_p(store, Some(id), 0);
        self.first_self_witness_s(store, Some(id));
        self.first_witness_s(store, Some(id));
    }

    fn vote_in_all_elections(&mut self, store: &mut EventStore, voter: EventId) {
        let election_round = self.rounds.election_round();
        let undecided: Vec<(usize, EventId)> = self
            .rounds
            .election()
            .candidates()
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_decided())
            .map(|(i, c)| (i, c.id))
            .collect();
        let num_candidates = self.rounds.election().candidates().len();
        set_meta(store, voter, |m| m.votes = vec![false; num_candidates]);

        let diff = self.round(store, Some(voter)).saturating_sub(election_round);
        if diff == 0 {
            return;
        }

        if diff == 1 {
            for (index, candidate) in undecided {
                let vote = self.first_vote(store, voter, candidate);
                set_meta(store, voter, |m| m.votes[index] = vote);
                trace!(?voter, ?candidate, vote, diff, "First vote");
            }
            return;
        }

        let strongly_seen: Vec<EventId> = (0..self.weights.num_members())
            .filter_map(|m| self.strongly_see_s1(store, Some(voter), m))
            .collect();
        let is_coin_round = self.config.coin_freq != 0 && diff % self.config.coin_freq == 0;

        for (index, candidate) in undecided {
            let (yes, no) = self.count_votes(store, &strongly_seen, index);
            let supermajority = self.weights.is_super_majority(yes) || self.weights.is_super_majority(no);
            let counted = yes >= no;

            if is_coin_round {
                let vote = if supermajority {
                    counted
                } else {
                    store.get(voter).is_some_and(|e| order::coin(e.event().signature()))
                };
                set_meta(store, voter, |m| m.votes[index] = vote);
                metrics::record_coin_vote();
                warn!(
                    election = election_round,
                    ?voter,
                    ?candidate,
                    vote,
                    "Coin round vote"
                );
                continue;
            }

            set_meta(store, voter, |m| m.votes[index] = counted);
            trace!(?voter, ?candidate, vote = counted, diff, supermajority, "Counting vote");
            if supermajority {
                self.rounds.election_mut().decide(index, counted);
                set_meta(store, candidate, |m| m.famous = counted);
                debug!(?candidate, famous = counted, election = election_round, "Fame decided");
                if self.rounds.election().is_decided() {
                    return;
                }
            }
        }
    }

    /// Yes and no weight of the strongly seen voters on candidate `index`.
    fn count_votes(&self, store: &EventStore, voters: &[EventId], index: usize) -> (u64, u64) {
        let mut yes = 0;
        let mut no = 0;
        for event in voters.iter().filter_map(|id| store.get(*id)) {
            let weight = self
                .weights
                .index_of(event.creator_id())
                .map_or(0, |i| self.weights.weight_at(i));
            if event.meta.votes.get(index).copied().unwrap_or(false) {
                yes += weight;
            } else {
                no += weight;
            }
        }
        (yes, no)
    }

    fn first_vote(&self, store: &mut EventStore, voter: EventId, voted_on: EventId) -> bool {
        let Some(member) = store
            .get(voted_on)
            .and_then(|e| self.weights.index_of(e.creator_id()))
        else {
            return false;
        };
        let voter_round = self.round(store, Some(voter));

        let mut seen = self.first_see(store, Some(voter), member);
        while let Some(w) = seen {
            if self.round(store, Some(w)) < voter_round {
                break;
            }
            let Some(self_parent) = self.self_parent(store, w) else {
                break;
            };
            seen = self.first_self_witness_s(store, Some(self_parent));
        }
        seen == Some(voted_on)
    }

    fn round_decided(&mut self, store: &mut EventStore) -> ConsensusRound {
        let decided = self.rounds.election_round();
        let judges = self.rounds.current_election_decided();
        self.check_judges(&judges, decided);

        let whitening = order::whitening(judges.iter().map(|j| &j.hash));
        let judge_ids: Vec<EventId> = judges.iter().map(|j| j.id).collect();
        let events = self.find_consensus_events(store, &judge_ids, decided, &whitening);

        if events.is_empty() {
            self.last_consensus_time = match self.last_consensus_time {
                Some(last) => Some(order::min_next_timestamp(last)),
                None => {
                    let mut times: Vec<Timestamp> = judge_ids
                        .iter()
                        .filter_map(|id| store.get(*id))
                        .map(LinkedEvent::time_created)
                        .collect();
                    times.sort_unstable();
                    times.get(times.len() / 2).copied()
                }
            };
        }

        metrics::record_round_decided(decided, events.len());
        info!(
            round = decided,
            judges = judges.len(),
            events = events.len(),
            "Round decided"
        );
        if self.weights.activate(decided + 1) {
            info!(
                election = decided + 1,
                members = self.weights.roster().len(),
                total_weight = self.weights.total(),
                "Roster transition takes effect"
            );
        }

        ConsensusRound {
            round_number: decided,
            events,
            event_window: self.rounds.event_window(),
            snapshot: ConsensusSnapshot {
                round: decided,
                judge_ids: judges
                    .into_iter()
                    .map(|j| JudgeId {
                        creator_id: j.creator,
                        hash: j.hash,
                    })
                    .collect(),
                next_consensus_number: self.num_consensus,
                consensus_timestamp: self.last_consensus_time.unwrap_or_default(),
            },
        }
    }

    fn check_judges(&self, judges: &[CandidateWitness], round: u64) {
        if judges.is_empty() {
            error!(round, "No judges in decided round");
            return;
        }
        let weight: u64 = judges
            .iter()
            .filter_map(|j| self.weights.index_of(j.creator))
            .map(|i| self.weights.weight_at(i))
            .sum();
        if !self.weights.is_super_majority(weight) {
            warn!(
                round,
                judge_weight = weight,
                total_weight = self.weights.total(),
                "Less than a supermajority of weight on judges"
            );
        }
    }

    fn find_consensus_events(
        &mut self,
        store: &mut EventStore,
        judges: &[EventId],
        round_received: u64,
        whitening: &[u8],
    ) -> Vec<ConsensusEvent> {
        let rounds = &self.rounds;
        let mut found = order::common_ancestors(store, judges, |e| {
            !e.is_consensus() && !rounds.is_ancient_round(e.birth_round())
        });
        order::sort_for_consensus(store, &mut found, whitening);

        let mut ordered = Vec::with_capacity(found.len());
        for (id, median) in found {
            let Some(event) = store.get_mut(id) else {
                continue;
            };
            event.round_received = Some(round_received);

            let timestamp = match self.last_consensus_time {
                Some(last) => median.max(order::min_next_timestamp(last)),
                None => median,
            };
            self.last_consensus_time = Some(order::last_transaction_time(
                timestamp,
                event.event().transaction_count(),
            ));
            ordered.push(ConsensusEvent {
                event: Arc::clone(event.event()),
                round_received,
                consensus_order: self.num_consensus,
                consensus_timestamp: timestamp,
            });
            self.num_consensus += 1;
        }
        ordered
    }

    // ---------------------------------------------------------------------
    // Hashgraph functions, memoized per event
    // ---------------------------------------------------------------------

    /// One more than the highest deterministic generation among parents that
    /// are neither consensus nor ancient.
    fn calculate_de_gen(&self, store: &mut EventStore, id: EventId) {
        let Some(event) = store.get(id) else {
            return;
        };
        let highest_parent = event
            .all_parents()
            .iter()
            .filter_map(|p| store.get(*p))
            .filter(|p| !p.is_consensus() && !self.rounds.is_ancient_round(p.birth_round()))
            .map(LinkedEvent::de_gen)
            .max()
            .unwrap_or(0);
        set_meta(store, id, |m| m.de_gen = highest_parent + 1);
    }

    fn ancient(&self, store: &EventStore, id: EventId) -> bool {
        store
            .get(id)
            .map_or(true, |e| self.rounds.is_ancient_round(e.birth_round()))
    }

    fn not_relevant(&self, store: &EventStore, id: EventId) -> bool {
        store
            .get(id)
            .map_or(true, |e| e.meta.round_created == Some(ROUND_NEGATIVE_INFINITY))
    }

    fn self_parent(&self, store: &EventStore, id: EventId) -> Option<EventId> {
        store
            .get(id)?
            .self_parent()
            .filter(|p| !self.ancient(store, *p))
    }

    fn live_parents(&self, store: &EventStore, id: EventId) -> Vec<EventId> {
        store.get(id).map_or_else(Vec::new, |e| {
            e.all_parents()
                .iter()
                .copied()
                .filter(|p| !self.ancient(store, *p))
                .collect()
        })
    }

    fn witness(&self, store: &mut EventStore, id: EventId) -> bool {
        let round = self.round(store, Some(id));
        if round == ROUND_NEGATIVE_INFINITY {
            return false;
        }
        let has_self_parent = store.get(id).is_some_and(|e| e.self_parent().is_some());
        if !has_self_parent {
            return true;
        }
        let self_parent = self.self_parent(store, id);
        round != self.round(store, self_parent)
    }

    fn parent_round(&self, store: &mut EventStore, id: Option<EventId>) -> u64 {
        let Some(id) = id else {
            return ROUND_NEGATIVE_INFINITY;
        };
        self.live_parents(store, id)
            .into_iter()
            .map(|p| self.round(store, Some(p)))
            .max()
            .unwrap_or(ROUND_NEGATIVE_INFINITY)
    }

    fn round(&self, store: &mut EventStore, id: Option<EventId>) -> u64 {
        let Some(id) = id else {
            return ROUND_NEGATIVE_INFINITY;
        };
        let Some(event) = store.get(id) else {
            return ROUND_NEGATIVE_INFINITY;
        };
        if let Some(round) = event.meta.round_created {
            return round;
        }
        if event.is_consensus() || self.rounds.is_ancient_round(event.birth_round()) {
            set_meta(store, id, |m| m.round_created = Some(ROUND_NEGATIVE_INFINITY));
            return ROUND_NEGATIVE_INFINITY;
        }
        if event.all_parents().is_empty() {
            set_meta(store, id, |m| m.round_created = Some(ROUND_FIRST));
            return ROUND_FIRST;
        }

        let mut greatest = ROUND_NEGATIVE_INFINITY;
        let mut previous = None;
        let mut all_same = true;
        for parent in self.live_parents(store, id) {
            let parent_round = self.round(store, Some(parent));
            greatest = greatest.max(parent_round);
            if previous.is_some_and(|p| p != parent_round) {
                all_same = false;
            }
            previous = Some(parent_round);
        }

        // A parent in a lower round cannot help the event strongly see more.
        if !all_same && !self.weights.node_has_supermajority() {
            set_meta(store, id, |m| m.round_created = Some(greatest));
            return greatest;
        }
        if greatest == ROUND_NEGATIVE_INFINITY {
            set_meta(store, id, |m| m.round_created = Some(ROUND_NEGATIVE_INFINITY));
            return ROUND_NEGATIVE_INFINITY;
        }

        let mut weight = 0;
        for member in 0..self.weights.num_members() {
            if self.strongly_see_p(store, Some(id), member).is_some() {
                weight += self.weights.weight_at(member);
            }
        }
        let parent_round = self.parent_round(store, Some(id));
        let round = if self.weights.is_super_majority(weight) {
            parent_round + 1
        } else {
            parent_round
        };
        set_meta(store, id, |m| m.round_created = Some(round));
        round
    }

    /// The last event by `member` that is an ancestor of `id`.
    fn last_see(&self, store: &mut EventStore, id: Option<EventId>, member: usize) -> Option<EventId> {
        let id = id?;
        let event = store.get(id)?;
        if event.meta.round_created == Some(ROUND_NEGATIVE_INFINITY) {
            return None;
        }
        if !event.meta.last_see.is_empty() {
            return event.meta.last_see.get(member).copied().flatten();
        }

        let creator_index = self.weights.index_of(event.creator_id());
        let has_parents = !event.all_parents().is_empty();
        let parents = self.live_parents(store, id);

        let mut seen = vec![None; self.weights.num_members()];
        for (mm, slot) in seen.iter_mut().enumerate() {
            if creator_index == Some(mm) {
                *slot = Some(id);
                continue;
            }
            if !has_parents {
                continue;
            }
            // (latest event seen, parent it was seen through)
            let mut latest: Option<(EventId, EventId)> = None;
            for &parent in &parents {
                let Some(candidate) = self.last_see(store, Some(parent), mm) else {
                    continue;
                };
                let Some((current, via)) = latest else {
                    latest = Some((candidate, parent));
                    continue;
                };
                let higher_round = self.round(store, Some(candidate)) > self.round(store, Some(current));
                let later_on_same_witness = is_later(store, candidate, current)
                    && self.first_see(store, Some(parent), mm) == self.first_see(store, Some(via), mm);
                if higher_round || later_on_same_witness {
                    latest = Some((candidate, parent));
                }
            }
            *slot = latest.map(|(candidate, _)| candidate);
        }

        let answer = seen.get(member).copied().flatten();
        set_meta(store, id, |m| m.last_see = seen);
        answer
    }

    /// The witness by `member` that `id` sees through the last event by
    /// `through` it sees.
    fn see_thru(
        &self,
        store: &mut EventStore,
        id: Option<EventId>,
        member: usize,
        through: usize,
    ) -> Option<EventId> {
        let id = id?;
        if self.not_relevant(store, id) {
            return None;
        }
        let created_by_through = store
            .get(id)
            .is_some_and(|e| self.weights.index_of(e.creator_id()) == Some(through));
        if member == through && created_by_through {
            let self_parent = self.self_parent(store, id);
            return self.first_self_witness_s(store, self_parent);
        }
        let last = self.last_see(store, Some(id), through);
        self.first_see(store, last, member)
    }

    /// The witness by `member` in the parent round of `id` that `id` strongly
    /// sees.
    fn strongly_see_p(&self, store: &mut EventStore, id: Option<EventId>, member: usize) -> Option<EventId> {
        let id = id?;
        let event = store.get(id)?;
        if event.meta.round_created == Some(ROUND_NEGATIVE_INFINITY) {
            return None;
        }
        if !event.meta.strongly_see_p.is_empty() {
            return event.meta.strongly_see_p.get(member).copied().flatten();
        }

        let parent_round = self.parent_round(store, Some(id));
        let parents = self.live_parents(store, id);
        let num_members = self.weights.num_members();

        let mut strongly_seen = vec![None; num_members];
        'members: for (mm, slot) in strongly_seen.iter_mut().enumerate() {
            for &parent in &parents {
                let inherited = self.strongly_see_p(store, Some(parent), mm);
                if inherited.is_some() && self.parent_round(store, Some(parent)) == parent_round {
                    *slot = inherited;
                    continue 'members;
                }
            }

            let canonical = self.see_thru(store, Some(id), mm, mm);
            if canonical.is_none() || self.round(store, canonical) != parent_round {
                continue;
            }
            let mut weight = 0;
            for m3 in 0..num_members {
                if self.see_thru(store, Some(id), mm, m3) == canonical {
                    weight += self.weights.weight_at(m3);
                }
            }
            if self.weights.is_super_majority(weight) {
                *slot = canonical;
            }
        }

        let answer = strongly_seen.get(member).copied().flatten();
        set_meta(store, id, |m| m.strongly_see_p = strongly_seen);
        answer
    }

    /// The self-ancestor of `id` in the same round that is a witness.
    fn first_self_witness_s(&self, store: &mut EventStore, id: Option<EventId>) -> Option<EventId> {
        let id = id?;
        let event = store.get(id)?;
        if event.meta.round_created == Some(ROUND_NEGATIVE_INFINITY) {
            return None;
        }
        if let Some(found) = event.meta.first_self_witness_s {
            return Some(found);
        }

        let self_parent = self.self_parent(store, id);
        let found = if self.round(store, Some(id)) > self.round(store, self_parent) {
            Some(id)
        } else {
            self.first_self_witness_s(store, self_parent)
        };
        set_meta(store, id, |m| m.first_self_witness_s = found);
        found
    }

    /// The earliest witness in the same round that is an ancestor of `id`.
    fn first_witness_s(&self, store: &mut EventStore, id: Option<EventId>) -> Option<EventId> {
        let id = id?;
        let event = store.get(id)?;
        if event.meta.round_created == Some(ROUND_NEGATIVE_INFINITY) {
            return None;
        }
        if let Some(found) = event.meta.first_witness_s {
            return Some(found);
        }

        let round = self.round(store, Some(id));
        let mut found = Some(id);
        if round <= self.parent_round(store, Some(id)) {
            let parents = store.get(id).map(|e| e.all_parents().to_vec()).unwrap_or_default();
            for parent in parents {
                if self.round(store, Some(parent)) == round {
                    found = self.first_witness_s(store, Some(parent));
                    break;
                }
            }
        }
        set_meta(store, id, |m| m.first_witness_s = found);
        found
    }

    fn strongly_see_s1(&self, store: &mut EventStore, id: Option<EventId>, member: usize) -> Option<EventId> {
        let first_witness = self.first_witness_s(store, id);
        self.strongly_see_p(store, first_witness, member)
    }

    fn first_see(&self, store: &mut EventStore, id: Option<EventId>, member: usize) -> Option<EventId> {
        let last = self.last_see(store, id, member);
        self.first_self_witness_s(store, last)
    }
}

fn set_meta(store: &mut EventStore, id: EventId, update: impl FnOnce(&mut ConsensusMetadata)) {
    if let Some(event) = store.get_mut(id) {
        update(&mut event.meta);
    }
}

/// Whether `a` comes after `b` on its creator's chain.
fn is_later(store: &EventStore, a: EventId, b: EventId) -> bool {
    match (store.get(a), store.get(b)) {
        (Some(a), Some(b)) => a.de_gen() > b.de_gen(),
        _ => false,
    }
}
