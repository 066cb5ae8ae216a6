//! Reference runs and replicas.

use hg_03_consensus::ConsensusConfig;
use node_runtime::{EventPipeline, NodeConfig};
use shared_types::testing::{GraphGenerator, TestNetwork};
use shared_types::{ConsensusRound, EventHash, NodeId, PlatformEvent, RosterHistory, Timestamp};

/// One round reduced to what replicas must agree on.
pub type RoundSummary = (u64, Vec<(EventHash, u64, Timestamp)>);

pub fn summarize(rounds: &[ConsensusRound]) -> Vec<RoundSummary> {
    rounds
        .iter()
        .map(|r| {
            let events = r
                .events
                .iter()
                .map(|e| (e.event.hash().clone(), e.consensus_order, e.consensus_timestamp))
                .collect();
            (r.round_number, events)
        })
        .collect()
}

/// A generated graph and what a causally ordered delivery made of it.
pub struct ReferenceRun {
    pub pipeline: EventPipeline,
    pub events: Vec<PlatformEvent>,
    pub rounds: Vec<ConsensusRound>,
}

/// Generate `count` events and feed them in creation order. New events carry
/// the birth round the pipeline's latest window asks for.
pub fn reference_run(
    config: &NodeConfig,
    network: &TestNetwork,
    seed: u64,
    count: usize,
) -> ReferenceRun {
    let mut pipeline = EventPipeline::new(config, network.history());
    let mut generator = GraphGenerator::new(network.clone(), seed);
    let mut events = Vec::with_capacity(count);
    let mut rounds = Vec::new();

    for _ in 0..count {
        let event = generator.next_event();
        events.push(event.clone());
        let decided = pipeline
            .submit(event)
            .unwrap_or_else(|err| panic!("reference run failed: {err}"));
        if let Some(last) = decided.last() {
            generator.set_birth_round_floor(last.event_window.new_event_birth_round);
        }
        rounds.extend(decided);
    }

    ReferenceRun {
        pipeline,
        events,
        rounds,
    }
}

/// A roster change announced while the graph is being generated.
#[derive(Debug, Clone, Copy)]
pub struct Departure {
    pub node_id: NodeId,
    /// First round whose roster no longer holds `node_id`.
    pub effective_round: u64,
    /// Latest decided round at which the new history is handed over.
    pub announced_after: u64,
}

/// Like `reference_run`, but the pipeline starts on the network's single
/// roster and learns of `departure` mid-run. The departing node stops
/// creating once new events are born in the effective round.
pub fn transition_run(
    config: &NodeConfig,
    network: &TestNetwork,
    departure: Departure,
    seed: u64,
    count: usize,
) -> ReferenceRun {
    let mut pipeline = EventPipeline::new(config, network.history());
    let mut generator = GraphGenerator::new(network.clone(), seed);
    let mut events = Vec::with_capacity(count);
    let mut rounds = Vec::new();
    let mut announced = false;

    for _ in 0..count {
        let event = generator.next_event();
        events.push(event.clone());
        let decided = pipeline
            .submit(event)
            .unwrap_or_else(|err| panic!("transition run failed: {err}"));
        if let Some(last) = decided.last() {
            if !announced && last.round_number >= departure.announced_after {
                pipeline.update_roster_history(
                    network.transition_history(&[departure.node_id], departure.effective_round),
                );
                announced = true;
            }
            let floor = last.event_window.new_event_birth_round;
            generator.set_birth_round_floor(floor);
            if floor >= departure.effective_round {
                generator.retire(departure.node_id);
            }
        }
        rounds.extend(decided);
    }

    ReferenceRun {
        pipeline,
        events,
        rounds,
    }
}

/// Feed `events` into a fresh pipeline.
pub fn replay(
    config: &NodeConfig,
    network: &TestNetwork,
    events: impl IntoIterator<Item = PlatformEvent>,
) -> (EventPipeline, Vec<ConsensusRound>) {
    replay_with_history(config, network.history(), events)
}

/// Feed `events` into a fresh pipeline that starts on `history`.
pub fn replay_with_history(
    config: &NodeConfig,
    history: RosterHistory,
    events: impl IntoIterator<Item = PlatformEvent>,
) -> (EventPipeline, Vec<ConsensusRound>) {
    let mut pipeline = EventPipeline::new(config, history);
    let mut rounds = Vec::new();
    for event in events {
        let decided = pipeline
            .submit(event)
            .unwrap_or_else(|err| panic!("replica failed: {err}"));
        rounds.extend(decided);
    }
    (pipeline, rounds)
}

/// Short ancient window so thresholds move within a few hundred events.
pub fn short_window_config() -> NodeConfig {
    NodeConfig {
        consensus: ConsensusConfig {
            rounds_non_ancient: 4,
            rounds_expired: 8,
            ..ConsensusConfig::default()
        },
        ..NodeConfig::default()
    }
}
