//! # Hashgraph Replica Simulator
//!
//! Generates a random signed hashgraph, then runs several replicas over it,
//! each receiving the events in a different order, and checks that every
//! replica emits the same rounds.
//!
//! ## Sequence
//!
//! 1. Load configuration (defaults plus `HG_*` environment overrides)
//! 2. Initialize logging
//! 3. Build the reference run: generate events and feed them in causal order
//! 4. Start one `NodeRuntime` per replica and deliver a reordered copy
//! 5. Compare each replica's rounds against the reference

use anyhow::{bail, Context, Result};
use shared_types::testing::{shuffled_within, GraphGenerator, TestNetwork};
use shared_types::{ConsensusRound, EventHash, PlatformEvent, Timestamp};
use tracing::{info, warn};

use node_runtime::{
    init_logging, override_from_env, ChannelRoundConsumer, EventPipeline, NodeConfig, NodeRuntime,
};

/// One round reduced to what replicas must agree on.
type RoundSummary = (u64, Vec<(EventHash, u64, Timestamp)>);

/// Simulation parameters.
#[derive(Debug, Clone)]
struct SimulationConfig {
    nodes: usize,
    events: usize,
    replicas: usize,
    /// Largest number of positions an event may move during delivery.
    reorder_window: usize,
    seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            nodes: 4,
            events: 2_000,
            replicas: 3,
            reorder_window: 16,
            seed: 42,
        }
    }
}

fn load_simulation_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    override_from_env("HG_SIM_NODES", &mut config.nodes);
    override_from_env("HG_SIM_EVENTS", &mut config.events);
    override_from_env("HG_SIM_REPLICAS", &mut config.replicas);
    override_from_env("HG_SIM_REORDER_WINDOW", &mut config.reorder_window);
    override_from_env("HG_SIM_SEED", &mut config.seed);
    config
}

fn summarize(round: &ConsensusRound) -> RoundSummary {
    let events = round
        .events
        .iter()
        .map(|e| (e.event.hash().clone(), e.consensus_order, e.consensus_timestamp))
        .collect();
    (round.round_number, events)
}

/// Generate the graph and the rounds a causally ordered delivery produces.
///
/// New events are stamped with the birth round the reference pipeline asks
/// for, as a live creator would.
fn reference_run(
    config: &NodeConfig,
    network: &TestNetwork,
    sim: &SimulationConfig,
) -> Result<(Vec<PlatformEvent>, Vec<RoundSummary>)> {
    let mut pipeline = EventPipeline::new(config, network.history());
    let mut generator = GraphGenerator::new(network.clone(), sim.seed);
    let mut events = Vec::with_capacity(sim.events);
    let mut rounds = Vec::new();

    for _ in 0..sim.events {
        let event = generator.next_event();
        events.push(event.clone());
        let decided = pipeline
            .submit(event)
            .context("Reference pipeline rejected a generated event")?;
        if let Some(last) = decided.last() {
            generator.set_birth_round_floor(last.event_window.new_event_birth_round);
        }
        rounds.extend(decided.iter().map(summarize));
    }
    Ok((events, rounds))
}

async fn run_replica(
    config: &NodeConfig,
    network: &TestNetwork,
    events: Vec<PlatformEvent>,
) -> Result<Vec<RoundSummary>> {
    let (consumer, mut rounds_rx) = ChannelRoundConsumer::new(config.pipeline.round_channel_capacity);
    let runtime = NodeRuntime::start(config, network.history(), consumer)?;
    let handle = runtime.handle();

    let collector = tokio::spawn(async move {
        let mut rounds = Vec::new();
        while let Some(round) = rounds_rx.recv().await {
            rounds.push(summarize(&round));
        }
        rounds
    });

    for event in events {
        handle.submit(event).await?;
    }
    // Queries are answered in order, so this waits for every event above.
    let pending = handle.pre_consensus_events().await?;
    info!(
        pending = pending.len(),
        latest_round = handle.event_window().latest_consensus_round,
        discarded = handle.counter().exited(),
        "Replica drained"
    );

    drop(handle);
    runtime.shutdown().await?;
    collector.await.context("Round collector failed")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env();
    init_logging(&config.logging)?;
    config.validate()?;
    let sim = load_simulation_config();
    info!(?sim, "Starting replica simulation");

    let network = TestNetwork::new(sim.nodes);
    let (events, reference) = reference_run(&config, &network, &sim)?;
    let ordered: usize = reference.iter().map(|(_, events)| events.len()).sum();
    info!(
        events = events.len(),
        rounds = reference.len(),
        ordered,
        "Reference run complete"
    );
    if reference.is_empty() {
        warn!("No round was decided; increase HG_SIM_EVENTS");
    }

    for replica in 0..sim.replicas {
        let delivery = shuffled_within(
            events.clone(),
            sim.reorder_window,
            sim.seed.wrapping_add(replica as u64 + 1),
        );
        let rounds = run_replica(&config, &network, delivery).await?;

        if rounds != reference {
            let diverged = rounds
                .iter()
                .zip(&reference)
                .position(|(a, b)| a != b)
                .unwrap_or(rounds.len().min(reference.len()));
            bail!(
                "Replica {} diverged at round index {} ({} rounds vs {} in reference)",
                replica,
                diverged,
                rounds.len(),
                reference.len()
            );
        }
        info!(replica, rounds = rounds.len(), "Replica agrees with reference");
    }

    info!(replicas = sim.replicas, "All replicas agree");
    Ok(())
}
