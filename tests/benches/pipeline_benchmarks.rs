//! # Hashgraph-Node Pipeline Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | event-pipeline | intake, orphan buffer and consensus per event |
//! | consensus-engine | linking and virtual voting alone |
//! | orphan-buffer | release of a fully reversed delivery |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;

use hg_02_orphan_buffer::OrphanBuffer;
use hg_03_consensus::{ConsensusApi, ConsensusEngine};
use hg_tests::support::{reference_run, replay};
use node_runtime::NodeConfig;
use shared_types::testing::{assign_generations, shuffled_within, TestNetwork};

const EVENTS: usize = 1_000;

fn bench_event_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("event-pipeline");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(10);

    let config = NodeConfig::default();
    for nodes in [4, 10, 25] {
        let network = TestNetwork::new(nodes);
        let events = reference_run(&config, &network, 7, EVENTS).events;

        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_with_input(BenchmarkId::new("causal", nodes), &events, |b, events| {
            b.iter(|| black_box(replay(&config, &network, events.iter().cloned())))
        });

        let reordered = shuffled_within(events, 16, 99);
        group.bench_with_input(
            BenchmarkId::new("reordered", nodes),
            &reordered,
            |b, events| b.iter(|| black_box(replay(&config, &network, events.iter().cloned()))),
        );
    }
    group.finish();
}

fn bench_consensus_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("consensus-engine");
    group.sample_size(10);

    let config = NodeConfig::default();
    for nodes in [4, 10, 25] {
        let network = TestNetwork::new(nodes);
        let mut events = reference_run(&config, &network, 11, EVENTS).events;
        assign_generations(&mut events);

        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &events, |b, events| {
            b.iter(|| {
                let mut engine =
                    ConsensusEngine::new(config.consensus.clone(), Arc::new(network.history()));
                for event in events.iter().cloned() {
                    black_box(engine.add_event(event).ok());
                }
            })
        });
    }
    group.finish();
}

fn bench_orphan_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("orphan-buffer");

    let network = TestNetwork::new(4);
    let mut reversed = reference_run(&NodeConfig::default(), &network, 13, EVENTS).events;
    reversed.reverse();

    group.throughput(Throughput::Elements(reversed.len() as u64));
    group.bench_function("reversed_delivery", |b| {
        b.iter(|| {
            let mut buffer = OrphanBuffer::new();
            let mut released = 0;
            for event in reversed.iter().cloned() {
                released += buffer.handle_event(event).len();
            }
            black_box(released)
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_event_pipeline,
    bench_consensus_engine,
    bench_orphan_release
);
criterion_main!(benches);
