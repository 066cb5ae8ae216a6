//! # Replica Determinism
//!
//! Replicas receiving the same events in different orders must emit
//! identical rounds: same round numbers, same events, same consensus order
//! and timestamps.

#[cfg(test)]
mod tests {
    use node_runtime::{ChannelRoundConsumer, NodeConfig, NodeRuntime};
    use proptest::prelude::*;
    use shared_types::testing::{shuffled_within, TestNetwork};

    use crate::support::{reference_run, replay, summarize};

    fn assert_replicas_agree(network: TestNetwork, seed: u64, count: usize) {
        let config = NodeConfig::default();
        let reference = reference_run(&config, &network, seed, count);
        assert!(!reference.rounds.is_empty(), "reference run decided nothing");
        let expected = summarize(&reference.rounds);

        for replica in 0..3u64 {
            let delivery = shuffled_within(reference.events.clone(), 12, seed ^ (replica + 1));
            let (pipeline, rounds) = replay(&config, &network, delivery);
            assert_eq!(summarize(&rounds), expected, "replica {replica} diverged");
            assert_eq!(pipeline.orphan_count(), 0);
        }
    }

    #[test]
    fn test_equal_weight_replicas_agree() {
        assert_replicas_agree(TestNetwork::new(4), 101, 400);
    }

    #[test]
    fn test_skewed_weight_replicas_agree() {
        assert_replicas_agree(TestNetwork::with_weights(&[5, 3, 1, 1]), 202, 400);
    }

    #[test]
    fn test_larger_network_replicas_agree() {
        assert_replicas_agree(TestNetwork::new(7), 303, 600);
    }

    #[test]
    fn test_reversed_chunks_agree() {
        let config = NodeConfig::default();
        let network = TestNetwork::new(4);
        let reference = reference_run(&config, &network, 404, 300);

        // Every chunk of eight delivered back to front: children before parents.
        let delivery: Vec<_> = reference
            .events
            .chunks(8)
            .flat_map(|chunk| chunk.iter().rev().cloned())
            .collect();
        let (_, rounds) = replay(&config, &network, delivery);
        assert_eq!(summarize(&rounds), summarize(&reference.rounds));
    }

    #[tokio::test]
    async fn test_runtime_replicas_agree() {
        let config = NodeConfig::default();
        let network = TestNetwork::new(4);
        let reference = reference_run(&config, &network, 505, 300);
        let expected = summarize(&reference.rounds);

        for replica in 0..2u64 {
            let (consumer, mut rounds_rx) = ChannelRoundConsumer::new(1024);
            let runtime = NodeRuntime::start(&config, network.history(), consumer).unwrap();
            let handle = runtime.handle();
            for event in shuffled_within(reference.events.clone(), 6, replica) {
                handle.submit(event).await.unwrap();
            }
            handle.pre_consensus_events().await.unwrap();
            drop(handle);
            runtime.shutdown().await.unwrap();

            let mut rounds = Vec::new();
            while let Some(round) = rounds_rx.recv().await {
                rounds.push(round);
            }
            assert_eq!(summarize(&rounds), expected);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_any_bounded_reordering_agrees(seed in 0u64..1_000, chunk in 1usize..20) {
            let config = NodeConfig::default();
            let network = TestNetwork::new(4);
            let reference = reference_run(&config, &network, seed, 200);

            let delivery = shuffled_within(reference.events.clone(), chunk, seed.wrapping_mul(31));
            let (_, rounds) = replay(&config, &network, delivery);
            prop_assert_eq!(summarize(&rounds), summarize(&reference.rounds));
        }
    }
}
