//! # Finality
//!
//! Once a round is emitted its events keep their position forever. Feeding
//! the same events again must not produce anything new.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use hg_01_event_intake::DiscardReason;
    use node_runtime::NodeConfig;
    use shared_types::testing::TestNetwork;
    use shared_types::{EventHash, FIRST_CONSENSUS_NUMBER, ROUND_FIRST};

    use crate::support::reference_run;

    #[test]
    fn test_rounds_gapless_and_order_strictly_increasing() {
        let run = reference_run(&NodeConfig::default(), &TestNetwork::new(4), 11, 500);
        assert!(!run.rounds.is_empty());

        let mut next_order = FIRST_CONSENSUS_NUMBER;
        let mut last_time = None;
        for (i, round) in run.rounds.iter().enumerate() {
            assert_eq!(round.round_number, ROUND_FIRST + i as u64);
            for event in &round.events {
                assert_eq!(event.consensus_order, next_order);
                assert_eq!(event.round_received, round.round_number);
                if let Some(last) = last_time {
                    assert!(event.consensus_timestamp > last);
                }
                last_time = Some(event.consensus_timestamp);
                next_order += 1;
            }
            assert_eq!(round.snapshot.next_consensus_number, next_order);
        }
    }

    #[test]
    fn test_no_event_reaches_consensus_twice() {
        let run = reference_run(&NodeConfig::default(), &TestNetwork::new(5), 13, 500);

        let mut seen: HashSet<EventHash> = HashSet::new();
        for event in run.rounds.iter().flat_map(|r| r.events.iter()) {
            assert!(seen.insert(event.event.hash().clone()));
        }
        for pending in run.pipeline.pre_consensus_events() {
            assert!(!seen.contains(pending.hash()));
        }
    }

    #[test]
    fn test_redelivery_after_finality_changes_nothing() {
        let mut run = reference_run(&NodeConfig::default(), &TestNetwork::new(4), 17, 400);
        let window = run.pipeline.event_window();
        let pending_before = run.pipeline.pre_consensus_events().len();
        let discarded_before = run.pipeline.counter().exited();

        let mut emitted = Vec::new();
        for event in run.events.iter().cloned() {
            emitted.extend(run.pipeline.submit(event).unwrap());
        }

        assert!(emitted.is_empty());
        assert_eq!(run.pipeline.event_window(), window);
        assert_eq!(run.pipeline.pre_consensus_events().len(), pending_before);

        let counter = run.pipeline.counter();
        let rejected = counter.discarded(DiscardReason::Duplicate)
            + counter.discarded(DiscardReason::Ancient);
        assert_eq!(rejected, run.events.len() as u64);
        assert_eq!(counter.exited() - discarded_before, run.events.len() as u64);
    }

    #[test]
    fn test_later_events_only_extend_output() {
        let config = NodeConfig::default();
        let network = TestNetwork::new(4);
        let short = reference_run(&config, &network, 23, 250);
        let long = reference_run(&config, &network, 23, 500);

        // Same seed: the shorter run is a prefix of the longer one.
        assert_eq!(short.events[..], long.events[..short.events.len()]);
        assert!(long.rounds.len() >= short.rounds.len());
        assert_eq!(short.rounds[..], long.rounds[..short.rounds.len()]);
    }
}
