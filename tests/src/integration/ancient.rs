//! # Ancient Threshold
//!
//! The window only moves forward, and every stage forgets what falls below
//! it.

#[cfg(test)]
mod tests {
    use hg_01_event_intake::DiscardReason;
    use shared_types::testing::{phantom_descriptor, TestNetwork, TestingEventBuilder};
    use shared_types::{NodeId, ROUND_FIRST};

    use crate::support::{reference_run, short_window_config};

    #[test]
    fn test_thresholds_never_decrease() {
        let run = reference_run(&short_window_config(), &TestNetwork::new(4), 31, 800);

        let mut ancient = ROUND_FIRST;
        let mut expired = ROUND_FIRST;
        for round in &run.rounds {
            let window = round.event_window;
            assert!(window.ancient_threshold >= ancient);
            assert!(window.expired_threshold >= expired);
            assert!(window.expired_threshold <= window.ancient_threshold);
            ancient = window.ancient_threshold;
            expired = window.expired_threshold;
        }
        assert!(ancient > ROUND_FIRST, "window never advanced");
    }

    #[test]
    fn test_late_ancient_event_discarded_at_intake() {
        let network = TestNetwork::new(4);
        let mut run = reference_run(&short_window_config(), &network, 37, 800);
        assert!(run.pipeline.event_window().ancient_threshold > ROUND_FIRST);

        let late = TestingEventBuilder::new(NodeId(2))
            .birth_round(ROUND_FIRST)
            .transactions(vec![vec![7; 8]])
            .signed_by(network.key(NodeId(2)))
            .build();
        assert!(run.pipeline.submit(late).unwrap().is_empty());
        assert_eq!(run.pipeline.counter().discarded(DiscardReason::Ancient), 1);
    }

    #[test]
    fn test_orphan_with_lost_parent_is_evicted() {
        let network = TestNetwork::new(4);
        let config = short_window_config();
        let mut run = reference_run(&config, &network, 41, 50);

        let stranded = TestingEventBuilder::new(NodeId(1))
            .parent_descriptor(phantom_descriptor(NodeId(3), ROUND_FIRST, 0x5A))
            .signed_by(network.key(NodeId(1)))
            .build();
        run.pipeline.submit(stranded).unwrap();
        assert_eq!(run.pipeline.orphan_count(), 1);

        // Keep the same graph growing until round 1 is ancient.
        let longer = reference_run(&config, &network, 41, 800);
        for event in longer.events.into_iter().skip(50) {
            run.pipeline.submit(event).unwrap();
        }
        assert!(run.pipeline.event_window().ancient_threshold > ROUND_FIRST);
        assert_eq!(run.pipeline.orphan_count(), 0);
    }

    #[test]
    fn test_pre_consensus_events_are_never_ancient() {
        let run = reference_run(&short_window_config(), &TestNetwork::new(4), 43, 800);
        let window = run.pipeline.event_window();

        for event in run.pipeline.pre_consensus_events() {
            assert!(!window.is_event_ancient(&event));
        }
    }
}
