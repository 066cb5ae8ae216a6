//! # Roster Transitions
//!
//! A member leaves the roster while the network runs. Its events born before
//! the effective round stay valid and linkable, and rounds keep being decided
//! on the smaller roster afterwards.

#[cfg(test)]
mod tests {
    use hg_01_event_intake::DiscardReason;
    use node_runtime::NodeConfig;
    use shared_types::testing::{shuffled_within, TestNetwork};
    use shared_types::{NodeId, ROUND_FIRST};

    use crate::support::{replay_with_history, summarize, transition_run, Departure};

    const DEPARTURE: Departure = Departure {
        node_id: NodeId(4),
        effective_round: 6,
        announced_after: 2,
    };

    #[test]
    fn test_rounds_continue_past_transition() {
        let config = NodeConfig::default();
        let network = TestNetwork::new(5);
        let run = transition_run(&config, &network, DEPARTURE, 606, 1_000);

        for (i, round) in run.rounds.iter().enumerate() {
            assert_eq!(round.round_number, ROUND_FIRST + i as u64, "round gap at index {i}");
        }
        let latest = run.rounds.last().map(|r| r.round_number).unwrap_or_default();
        assert!(
            latest >= DEPARTURE.effective_round + 3,
            "stalled at round {latest} after the transition"
        );
        assert_eq!(run.pipeline.counter().exited(), 0);
        assert_eq!(run.pipeline.engine().roster().len(), 4);
    }

    #[test]
    fn test_departing_member_reaches_consensus_before_transition() {
        let config = NodeConfig::default();
        let network = TestNetwork::new(5);
        let run = transition_run(&config, &network, DEPARTURE, 707, 1_000);

        let departing: Vec<u64> = run
            .rounds
            .iter()
            .flat_map(|r| r.events.iter())
            .filter(|e| e.event.creator_id() == DEPARTURE.node_id)
            .map(|e| e.event.birth_round())
            .collect();
        assert!(!departing.is_empty());
        assert!(departing.iter().all(|br| *br < DEPARTURE.effective_round));
    }

    #[test]
    fn test_replica_knowing_transition_early_agrees() {
        let config = NodeConfig::default();
        let network = TestNetwork::new(5);
        let run = transition_run(&config, &network, DEPARTURE, 808, 900);
        assert!(!run.rounds.is_empty());
        let history = network.transition_history(&[DEPARTURE.node_id], DEPARTURE.effective_round);

        for replica in 0..2u64 {
            let delivery = shuffled_within(run.events.clone(), 10, 808 ^ (replica + 1));
            let (pipeline, rounds) = replay_with_history(&config, history.clone(), delivery);
            assert_eq!(summarize(&rounds), summarize(&run.rounds), "replica {replica} diverged");
            assert_eq!(pipeline.counter().discarded(DiscardReason::NonMember), 0);
        }
    }
}
