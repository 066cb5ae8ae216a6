//! # Internal Event Validator
//!
//! Structural and self-consistency checks on a single event. No DAG or
//! network context is consulted; the only external input is the size of the
//! roster applicable to the event's birth round.

use std::collections::HashMap;
use std::sync::Arc;

use shared_types::{NodeId, PlatformEvent, Roster};
use tracing::debug;

use super::counter::IntakeEventCounter;
use super::errors::{DiscardReason, ValidationError};
use crate::config::IntakeConfig;
use crate::ports::outbound::EventFieldValidator;

/// Default field validator.
///
/// Records every rejection as a malformed discard on the shared counter.
#[derive(Debug, Clone)]
pub struct InternalEventValidator {
    config: IntakeConfig,
    counter: Arc<IntakeEventCounter>,
}

impl InternalEventValidator {
    pub fn new(config: IntakeConfig, counter: Arc<IntakeEventCounter>) -> Self {
        Self { config, counter }
    }

    fn check(&self, event: &PlatformEvent, roster: &Roster) -> Result<(), ValidationError> {
        if event.time_created().is_none() {
            return Err(ValidationError::MissingTimeCreated);
        }
        if event.signature().is_empty() {
            return Err(ValidationError::EmptySignature);
        }
        self.check_parent_descriptors(event)?;
        self.check_transactions(event)?;
        check_parent_creators(event, roster)?;
        check_birth_round(event)
    }

    fn check_parent_descriptors(&self, event: &PlatformEvent) -> Result<(), ValidationError> {
        for (index, slot) in event.parent_slots().iter().enumerate() {
            let parent = slot.as_ref().ok_or(ValidationError::NullParent { index })?;
            if parent.hash.len() != self.config.digest_length {
                return Err(ValidationError::InvalidParentHashLength {
                    expected: self.config.digest_length,
                    actual: parent.hash.len(),
                });
            }
        }
        Ok(())
    }

    fn check_transactions(&self, event: &PlatformEvent) -> Result<(), ValidationError> {
        let mut total = 0usize;
        for (index, tx) in event.transactions().iter().enumerate() {
            if tx.is_empty() {
                return Err(ValidationError::EmptyTransaction { index });
            }
            total = total.saturating_add(tx.len());
        }
        if total > self.config.max_transaction_bytes_per_event {
            return Err(ValidationError::TooManyTransactionBytes {
                total,
                limit: self.config.max_transaction_bytes_per_event,
            });
        }
        Ok(())
    }
}

/// At most one parent per creator. The only exception is a single-member
/// network, where the creator's previous event is both self and other parent.
fn check_parent_creators(event: &PlatformEvent, roster: &Roster) -> Result<(), ValidationError> {
    let mut by_creator: HashMap<NodeId, usize> = HashMap::new();
    for parent in event.all_parents() {
        *by_creator.entry(parent.creator).or_default() += 1;
    }

    for (&creator, &count) in &by_creator {
        if count < 2 {
            continue;
        }
        let parents: Vec<_> = event.all_parents().collect();
        let identical_self_parents =
            creator == event.creator_id() && count == 2 && parents.len() == 2 && parents[0] == parents[1];
        if !identical_self_parents {
            return Err(ValidationError::DuplicateParentCreator { creator });
        }
        if roster.len() != 1 {
            return Err(ValidationError::IdenticalParentsInMultiNodeNetwork {
                roster_size: roster.len(),
            });
        }
    }
    Ok(())
}

fn check_birth_round(event: &PlatformEvent) -> Result<(), ValidationError> {
    match event.max_parent_birth_round() {
        Some(max_parent_birth_round) if event.birth_round() < max_parent_birth_round => {
            Err(ValidationError::InvalidBirthRound {
                birth_round: event.birth_round(),
                max_parent_birth_round,
            })
        }
        _ => Ok(()),
    }
}

impl EventFieldValidator for InternalEventValidator {
    fn validate(&self, event: &PlatformEvent, roster: &Roster) -> Result<(), ValidationError> {
        self.check(event, roster).inspect_err(|err| {
            debug!(
                creator = %event.creator_id(),
                birth_round = event.birth_round(),
                reason = err.label(),
                "Discarding malformed event: {}",
                err
            );
            self.counter.record_discard(DiscardReason::Malformed);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::testing::{phantom_descriptor, TestNetwork, TestingEventBuilder};
    use shared_types::{EventDescriptor, EventHash};

    fn validator() -> (InternalEventValidator, Arc<IntakeEventCounter>) {
        let counter = Arc::new(IntakeEventCounter::new());
        let config = IntakeConfig {
            max_transaction_bytes_per_event: 100,
            ..IntakeConfig::default()
        };
        (InternalEventValidator::new(config, counter.clone()), counter)
    }

    fn roster(size: usize) -> Roster {
        TestNetwork::new(size).roster
    }

    #[test]
    fn test_well_formed_event_passes() {
        let (validator, counter) = validator();
        let parent = TestingEventBuilder::new(NodeId(0)).build();
        let other = TestingEventBuilder::new(NodeId(1)).build();
        let event = TestingEventBuilder::new(NodeId(0))
            .self_parent(&parent)
            .other_parent(&other)
            .transactions(vec![vec![1; 40], vec![2; 60]])
            .build();

        assert_eq!(validator.validate(&event, &roster(4)), Ok(()));
        assert_eq!(counter.exited(), 0);
    }

    #[test]
    fn test_missing_time_created() {
        let (validator, counter) = validator();
        let event = TestingEventBuilder::new(NodeId(0)).without_time_created().build();
        assert_eq!(
            validator.validate(&event, &roster(4)),
            Err(ValidationError::MissingTimeCreated)
        );
        assert_eq!(counter.discarded(DiscardReason::Malformed), 1);
    }

    #[test]
    fn test_empty_signature() {
        let (validator, _) = validator();
        let event = TestingEventBuilder::new(NodeId(0)).signature(vec![]).build();
        assert_eq!(
            validator.validate(&event, &roster(4)),
            Err(ValidationError::EmptySignature)
        );
    }

    #[test]
    fn test_null_parent_anywhere_is_invalid() {
        let (validator, _) = validator();
        let event = TestingEventBuilder::new(NodeId(0))
            .parent_descriptor(phantom_descriptor(NodeId(0), 1, 1))
            .null_parent()
            .build();
        assert_eq!(
            validator.validate(&event, &roster(4)),
            Err(ValidationError::NullParent { index: 1 })
        );
    }

    #[test]
    fn test_short_parent_hash() {
        let (validator, _) = validator();
        let event = TestingEventBuilder::new(NodeId(0))
            .parent_descriptor(EventDescriptor::new(EventHash(vec![1; 32]), NodeId(1), 1))
            .build();
        assert_eq!(
            validator.validate(&event, &roster(4)),
            Err(ValidationError::InvalidParentHashLength {
                expected: 48,
                actual: 32
            })
        );
    }

    #[test]
    fn test_transaction_limits() {
        let (validator, _) = validator();
        let too_big = TestingEventBuilder::new(NodeId(0))
            .transactions(vec![vec![1; 60], vec![2; 41]])
            .build();
        assert_eq!(
            validator.validate(&too_big, &roster(4)),
            Err(ValidationError::TooManyTransactionBytes {
                total: 101,
                limit: 100
            })
        );

        let empty = TestingEventBuilder::new(NodeId(0))
            .transactions(vec![vec![1], vec![]])
            .build();
        assert_eq!(
            validator.validate(&empty, &roster(4)),
            Err(ValidationError::EmptyTransaction { index: 1 })
        );
    }

    #[test]
    fn test_birth_round_below_parent_is_invalid() {
        let (validator, _) = validator();
        let event = TestingEventBuilder::new(NodeId(0))
            .parent_descriptor(phantom_descriptor(NodeId(0), 7, 1))
            .parent_descriptor(phantom_descriptor(NodeId(1), 5, 2))
            .birth_round(6)
            .build();
        assert_eq!(
            validator.validate(&event, &roster(4)),
            Err(ValidationError::InvalidBirthRound {
                birth_round: 6,
                max_parent_birth_round: 7
            })
        );
    }

    #[test]
    fn test_identical_parents_only_in_single_node_network() {
        let (validator, _) = validator();
        let parent = phantom_descriptor(NodeId(0), 1, 9);

        let single = TestingEventBuilder::new(NodeId(0))
            .parent_descriptor(parent.clone())
            .parent_descriptor(parent.clone())
            .birth_round(1)
            .build();
        assert_eq!(validator.validate(&single, &roster(1)), Ok(()));

        let grown = TestingEventBuilder::new(NodeId(0))
            .parent_descriptor(parent.clone())
            .parent_descriptor(parent)
            .birth_round(2)
            .build();
        assert_eq!(
            validator.validate(&grown, &roster(2)),
            Err(ValidationError::IdenticalParentsInMultiNodeNetwork { roster_size: 2 })
        );
    }

    #[test]
    fn test_two_parents_from_same_other_creator() {
        let (validator, _) = validator();
        let event = TestingEventBuilder::new(NodeId(0))
            .parent_descriptor(phantom_descriptor(NodeId(1), 1, 1))
            .parent_descriptor(phantom_descriptor(NodeId(1), 1, 2))
            .build();
        assert_eq!(
            validator.validate(&event, &roster(4)),
            Err(ValidationError::DuplicateParentCreator { creator: NodeId(1) })
        );
    }

    proptest! {
        #[test]
        fn prop_validation_is_idempotent(
            tx_sizes in proptest::collection::vec(0usize..60, 0..4),
            birth_round in 1u64..10,
            parent_round in 1u64..10,
        ) {
            let (validator, _) = validator();
            let event = TestingEventBuilder::new(NodeId(2))
                .parent_descriptor(phantom_descriptor(NodeId(3), parent_round, 4))
                .transactions(tx_sizes.iter().map(|&n| vec![7u8; n]).collect())
                .birth_round(birth_round)
                .build();
            let before = event.clone();

            let first = validator.validate(&event, &roster(4));
            let second = validator.validate(&event, &roster(4));
            prop_assert_eq!(first, second);
            prop_assert_eq!(event, before);
        }
    }
}
