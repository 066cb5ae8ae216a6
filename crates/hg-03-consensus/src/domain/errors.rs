//! Error types for linking and consensus.
//!
//! Expected discards (ancient events, non-members) are not errors. Everything
//! here means an upstream contract was broken.

use shared_types::{EventDescriptor, EventHash};
use thiserror::Error;

/// Internal invariant violations detected while linking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkerError {
    /// The orphan buffer must attach a generation before linking.
    #[error("Event {0:?} has no generation number")]
    UnassignedGeneration(EventHash),

    /// A non-ancient parent was never linked.
    #[error("Event {child:?} references missing non-ancient parent {parent:?}")]
    MissingParent {
        child: EventHash,
        parent: EventDescriptor,
    },
}

/// Errors surfaced by the consensus engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("Linking failed: {0}")]
    Linker(#[from] LinkerError),
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
