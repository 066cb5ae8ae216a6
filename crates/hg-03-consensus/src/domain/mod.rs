//! Domain layer for linking and consensus.

pub mod algorithm;
pub mod errors;
pub mod linker;
pub mod order;
pub mod rounds;
pub mod store;
pub mod weights;

pub use algorithm::Consensus;
pub use errors::{ConsensusError, ConsensusResult, LinkerError};
pub use linker::ConsensusLinker;
pub use rounds::{CandidateWitness, ConsensusRounds, RoundElections};
pub use store::{ConsensusMetadata, EventId, EventStore, LinkedEvent};
pub use weights::RosterWeights;
