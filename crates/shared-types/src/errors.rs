//! # Error Types
//!
//! Errors raised while constructing shared records.

use thiserror::Error;

use crate::entities::NodeId;

/// Errors that can occur when building a roster or roster history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// A roster must list at least one member.
    #[error("Roster has no entries")]
    Empty,

    /// Supermajority arithmetic is undefined without weight.
    #[error("Roster total weight is zero")]
    ZeroTotalWeight,

    /// Each node may appear once.
    #[error("Duplicate node id {0} in roster")]
    DuplicateNodeId(NodeId),

    /// A history needs at least one roster to resolve any round.
    #[error("Roster history is empty")]
    EmptyHistory,

    /// Effective rounds must be strictly increasing.
    #[error("Effective round {round} does not follow previous round {previous}")]
    NonIncreasingRound { previous: u64, round: u64 },

    /// A round entry names a roster hash that has no roster.
    #[error("No roster for hash {0}")]
    UnknownRosterHash(String),
}
