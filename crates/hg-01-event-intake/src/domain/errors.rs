//! Intake error types.

use shared_types::NodeId;
use thiserror::Error;

/// Why an event failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Event has no time created")]
    MissingTimeCreated,

    #[error("Event signature is empty")]
    EmptySignature,

    #[error("Parent list contains a null entry at position {index}")]
    NullParent { index: usize },

    #[error("Parent hash has length {actual}, expected {expected}")]
    InvalidParentHashLength { expected: usize, actual: usize },

    #[error("Transaction {index} has no payload")]
    EmptyTransaction { index: usize },

    #[error("Transactions total {total} bytes, limit is {limit}")]
    TooManyTransactionBytes { total: usize, limit: usize },

    #[error("Multiple parents created by {creator}")]
    DuplicateParentCreator { creator: NodeId },

    #[error("Identical self and other parent in a roster of {roster_size} members")]
    IdenticalParentsInMultiNodeNetwork { roster_size: usize },

    #[error("Birth round {birth_round} is below parent birth round {max_parent_birth_round}")]
    InvalidBirthRound {
        birth_round: u64,
        max_parent_birth_round: u64,
    },
}

impl ValidationError {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ValidationError::MissingTimeCreated => "missing_time_created",
            ValidationError::EmptySignature => "empty_signature",
            ValidationError::NullParent { .. } => "null_parent",
            ValidationError::InvalidParentHashLength { .. } => "invalid_parent_hash_length",
            ValidationError::EmptyTransaction { .. } => "empty_transaction",
            ValidationError::TooManyTransactionBytes { .. } => "too_many_transaction_bytes",
            ValidationError::DuplicateParentCreator { .. } => "duplicate_parent_creator",
            ValidationError::IdenticalParentsInMultiNodeNetwork { .. } => "identical_parents",
            ValidationError::InvalidBirthRound { .. } => "invalid_birth_round",
        }
    }
}

/// Why intake dropped an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// Birth round below the ancient threshold.
    Ancient,
    /// No roster covers the event's birth round.
    UnknownRoster,
    /// Creator is not in the resolved roster, or has unusable key material.
    NonMember,
    /// Failed structural validation.
    Malformed,
    /// Descriptor and signature already seen.
    Duplicate,
    /// Gossip event whose signature did not verify.
    SignatureFailure,
}

impl DiscardReason {
    pub const ALL: [DiscardReason; 6] = [
        DiscardReason::Ancient,
        DiscardReason::UnknownRoster,
        DiscardReason::NonMember,
        DiscardReason::Malformed,
        DiscardReason::Duplicate,
        DiscardReason::SignatureFailure,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DiscardReason::Ancient => "ancient",
            DiscardReason::UnknownRoster => "unknown_roster",
            DiscardReason::NonMember => "non_member",
            DiscardReason::Malformed => "malformed",
            DiscardReason::Duplicate => "duplicate",
            DiscardReason::SignatureFailure => "signature_failure",
        }
    }
}

/// Failure to build a signature verifier from roster key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifierError {
    #[error("Public key has length {0}, expected 32")]
    InvalidKeyLength(usize),

    #[error("Public key is not a valid curve point")]
    InvalidKey,
}
