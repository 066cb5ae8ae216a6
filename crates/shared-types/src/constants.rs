//! Protocol constants shared across subsystems.

/// The first round of consensus.
pub const ROUND_FIRST: u64 = 1;

/// Sentinel round for events that are no longer relevant to consensus
/// (already reached consensus, or ancient).
pub const ROUND_NEGATIVE_INFINITY: u64 = 0;

/// The generation number of an event with no non-ancient parents.
pub const FIRST_GENERATION: u64 = 1;

/// The consensus number assigned to the very first consensus event.
pub const FIRST_CONSENSUS_NUMBER: u64 = 0;

/// Length in bytes of an event hash (SHA-384).
pub const DIGEST_LENGTH: usize = 48;

/// Minimum gap between consecutive consensus timestamps, per transaction.
pub const MIN_TRANS_TIMESTAMP_INCR_NANOS: u64 = 1_000;
