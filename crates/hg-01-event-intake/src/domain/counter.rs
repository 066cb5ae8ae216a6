//! Monotonic discard counters shared with observers.

use std::sync::atomic::{AtomicU64, Ordering};

use super::errors::DiscardReason;
use crate::metrics;

/// Counts events that exited the intake pipeline early.
///
/// Every discard bumps its reason counter and the total. Counters never
/// decrease.
#[derive(Debug, Default)]
pub struct IntakeEventCounter {
    ancient: AtomicU64,
    unknown_roster: AtomicU64,
    non_member: AtomicU64,
    malformed: AtomicU64,
    duplicate: AtomicU64,
    signature_failure: AtomicU64,
    disparate_signature: AtomicU64,
    exited: AtomicU64,
}

impl IntakeEventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_discard(&self, reason: DiscardReason) {
        self.slot(reason).fetch_add(1, Ordering::Relaxed);
        self.exited.fetch_add(1, Ordering::Relaxed);
        metrics::record_discard(reason);
    }

    /// Same descriptor seen with a new signature. Not a discard.
    pub fn record_disparate_signature(&self) {
        self.disparate_signature.fetch_add(1, Ordering::Relaxed);
        metrics::record_disparate_signature();
    }

    pub fn discarded(&self, reason: DiscardReason) -> u64 {
        self.slot(reason).load(Ordering::Relaxed)
    }

    /// Total events that exited the intake pipeline.
    pub fn exited(&self) -> u64 {
        self.exited.load(Ordering::Relaxed)
    }

    pub fn disparate_signatures(&self) -> u64 {
        self.disparate_signature.load(Ordering::Relaxed)
    }

    fn slot(&self, reason: DiscardReason) -> &AtomicU64 {
        match reason {
            DiscardReason::Ancient => &self.ancient,
            DiscardReason::UnknownRoster => &self.unknown_roster,
            DiscardReason::NonMember => &self.non_member,
            DiscardReason::Malformed => &self.malformed,
            DiscardReason::Duplicate => &self.duplicate,
            DiscardReason::SignatureFailure => &self.signature_failure,
        }
    }
}
