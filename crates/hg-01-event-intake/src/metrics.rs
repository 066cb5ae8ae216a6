//! # Intake Metrics
//!
//! Prometheus mirrors of the intake discard counters.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! hg-01-event-intake = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `intake_events_discarded_total` - Counter of discarded events (by reason)
//! - `intake_disparate_signatures_total` - Known descriptors seen with a new signature

use crate::domain::DiscardReason;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Events that exited intake, labeled by reason
    pub static ref EVENTS_DISCARDED: IntCounterVec = register_int_counter_vec!(
        "intake_events_discarded_total",
        "Total number of events discarded by intake",
        &["reason"]
    )
    .expect("Failed to create EVENTS_DISCARDED metric");

    /// Known descriptors seen with a new signature
    pub static ref DISPARATE_SIGNATURES: IntCounter = register_int_counter!(
        "intake_disparate_signatures_total",
        "Total number of events whose descriptor was seen with another signature"
    )
    .expect("Failed to create DISPARATE_SIGNATURES metric");
}

/// Record a discarded event with reason
#[cfg(feature = "metrics")]
pub fn record_discard(reason: DiscardReason) {
    EVENTS_DISCARDED.with_label_values(&[reason.label()]).inc();
}

/// Record a disparate signature
#[cfg(feature = "metrics")]
pub fn record_disparate_signature() {
    DISPARATE_SIGNATURES.inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_discard(_reason: DiscardReason) {}

#[cfg(not(feature = "metrics"))]
pub fn record_disparate_signature() {}
