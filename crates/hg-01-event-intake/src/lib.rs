//! # Event Intake Subsystem (HG-01)
//!
//! First stateful stage of the hashgraph pipeline. Every event, whether
//! gossiped by a peer or created locally, passes through here before it can
//! reach the orphan buffer.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): field validation, deduplication, counters
//! - **Ports Layer** (`ports/`): the intake API and the injected capabilities
//!   (`EventFieldValidator`, `BytesSignatureVerifier`, `VerifierFactory`)
//! - **Adapters** (`adapters/`): Ed25519 verification of event hashes
//! - **Service Layer** (`service/`): `EventIntakeProcessor`, wiring it together
//!
//! ## Discards
//!
//! Intake never returns an error. Rejected events are dropped and counted on
//! the shared [`IntakeEventCounter`], one counter per [`DiscardReason`] plus a
//! running total.
//!
//! ## Security Notes
//!
//! - **Ancient First**: the ancient check runs before any other work.
//! - **Local Trust**: only `EventOrigin::Runtime` events skip signature checks.
//! - **No Poisoning**: a forged copy of an event cannot block the genuine one,
//!   because deduplication keys on descriptor and signature together.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::{Ed25519Verifier, Ed25519VerifierFactory};
pub use config::IntakeConfig;
pub use domain::{
    DedupOutcome, DiscardReason, EventDeduplicator, IntakeEventCounter, InternalEventValidator,
    ValidationError, VerifierError,
};
pub use ports::{BytesSignatureVerifier, EventFieldValidator, EventIntakeApi, VerifierFactory};
pub use service::{EventIntakeProcessor, IntakeDependencies};

/// Intake processor with the default validator and Ed25519 signatures.
pub type DefaultEventIntakeProcessor =
    EventIntakeProcessor<InternalEventValidator, Ed25519VerifierFactory>;
