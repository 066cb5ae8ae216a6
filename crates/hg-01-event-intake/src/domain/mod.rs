//! Domain layer for event intake.

pub mod counter;
pub mod dedup;
pub mod errors;
pub mod validator;

pub use counter::IntakeEventCounter;
pub use dedup::{DedupOutcome, EventDeduplicator};
pub use errors::{DiscardReason, ValidationError, VerifierError};
pub use validator::InternalEventValidator;
