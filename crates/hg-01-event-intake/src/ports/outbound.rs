//! Driven ports (Outbound dependencies)
//!
//! Capabilities injected into the intake processor. Each has a single method
//! so implementations are plain strategy objects.

use std::sync::Arc;

use shared_types::{PlatformEvent, Roster};

use crate::domain::{ValidationError, VerifierError};

/// Structural validation of a single event.
pub trait EventFieldValidator: Send + Sync {
    /// `roster` is the roster applicable to the event's birth round.
    fn validate(&self, event: &PlatformEvent, roster: &Roster) -> Result<(), ValidationError>;
}

/// Signature check bound to one public key.
pub trait BytesSignatureVerifier: Send + Sync {
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool;
}

/// Builds a verifier from roster key material.
pub trait VerifierFactory: Send + Sync {
    fn create(&self, public_key: &[u8]) -> Result<Arc<dyn BytesSignatureVerifier>, VerifierError>;
}
