//! Ports layer (Hexagonal Architecture)

pub mod inbound;
pub mod outbound;

pub use inbound::EventIntakeApi;
pub use outbound::{BytesSignatureVerifier, EventFieldValidator, VerifierFactory};
