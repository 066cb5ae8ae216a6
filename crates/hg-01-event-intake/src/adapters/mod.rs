//! Adapters for the outbound ports.

pub mod ed25519;

pub use ed25519::{Ed25519Verifier, Ed25519VerifierFactory};
