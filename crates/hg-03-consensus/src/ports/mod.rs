//! Ports layer (Hexagonal Architecture)

pub mod inbound;

pub use inbound::ConsensusApi;
