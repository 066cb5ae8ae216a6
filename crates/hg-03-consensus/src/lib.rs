//! # Consensus Subsystem (HG-03)
//!
//! Links released events into a DAG and runs hashgraph virtual voting over
//! it, emitting finalized rounds of totally ordered events.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): the event arena, the linker, round and
//!   election bookkeeping, the voting algorithm and consensus ordering
//! - **Ports Layer** (`ports/`): the `ConsensusApi` driven by the pipeline
//! - **Service Layer** (`service/`): `ConsensusEngine`, linker plus voting
//!
//! ## Guarantees
//!
//! - Rounds are emitted once, gapless, in increasing order.
//! - `consensus_order` and `consensus_timestamp` strictly increase across
//!   every event ever emitted.
//! - Output depends only on the DAG, never on delivery order.
//! - The ancient threshold only moves forward.
//!
//! ## Round decision
//!
//! ```text
//!  round r+2  ●───●───●───●   witnesses count votes: supermajority decides fame
//!             │ ╲ │ ╱ │ ╲ │
//!  round r+1  ●───●───●───●   witnesses vote: "do I see the candidate?"
//!             │ ╱ │ ╲ │ ╱ │
//!  round r    ◉───◉───◉───◉   candidates; the famous ones become judges
//! ```
//!
//! Once every candidate of round `r` is decided, the common ancestors of the
//! judges reach consensus with round received `r`.

pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export public API
pub use config::ConsensusConfig;
pub use domain::{Consensus, ConsensusError, ConsensusLinker, ConsensusResult, EventId, LinkerError};
pub use ports::ConsensusApi;
pub use service::ConsensusEngine;
