//! # Shared Types Crate
//!
//! Domain entities shared by every stage of the hashgraph event pipeline.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: events, descriptors, rosters, the event window
//!   and consensus output are defined once here and consumed by all subsystems.
//! - **Immutable Core**: an event's hash is computed once at construction over
//!   its canonical encoding. Only the generation number is attached later.
//! - **Snapshot Rosters**: a `RosterHistory` is never edited in place. Updates
//!   publish a new `Arc<RosterHistory>` and readers compare identities.
//!
//! ## Pipeline
//!
//! ```text
//! RosterHistory ──┐
//!                 ▼
//! GossipEvent ─► PlatformEvent ─► Intake ─► OrphanBuffer ─► Linker ─► Consensus
//!                                   ▲            ▲                        │
//!                                   └────────────┴──── EventWindow ◄──────┘
//! ```

pub mod consensus;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod hashing;
pub mod roster;
pub mod threshold;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use consensus::*;
pub use constants::*;
pub use entities::*;
pub use errors::*;
pub use roster::*;
pub use threshold::Threshold;
