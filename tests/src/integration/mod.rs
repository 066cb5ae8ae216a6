//! # Integration Tests
//!
//! Properties of intake, orphan buffer and consensus running together:
//!
//! - **determinism**: replicas fed differently ordered copies agree
//! - **finality**: emitted rounds are never revised or repeated
//! - **ancient**: thresholds only advance and bound every stage's state
//! - **roster**: a member leaves mid-run and rounds keep being decided

pub mod ancient;
pub mod determinism;
pub mod finality;
pub mod roster;
