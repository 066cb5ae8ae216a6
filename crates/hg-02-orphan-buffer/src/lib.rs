//! # Orphan Buffer Subsystem (HG-02)
//!
//! Holds events whose parents have not been seen yet and releases them, with a
//! generation number (nGen) attached, once every non-ancient parent has been
//! released.
//!
//! ## Release Order
//!
//! ```text
//!   handle_event(C)  C waits for B        -> []
//!   handle_event(B)  B waits for A        -> []
//!   handle_event(A)  A ready, cascades    -> [A, B, C]
//! ```
//!
//! Within one call's output no event precedes any of its parents.
//!
//! ## Ancient Parents
//!
//! A parent below the ancient threshold will never be delivered. It is treated
//! as satisfied and does not contribute to the child's generation.

pub mod buffer;
pub mod orphan;

pub use buffer::OrphanBuffer;
