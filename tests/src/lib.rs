//! # Hashgraph-Node Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── support.rs        # Reference runs and replicas shared by tests and benches
//! │   └── integration/      # Cross-crate properties of the full pipeline
//! │       ├── determinism.rs
//! │       ├── finality.rs
//! │       ├── ancient.rs
//! │       └── roster.rs
//! └── benches/
//!     └── pipeline_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p hg-tests
//! cargo test -p hg-tests integration::determinism
//! cargo bench -p hg-tests
//! ```

pub mod integration;
pub mod support;
