//! # Hashgraph Node Runtime
//!
//! Assembles the event pipeline of one replica and runs it on a task.
//!
//! ## Modular Structure
//!
//! - `config` - `NodeConfig` with `HG_*` environment overrides
//! - `logging` - tracing subscriber setup
//! - `pipeline` - intake, orphan buffer and consensus as one sequential unit
//! - `wiring` - bounded channels, window feedback and the round consumer port
//! - `runtime` - task ownership and shutdown
//!
//! ## Replica Flow
//!
//! ```text
//! PipelineHandle::submit ─► [mpsc] ─► EventPipeline ─► RoundConsumer::on_round
//!                                          │
//!         PipelineHandle::event_window ◄── watch<EventWindow>
//! ```
//!
//! Two replicas fed the same events in different orders emit identical
//! rounds.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod runtime;
pub mod wiring;

pub use config::{override_from_env, ConfigError, LoggingConfig, NodeConfig, PipelineConfig};
pub use logging::{init_logging, LoggingError};
pub use pipeline::EventPipeline;
pub use runtime::{NodeRuntime, RuntimeError};
pub use wiring::{ChannelRoundConsumer, PipelineClosed, PipelineHandle, RoundConsumer};
