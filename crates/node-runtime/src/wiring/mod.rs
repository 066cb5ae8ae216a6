//! Async wiring around the sequential pipeline.

pub mod event_routing;

pub use event_routing::{
    spawn_pipeline, ChannelRoundConsumer, PipelineClosed, PipelineCommand, PipelineHandle,
    RoundConsumer,
};
