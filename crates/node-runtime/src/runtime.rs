//! # Node Runtime
//!
//! Owns the pipeline task and its shutdown signal.

use hg_03_consensus::ConsensusError;
use shared_types::RosterHistory;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

use crate::config::{ConfigError, NodeConfig};
use crate::pipeline::EventPipeline;
use crate::wiring::{spawn_pipeline, PipelineHandle, RoundConsumer};

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("pipeline stopped: {0}")]
    Pipeline(#[from] ConsensusError),

    #[error("pipeline task failed: {0}")]
    Join(#[from] JoinError),
}

/// A running replica.
pub struct NodeRuntime {
    handle: PipelineHandle,
    task: JoinHandle<Result<(), ConsensusError>>,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    /// Validate `config` and start the pipeline task. Must be called inside
    /// a tokio runtime.
    pub fn start<C: RoundConsumer>(
        config: &NodeConfig,
        history: RosterHistory,
        consumer: C,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;
        let pipeline = EventPipeline::new(config, history);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, task) = spawn_pipeline(
            pipeline,
            consumer,
            config.pipeline.channel_capacity,
            shutdown_rx,
        );
        Ok(Self {
            handle,
            task,
            shutdown_tx,
        })
    }

    pub fn handle(&self) -> PipelineHandle {
        self.handle.clone()
    }

    /// Signal the task and wait for it to finish.
    ///
    /// Commands still queued are dropped.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        info!("Initiating pipeline shutdown");
        if self.shutdown_tx.send(true).is_err() {
            // Receiver gone: the task already returned.
            info!("Pipeline task already stopped");
        }
        match self.task.await {
            Ok(Ok(())) => {
                info!("Shutdown complete");
                Ok(())
            }
            Ok(Err(err)) => Err(err.into()),
            Err(err) => {
                error!(error = %err, "Pipeline task panicked or was cancelled");
                Err(err.into())
            }
        }
    }
}
