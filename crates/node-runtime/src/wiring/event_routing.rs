//! # Event Routing
//!
//! Runs an [`EventPipeline`] on its own task and connects it to the
//! collaborators around it.
//!
//! ## Flow
//!
//! ```text
//! gossip / self events ──┐
//! roster updates ────────┼─► bounded mpsc ─► pipeline task ─► RoundConsumer
//! clear / queries ───────┘                        │
//!                                                 └─► watch<EventWindow> ─► gossip
//! ```
//!
//! A full command channel suspends the sender. A slow [`RoundConsumer`]
//! stalls the task and, through the channel, every producer.

use std::sync::Arc;

use async_trait::async_trait;
use hg_01_event_intake::IntakeEventCounter;
use hg_03_consensus::ConsensusError;
use shared_types::{ConsensusRound, ConsensusSnapshot, EventWindow, PlatformEvent, RosterHistory};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::pipeline::EventPipeline;

/// Commands accepted by the pipeline task.
#[derive(Debug)]
pub enum PipelineCommand {
    /// A hashed event from gossip or local creation.
    Event(PlatformEvent),
    /// Replacement roster history for intake and consensus.
    RosterHistory(RosterHistory),
    /// Reset every stage. Used on reconnect.
    Clear,
    /// Reset every stage and resume consensus after the snapshot's round.
    LoadSnapshot(ConsensusSnapshot),
    /// Linked events without consensus.
    PreConsensus(oneshot::Sender<Vec<Arc<PlatformEvent>>>),
}

/// The pipeline task is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pipeline task has stopped")]
pub struct PipelineClosed;

/// Receives every decided round, in order, exactly once.
#[async_trait]
pub trait RoundConsumer: Send + Sync + 'static {
    async fn on_round(&self, round: ConsensusRound);
}

/// Forwards rounds into a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelRoundConsumer {
    sender: mpsc::Sender<ConsensusRound>,
}

impl ChannelRoundConsumer {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ConsensusRound>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl RoundConsumer for ChannelRoundConsumer {
    async fn on_round(&self, round: ConsensusRound) {
        let number = round.round_number;
        if self.sender.send(round).await.is_err() {
            debug!(round = number, "Round receiver dropped, round not delivered");
        }
    }
}

/// Cloneable sender side of a running pipeline.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    commands: mpsc::Sender<PipelineCommand>,
    window: watch::Receiver<EventWindow>,
    counter: Arc<IntakeEventCounter>,
}

impl PipelineHandle {
    /// Enqueue an event, waiting while the channel is full.
    pub async fn submit(&self, event: PlatformEvent) -> Result<(), PipelineClosed> {
        self.send(PipelineCommand::Event(event)).await
    }

    pub async fn update_roster_history(&self, history: RosterHistory) -> Result<(), PipelineClosed> {
        self.send(PipelineCommand::RosterHistory(history)).await
    }

    pub async fn clear(&self) -> Result<(), PipelineClosed> {
        self.send(PipelineCommand::Clear).await
    }

    pub async fn load_snapshot(&self, snapshot: ConsensusSnapshot) -> Result<(), PipelineClosed> {
        self.send(PipelineCommand::LoadSnapshot(snapshot)).await
    }

    /// Answered after every command enqueued before it.
    pub async fn pre_consensus_events(&self) -> Result<Vec<Arc<PlatformEvent>>, PipelineClosed> {
        let (reply, response) = oneshot::channel();
        self.send(PipelineCommand::PreConsensus(reply)).await?;
        response.await.map_err(|_| PipelineClosed)
    }

    /// The latest published window.
    pub fn event_window(&self) -> EventWindow {
        *self.window.borrow()
    }

    /// Receiver notified whenever the window moves.
    pub fn subscribe_window(&self) -> watch::Receiver<EventWindow> {
        self.window.clone()
    }

    pub fn counter(&self) -> &Arc<IntakeEventCounter> {
        &self.counter
    }

    async fn send(&self, command: PipelineCommand) -> Result<(), PipelineClosed> {
        self.commands.send(command).await.map_err(|_| PipelineClosed)
    }
}

/// Spawn the pipeline task.
///
/// The task ends when every handle is dropped, when `shutdown` fires, or on
/// the first consensus invariant violation, which it returns.
pub fn spawn_pipeline<C: RoundConsumer>(
    pipeline: EventPipeline,
    consumer: C,
    capacity: usize,
    shutdown: watch::Receiver<bool>,
) -> (PipelineHandle, JoinHandle<Result<(), ConsensusError>>) {
    let (commands, receiver) = mpsc::channel(capacity);
    let (window_tx, window) = watch::channel(pipeline.event_window());
    let handle = PipelineHandle {
        commands,
        window,
        counter: Arc::clone(pipeline.counter()),
    };
    let task = tokio::spawn(run_pipeline(pipeline, consumer, receiver, window_tx, shutdown));
    (handle, task)
}

async fn run_pipeline<C: RoundConsumer>(
    mut pipeline: EventPipeline,
    consumer: C,
    mut commands: mpsc::Receiver<PipelineCommand>,
    window: watch::Sender<EventWindow>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ConsensusError> {
    info!("Pipeline task started");
    loop {
        let command = tokio::select! {
            biased;
            _ = shutdown.changed() => {
                info!("Shutdown signal received");
                break;
            }
            command = commands.recv() => match command {
                Some(command) => command,
                None => {
                    info!("All pipeline handles dropped");
                    break;
                }
            },
        };

        match command {
            PipelineCommand::Event(event) => {
                let rounds = pipeline.submit(event).map_err(|err| {
                    error!(error = %err, "Consensus invariant violated, stopping pipeline");
                    err
                })?;
                if let Some(last) = rounds.last() {
                    window.send_replace(last.event_window);
                }
                for round in rounds {
                    consumer.on_round(round).await;
                }
            }
            PipelineCommand::RosterHistory(history) => {
                pipeline.update_roster_history(history);
            }
            PipelineCommand::Clear => {
                pipeline.clear();
                window.send_replace(pipeline.event_window());
            }
            PipelineCommand::LoadSnapshot(snapshot) => {
                pipeline.load_snapshot(&snapshot);
                window.send_replace(pipeline.event_window());
            }
            PipelineCommand::PreConsensus(reply) => {
                // The caller may have given up waiting.
                let _ = reply.send(pipeline.pre_consensus_events());
            }
        }
    }
    Ok(())
}
