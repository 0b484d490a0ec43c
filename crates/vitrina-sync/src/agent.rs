//! # Rate Agent
//!
//! Background task keeping the rate board fresh.
//!
//! ## Agent Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          RateAgent::run                                 │
//! │                                                                         │
//! │   loop {                                                               │
//! │     select! {                                                          │
//! │       interval.tick()        ──► board.refresh_all()                   │
//! │       RefreshNow             ──► board.refresh_all()                   │
//! │       Shutdown / handle gone ──► break                                 │
//! │     }                                                                  │
//! │   }                                                                    │
//! │                                                                         │
//! │   First tick fires immediately, so rates load at startup.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::rate_board::RateBoard;

/// Commands accepted by a running agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentCommand {
    RefreshNow,
    Shutdown,
}

// =============================================================================
// Rate Agent
// =============================================================================

/// Refreshes both rates on a fixed interval and on demand.
pub struct RateAgent {
    board: Arc<RateBoard>,
    interval: Duration,
    command_rx: mpsc::Receiver<AgentCommand>,
}

/// Handle for controlling the rate agent.
#[derive(Clone)]
pub struct RateAgentHandle {
    command_tx: mpsc::Sender<AgentCommand>,
}

impl RateAgentHandle {
    /// Asks for an immediate refresh of both rates.
    pub async fn refresh_now(&self) -> SyncResult<()> {
        self.send(AgentCommand::RefreshNow).await
    }

    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.send(AgentCommand::Shutdown).await
    }

    async fn send(&self, command: AgentCommand) -> SyncResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SyncError::ChannelError("Rate agent channel closed".into()))
    }
}

impl RateAgent {
    /// Creates a new agent and returns a handle.
    pub fn new(board: Arc<RateBoard>, interval: Duration) -> (Self, RateAgentHandle) {
        let (command_tx, command_rx) = mpsc::channel(8);

        let agent = RateAgent {
            board,
            interval,
            command_rx,
        };

        (agent, RateAgentHandle { command_tx })
    }

    /// Creates the agent and spawns it on the current runtime.
    pub fn spawn(board: Arc<RateBoard>, interval: Duration) -> (JoinHandle<()>, RateAgentHandle) {
        let (agent, handle) = Self::new(board, interval);
        (tokio::spawn(agent.run()), handle)
    }

    /// Runs the refresh loop until shutdown.
    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "Rate agent starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    debug!("Scheduled rate refresh");
                    self.board.refresh_all().await;
                }

                command = self.command_rx.recv() => match command {
                    Some(AgentCommand::RefreshNow) => {
                        debug!("Manual rate refresh");
                        self.board.refresh_all().await;
                        interval.reset();
                    }
                    Some(AgentCommand::Shutdown) | None => {
                        info!("Rate agent shutting down");
                        break;
                    }
                },
            }
        }

        info!("Rate agent stopped");
    }
}
