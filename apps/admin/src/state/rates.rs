//! Exchange-rate state.

use std::sync::Arc;
use vitrina_sync::{RateAgentHandle, RateBoard};

/// Rate board plus an optional handle to the background agent.
#[derive(Clone)]
pub struct RatesState {
    board: Arc<RateBoard>,
    agent: Option<RateAgentHandle>,
}

impl RatesState {
    /// State with a running agent.
    pub fn new(board: Arc<RateBoard>, agent: RateAgentHandle) -> Self {
        RatesState {
            board,
            agent: Some(agent),
        }
    }

    /// State without a background agent; refreshes happen on demand only.
    pub fn manual(board: Arc<RateBoard>) -> Self {
        RatesState { board, agent: None }
    }

    pub fn board(&self) -> &Arc<RateBoard> {
        &self.board
    }

    pub fn agent(&self) -> Option<&RateAgentHandle> {
        self.agent.as_ref()
    }
}
