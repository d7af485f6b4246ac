//! Channel that logs commands instead of moving the rover

use crate::channel::CommandChannel;
use crate::error::DeliveryError;
use async_trait::async_trait;
use chaser_core::Command;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::info;

const MAX_HISTORY: usize = 10_000;

/// Records every command it is given; never fails
#[derive(Clone, Default)]
pub struct DryRunChannel {
    history: Arc<RwLock<VecDeque<Command>>>,
}

impl DryRunChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands sent so far, oldest first
    pub fn history(&self) -> Vec<Command> {
        self.history.read().iter().copied().collect()
    }

    pub fn clear(&self) {
        self.history.write().clear();
    }
}

#[async_trait]
impl CommandChannel for DryRunChannel {
    async fn send(&self, command: Command) -> Result<(), DeliveryError> {
        info!("[dry-run] {}", command);
        let mut history = self.history.write();
        if history.len() >= MAX_HISTORY {
            history.pop_front();
        }
        history.push_back(command);
        Ok(())
    }
}
