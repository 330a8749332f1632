//! Action queue: durable, ordered list of mutations waiting for connectivity.

mod action_queue;
mod retry;

pub use action_queue::ActionQueue;
pub use retry::{RetryDecision, RetryPolicy};

use crate::domain::{ActionId, ExecutionError, PendingAction};

/// An action removed after exhausting its retries.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedAction {
    pub action: PendingAction,
    pub error: ExecutionError,
}

/// What one drain pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainReport {
    /// Another drain was already running; nothing was attempted.
    pub skipped: bool,
    pub succeeded: Vec<ActionId>,
    pub requeued: Vec<ActionId>,
    pub dropped: Vec<DroppedAction>,
}

impl DrainReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.requeued.len() + self.dropped.len()
    }

    /// True when the pass attempted nothing.
    pub fn is_noop(&self) -> bool {
        self.attempted() == 0
    }
}
