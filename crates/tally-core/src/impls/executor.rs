//! `ActionExecutor` that replays a queued action through a `Transport`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ExecutionError, PendingAction, TransportError};
use crate::ports::{ActionExecutor, Transport, TransportRequest};

pub struct TransportExecutor {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl TransportExecutor {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }
}

#[async_trait]
impl ActionExecutor for TransportExecutor {
    async fn execute(&self, action: &PendingAction) -> Result<(), ExecutionError> {
        // Only mutations are queued; a read found in storage is stale data.
        if action.method.is_read() {
            return Err(ExecutionError::Rejected(format!(
                "{} is a read and is never replayed",
                action.description
            )));
        }
        let request = TransportRequest::from(action);
        match tokio::time::timeout(self.timeout, self.transport.send(&request)).await {
            Ok(result) => result.map(|_| ()).map_err(ExecutionError::from),
            Err(_) => Err(TransportError::Timeout(self.timeout).into()),
        }
    }
}
