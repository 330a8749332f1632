//! ActionExecutor port: performs the side effect of one queued action.

use async_trait::async_trait;

use crate::domain::{ExecutionError, PendingAction};

/// The queue treats every `Err` the same way for retry accounting;
/// the error value is only kept for the terminal failure report.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: &PendingAction) -> Result<(), ExecutionError>;
}
