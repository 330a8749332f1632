//! BudgetSource port: the remote financial-summary read used for reconciliation.

use async_trait::async_trait;

use crate::domain::{FamilySnapshot, SourceError};

#[async_trait]
pub trait BudgetSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<FamilySnapshot, SourceError>;
}
