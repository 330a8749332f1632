//! `BudgetSource` reading the financial-summary endpoint through a `Transport`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{FamilySnapshot, Method, SourceError, default_headers};
use crate::ports::{BudgetSource, Transport, TransportRequest};

pub const FINANCIAL_SUMMARY_ENDPOINT: &str = "/api/family/financial-summary";

pub struct TransportBudgetSource {
    transport: Arc<dyn Transport>,
    endpoint: String,
}

impl TransportBudgetSource {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_endpoint(transport, FINANCIAL_SUMMARY_ENDPOINT)
    }

    pub fn with_endpoint(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl BudgetSource for TransportBudgetSource {
    async fn fetch_snapshot(&self) -> Result<FamilySnapshot, SourceError> {
        let request = TransportRequest {
            endpoint: self.endpoint.clone(),
            method: Method::Get,
            payload: None,
            headers: default_headers(),
        };
        let body = self.transport.send(&request).await?;
        Ok(serde_json::from_value(body)?)
    }
}
