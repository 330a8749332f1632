//! Transport port: performs one network call.

use async_trait::async_trait;

use crate::domain::{Headers, Method, PendingAction, TransportError};

/// A fully resolved call.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub endpoint: String,
    pub method: Method,
    pub payload: Option<serde_json::Value>,
    pub headers: Headers,
}

impl From<&PendingAction> for TransportRequest {
    fn from(action: &PendingAction) -> Self {
        Self {
            endpoint: action.endpoint.clone(),
            method: action.method,
            payload: action.payload.clone(),
            headers: action.headers.clone(),
        }
    }
}

/// Resolves with the decoded JSON body on a 2xx response.
///
/// Non-2xx responses must be reported as `TransportError::Status`.
/// Implementations need not enforce a timeout; the gateway wraps calls in one.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &TransportRequest) -> Result<serde_json::Value, TransportError>;
}
