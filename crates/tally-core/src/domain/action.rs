//! Queued mutations and the request vocabulary shared with the gateway.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ActionId;

/// HTTP-style verb of a request.
///
/// `Get` is the only read method; everything else is a mutation and is
/// eligible for queueing while offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn is_read(self) -> bool {
        matches!(self, Method::Get)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header map. Ordered so persisted actions serialize deterministically.
pub type Headers = BTreeMap<String, String>;

/// Headers applied when a caller supplies none.
pub fn default_headers() -> Headers {
    let mut headers = Headers::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers
}

/// A mutation handed to the queue, before it gets an id and a timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAction {
    pub endpoint: String,
    pub method: Method,
    pub payload: Option<serde_json::Value>,
    pub headers: Headers,
    pub description: Option<String>,
}

impl NewAction {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            payload: None,
            headers: Headers::new(),
            description: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A mutation waiting for connectivity.
///
/// Owned by the action queue. `retries` counts failed sync attempts and is
/// bounded by the queue's retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    pub id: ActionId,
    pub endpoint: String,
    pub method: Method,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    #[serde(default)]
    pub headers: Headers,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub retries: u32,
}

impl PendingAction {
    /// Materialize a queued action. A missing description becomes
    /// `"<METHOD> <endpoint>"` and missing headers become the JSON defaults.
    pub fn from_new(id: ActionId, action: NewAction, created_at: DateTime<Utc>) -> Self {
        let description = action
            .description
            .unwrap_or_else(|| format!("{} {}", action.method, action.endpoint));
        let headers = if action.headers.is_empty() {
            default_headers()
        } else {
            action.headers
        };
        Self {
            id,
            endpoint: action.endpoint,
            method: action.method,
            payload: action.payload,
            headers,
            description,
            created_at,
            retries: 0,
        }
    }
}
