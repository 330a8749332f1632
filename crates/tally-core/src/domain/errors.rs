//! Error types, one enum per concern.
//!
//! Classification:
//! - transient network failure and non-2xx responses are both `TransportError`
//!   and count identically as a failed attempt for retry accounting
//! - `GatewayError::NoCachedData` is raised when an offline read has no fallback
//! - `StorageError` is logged and swallowed by the cache and queue

use std::time::Duration;

use thiserror::Error;

/// Failure of a durable key/value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a single network call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("response decode: {0}")]
    Decode(String),
}

/// Failure of one queued action during a drain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("executor rejected action: {0}")]
    Rejected(String),
}

/// What the request gateway surfaces to callers.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no internet connection and no cached data available for {cache_key:?}")]
    NoCachedData { cache_key: Option<String> },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("cannot sync while offline")]
    Offline,
}

/// Failure to read the remote family snapshot.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}
