//! Cached read results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last known result of a read, keyed by an application-chosen cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    /// True once the data was confirmed fresh from the network.
    pub synced: bool,
}
