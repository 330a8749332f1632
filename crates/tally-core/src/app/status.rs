//! Offline status view.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::connectivity::ConnectionType;

/// What a status indicator needs to render the sync state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineStatus {
    pub is_online: bool,
    pub connection_type: ConnectionType,
    #[serde(rename = "pendingActionsCount")]
    pub pending_actions: usize,
    #[serde(rename = "cachedDataCount")]
    pub cached_entries: usize,
    /// Creation time of the newest pending action.
    pub last_queued_at: Option<DateTime<Utc>>,
}

impl OfflineStatus {
    pub fn has_pending(&self) -> bool {
        self.pending_actions > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_indicator_field_names() {
        let status = OfflineStatus {
            is_online: false,
            connection_type: ConnectionType::ThreeG,
            pending_actions: 2,
            cached_entries: 1,
            last_queued_at: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["isOnline"], false);
        assert_eq!(json["connectionType"], "3g");
        assert_eq!(json["pendingActionsCount"], 2);
        assert_eq!(json["cachedDataCount"], 1);
        assert!(status.has_pending());
    }
}
