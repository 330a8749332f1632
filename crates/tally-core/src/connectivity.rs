//! Connectivity monitor.
//!
//! Wraps the runtime's online/offline signal. The signal source (OS hook,
//! browser event bridge, a test) calls `set_online`; consumers read
//! `is_online` or watch transitions through `subscribe`.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Effective connection type as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionType {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "3g")]
    ThreeG,
    #[serde(rename = "4g")]
    FourG,
}

impl ConnectionType {
    pub fn is_slow(self) -> bool {
        matches!(self, ConnectionType::Slow2g | ConnectionType::TwoG)
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionType::Unknown => "unknown",
            ConnectionType::Slow2g => "slow-2g",
            ConnectionType::TwoG => "2g",
            ConnectionType::ThreeG => "3g",
            ConnectionType::FourG => "4g",
        };
        f.write_str(s)
    }
}

pub struct ConnectivityMonitor {
    online: watch::Sender<bool>,
    connection_type: Mutex<ConnectionType>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (online, _) = watch::channel(initially_online);
        Self {
            online,
            connection_type: Mutex::new(ConnectionType::Unknown),
        }
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    /// Feed a new signal value. Watchers are only woken on an actual
    /// transition; returns whether one happened.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.online.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            if online {
                tracing::info!("network connection restored");
            } else {
                tracing::warn!("network connection lost");
            }
        }
        changed
    }

    /// Receiver that observes every transition made after this call.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }

    pub fn connection_type(&self) -> ConnectionType {
        *self
            .connection_type
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn set_connection_type(&self, connection_type: ConnectionType) {
        *self
            .connection_type
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = connection_type;
    }

    pub fn is_slow_connection(&self) -> bool {
        self.connection_type().is_slow()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_online_reports_only_transitions() {
        let monitor = ConnectivityMonitor::new(true);
        assert!(!monitor.set_online(true));
        assert!(monitor.set_online(false));
        assert!(!monitor.is_online());
        assert!(!monitor.set_online(false));
        assert!(monitor.set_online(true));
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn watchers_see_transitions() {
        let monitor = ConnectivityMonitor::new(false);
        let mut rx = monitor.subscribe();

        monitor.set_online(false);
        assert!(!rx.has_changed().unwrap());

        monitor.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }

    #[test]
    fn slow_connection_types() {
        let monitor = ConnectivityMonitor::default();
        assert!(!monitor.is_slow_connection());

        monitor.set_connection_type(ConnectionType::TwoG);
        assert!(monitor.is_slow_connection());
        monitor.set_connection_type(ConnectionType::FourG);
        assert!(!monitor.is_slow_connection());
        assert_eq!(monitor.connection_type().to_string(), "4g");
    }
}
