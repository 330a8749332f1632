//! Reacts to connectivity transitions: notices both ways, and a sync pass
//! when the connection comes back.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::gateway::RequestGateway;
use crate::ports::NoticeLevel;

pub struct ReconnectWatcher {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ReconnectWatcher {
    pub fn spawn(
        gateway: Arc<RequestGateway>,
        online_rx: watch::Receiver<bool>,
        sync_on_reconnect: bool,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(watch_loop(gateway, online_rx, shutdown_rx, sync_on_reconnect));
        Self { shutdown_tx, join }
    }

    /// Stops watching. A sync pass already running is allowed to finish.
    pub async fn shutdown_and_join(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.join.await;
    }
}

async fn watch_loop(
    gateway: Arc<RequestGateway>,
    mut online_rx: watch::Receiver<bool>,
    mut shutdown_rx: watch::Receiver<bool>,
    sync_on_reconnect: bool,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = online_rx.changed() => {
                if changed.is_err() {
                    // monitor dropped
                    break;
                }
                let online = *online_rx.borrow_and_update();
                if online {
                    if sync_on_reconnect {
                        gateway.notify(NoticeLevel::Success, "Connection restored! Syncing data...");
                        gateway.sync().await;
                    } else {
                        gateway.notify(NoticeLevel::Success, "Connection restored!");
                    }
                } else {
                    gateway.notify(
                        NoticeLevel::Warning,
                        "You are now offline. Changes will be synced when connection is restored.",
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::OfflineCache;
    use crate::connectivity::ConnectivityMonitor;
    use crate::domain::TransportError;
    use crate::gateway::Request;
    use crate::impls::{MemoryNotifier, MemoryStore};
    use crate::ports::{Clock, SystemClock, Transport, TransportRequest, UlidGenerator};
    use crate::queue::{ActionQueue, RetryPolicy};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio::time::{Duration, sleep};

    const OFFLINE: &str = "You are now offline. Changes will be synced when connection is restored.";

    struct AcceptAll;

    #[async_trait]
    impl Transport for AcceptAll {
        async fn send(&self, _request: &TransportRequest) -> Result<Value, TransportError> {
            Ok(json!({ "ok": true }))
        }
    }

    struct Fixture {
        gateway: Arc<RequestGateway>,
        connectivity: Arc<ConnectivityMonitor>,
        queue: Arc<ActionQueue>,
        notices: MemoryNotifier,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let connectivity = Arc::new(ConnectivityMonitor::new(true));
        let cache = Arc::new(OfflineCache::new(store.clone(), Arc::clone(&clock), "data"));
        let queue = Arc::new(ActionQueue::new(
            RetryPolicy::default(),
            store,
            Arc::new(UlidGenerator::new(Arc::clone(&clock))),
            clock,
            "actions",
        ));
        let notices = MemoryNotifier::new();
        let gateway = Arc::new(RequestGateway::new(
            Arc::clone(&connectivity),
            cache,
            Arc::clone(&queue),
            Arc::new(AcceptAll),
            Arc::new(notices.clone()),
            Duration::from_secs(30),
        ));
        Fixture {
            gateway,
            connectivity,
            queue,
            notices,
        }
    }

    /// Go offline, queue one write, come back online.
    async fn bounce(f: &Fixture) {
        f.connectivity.set_online(false);
        sleep(Duration::from_millis(10)).await;
        let response = f
            .gateway
            .request(Request::post("/api/expenses", json!({ "amount": 5 })))
            .await
            .unwrap();
        assert!(response.is_queued());

        f.connectivity.set_online(true);
        sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_without_sync_only_announces() {
        let f = fixture();
        let watcher = ReconnectWatcher::spawn(Arc::clone(&f.gateway), f.connectivity.subscribe(), false);

        bounce(&f).await;

        let messages = f.notices.messages();
        assert!(messages.contains(&OFFLINE.to_string()));
        assert!(messages.contains(&"Connection restored!".to_string()));
        assert!(!messages.iter().any(|m| m.contains("Syncing")));
        assert_eq!(f.queue.size(), 1);

        watcher.shutdown_and_join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_with_sync_drains_the_queue() {
        let f = fixture();
        let watcher = ReconnectWatcher::spawn(Arc::clone(&f.gateway), f.connectivity.subscribe(), true);

        bounce(&f).await;

        let messages = f.notices.messages();
        assert!(messages.contains(&OFFLINE.to_string()));
        assert!(messages.contains(&"Connection restored! Syncing data...".to_string()));
        assert!(messages.contains(&"Successfully synced 1 actions".to_string()));
        assert_eq!(f.queue.size(), 0);

        watcher.shutdown_and_join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_announced_after_shutdown() {
        let f = fixture();
        let watcher = ReconnectWatcher::spawn(Arc::clone(&f.gateway), f.connectivity.subscribe(), true);
        watcher.shutdown_and_join().await;

        f.connectivity.set_online(false);
        sleep(Duration::from_millis(10)).await;
        assert!(f.notices.messages().is_empty());
    }
}
