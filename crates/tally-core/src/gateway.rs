//! Request gateway: the one call shape for reads and writes, online or not.
//!
//! | connectivity | method   | outcome                                               |
//! |--------------|----------|-------------------------------------------------------|
//! | online       | read     | network; cache on success; cache fallback on failure  |
//! | online       | mutation | network; error propagates                             |
//! | offline      | read     | cached entry, or `NoCachedData`                       |
//! | offline      | mutation | queued; returns immediately with the fallback data   |

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::app::OfflineStatus;
use crate::cache::OfflineCache;
use crate::connectivity::ConnectivityMonitor;
use crate::domain::{ActionId, GatewayError, Headers, Method, NewAction, TransportError};
use crate::impls::TransportExecutor;
use crate::ports::{Notice, NoticeLevel, Notifier, Transport, TransportRequest};
use crate::queue::{ActionQueue, DrainReport};

/// One call through the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub endpoint: String,
    pub method: Method,
    pub payload: Option<Value>,
    pub headers: Headers,
    pub cache_key: Option<String>,
    pub description: Option<String>,
    /// Returned alongside a queued outcome.
    pub fallback: Option<Value>,
}

impl Request {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            payload: None,
            headers: Headers::new(),
            cache_key: None,
            description: None,
            fallback: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::Post, endpoint).with_payload(payload)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_fallback(mut self, fallback: Value) -> Self {
        self.fallback = Some(fallback);
        self
    }

    fn to_transport(&self) -> TransportRequest {
        TransportRequest {
            endpoint: self.endpoint.clone(),
            method: self.method,
            payload: self.payload.clone(),
            headers: if self.headers.is_empty() {
                crate::domain::default_headers()
            } else {
                self.headers.clone()
            },
        }
    }

    fn into_action(self) -> NewAction {
        NewAction {
            endpoint: self.endpoint,
            method: self.method,
            payload: self.payload,
            headers: self.headers,
            description: self.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResponse {
    Fresh { data: Value },
    Cached { data: Value },
    Queued { action_id: ActionId, data: Option<Value> },
}

impl GatewayResponse {
    pub fn data(&self) -> Option<&Value> {
        match self {
            GatewayResponse::Fresh { data } | GatewayResponse::Cached { data } => Some(data),
            GatewayResponse::Queued { data, .. } => data.as_ref(),
        }
    }

    pub fn from_cache(&self) -> bool {
        matches!(self, GatewayResponse::Cached { .. })
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, GatewayResponse::Queued { .. })
    }
}

pub struct RequestGateway {
    connectivity: Arc<ConnectivityMonitor>,
    cache: Arc<OfflineCache>,
    queue: Arc<ActionQueue>,
    transport: Arc<dyn Transport>,
    executor: TransportExecutor,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
    notices_enabled: bool,
}

impl RequestGateway {
    pub fn new(
        connectivity: Arc<ConnectivityMonitor>,
        cache: Arc<OfflineCache>,
        queue: Arc<ActionQueue>,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        timeout: Duration,
    ) -> Self {
        let executor = TransportExecutor::new(Arc::clone(&transport), timeout);
        Self {
            connectivity,
            cache,
            queue,
            transport,
            executor,
            notifier,
            timeout,
            notices_enabled: true,
        }
    }

    pub fn with_notices(mut self, enabled: bool) -> Self {
        self.notices_enabled = enabled;
        self
    }

    pub(crate) fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        if self.notices_enabled {
            self.notifier.notify(Notice::new(level, message));
        }
    }

    pub async fn request(&self, request: Request) -> Result<GatewayResponse, GatewayError> {
        if self.connectivity.is_online() {
            self.request_online(request).await
        } else {
            self.request_offline(request)
        }
    }

    async fn request_online(&self, request: Request) -> Result<GatewayResponse, GatewayError> {
        let call = request.to_transport();
        let result = match tokio::time::timeout(self.timeout, self.transport.send(&call)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        };

        match result {
            Ok(data) => {
                if request.method.is_read()
                    && let Some(key) = &request.cache_key
                {
                    self.cache.store(key, data.clone());
                }
                Ok(GatewayResponse::Fresh { data })
            }
            Err(error) => {
                if request.method.is_read()
                    && let Some(key) = &request.cache_key
                    && let Some(data) = self.cache.get(key)
                {
                    tracing::warn!(endpoint = %request.endpoint, cache_key = %key, error = %error, "serving cached data");
                    self.notify(NoticeLevel::Warning, "Using cached data due to network error");
                    return Ok(GatewayResponse::Cached { data });
                }
                tracing::debug!(endpoint = %request.endpoint, error = %error, "request failed");
                Err(error.into())
            }
        }
    }

    fn request_offline(&self, request: Request) -> Result<GatewayResponse, GatewayError> {
        if request.method.is_read() {
            let data = request
                .cache_key
                .as_deref()
                .and_then(|key| self.cache.get(key));
            return match data {
                Some(data) => Ok(GatewayResponse::Cached { data }),
                None => Err(GatewayError::NoCachedData {
                    cache_key: request.cache_key,
                }),
            };
        }

        let fallback = request.fallback.clone();
        let action_id = self.queue.enqueue(request.into_action());
        self.notify(
            NoticeLevel::Info,
            "Action queued for when connection is restored",
        );
        Ok(GatewayResponse::Queued {
            action_id,
            data: fallback,
        })
    }

    /// Drain the queue through the transport and report the outcome as notices.
    pub async fn sync(&self) -> DrainReport {
        let report = self.queue.drain(&self.executor).await;
        if report.skipped {
            return report;
        }

        if !report.succeeded.is_empty() {
            tracing::info!(
                synced = report.succeeded.len(),
                requeued = report.requeued.len(),
                dropped = report.dropped.len(),
                "sync finished"
            );
            self.notify(
                NoticeLevel::Success,
                format!("Successfully synced {} actions", report.succeeded.len()),
            );
        }
        for dropped in &report.dropped {
            self.notify(
                NoticeLevel::Error,
                format!("Failed to sync: {}", dropped.action.description),
            );
        }
        report
    }

    /// User-initiated sync. Refused while offline.
    pub async fn trigger_sync(&self) -> Result<DrainReport, GatewayError> {
        if !self.connectivity.is_online() {
            self.notify(NoticeLevel::Warning, "Cannot sync while offline");
            return Err(GatewayError::Offline);
        }
        Ok(self.sync().await)
    }

    pub fn offline_status(&self) -> OfflineStatus {
        OfflineStatus {
            is_online: self.connectivity.is_online(),
            connection_type: self.connectivity.connection_type(),
            pending_actions: self.queue.size(),
            cached_entries: self.cache.len(),
            last_queued_at: self.queue.last_queued_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{MemoryNotifier, MemoryStore};
    use crate::ports::{Clock, SystemClock, UlidGenerator};
    use crate::queue::RetryPolicy;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers with a fixed body, or fails every call while `down` is set.
    #[derive(Default)]
    struct StubTransport {
        down: Mutex<bool>,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl StubTransport {
        fn set_down(&self, down: bool) {
            *self.down.lock().unwrap() = down;
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: &TransportRequest) -> Result<Value, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            if *self.down.lock().unwrap() {
                Err(TransportError::Network("connection refused".into()))
            } else {
                Ok(json!({ "ok": true, "endpoint": request.endpoint }))
            }
        }
    }

    struct Fixture {
        gateway: RequestGateway,
        connectivity: Arc<ConnectivityMonitor>,
        cache: Arc<OfflineCache>,
        queue: Arc<ActionQueue>,
        transport: Arc<StubTransport>,
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
        let transport = Arc::new(StubTransport::default());
        let notices = MemoryNotifier::new();
        let gateway = RequestGateway::new(
            Arc::clone(&connectivity),
            Arc::clone(&cache),
            Arc::clone(&queue),
            transport.clone(),
            Arc::new(notices.clone()),
            Duration::from_secs(30),
        );
        Fixture {
            gateway,
            connectivity,
            cache,
            queue,
            transport,
            notices,
        }
    }

    #[tokio::test]
    async fn online_read_populates_cache() {
        let f = fixture();
        let response = f
            .gateway
            .request(Request::get("/api/budgets").with_cache_key("budgets"))
            .await
            .unwrap();

        assert!(!response.from_cache());
        assert_eq!(f.cache.get("budgets"), response.data().cloned());
        let entry = f.cache.entry("budgets").unwrap();
        assert!(entry.synced);
    }

    #[tokio::test]
    async fn failed_read_falls_back_to_cache() {
        let f = fixture();
        f.cache.store("k", json!({"a": 1}));
        f.transport.set_down(true);

        let response = f
            .gateway
            .request(Request::get("/api/anything").with_cache_key("k"))
            .await
            .unwrap();

        assert_eq!(response, GatewayResponse::Cached { data: json!({"a": 1}) });
        assert_eq!(
            f.notices.messages(),
            vec!["Using cached data due to network error"]
        );
    }

    #[tokio::test]
    async fn failed_read_without_cache_propagates() {
        let f = fixture();
        f.transport.set_down(true);

        let err = f
            .gateway
            .request(Request::get("/api/anything").with_cache_key("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(TransportError::Network(_))));
    }

    #[tokio::test]
    async fn failed_mutation_is_not_queued_while_online() {
        let f = fixture();
        f.transport.set_down(true);

        let err = f
            .gateway
            .request(Request::post("/api/expenses", json!({"amount": 5})))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
        assert_eq!(f.queue.size(), 0);
    }

    #[tokio::test]
    async fn offline_read_serves_cache_or_fails() {
        let f = fixture();
        f.connectivity.set_online(false);
        f.cache.store("k", json!([1, 2]));

        let hit = f
            .gateway
            .request(Request::get("/api/list").with_cache_key("k"))
            .await
            .unwrap();
        assert_eq!(hit, GatewayResponse::Cached { data: json!([1, 2]) });

        let miss = f
            .gateway
            .request(Request::get("/api/list").with_cache_key("other"))
            .await
            .unwrap_err();
        assert!(matches!(
            miss,
            GatewayError::NoCachedData { cache_key: Some(ref k) } if k == "other"
        ));
        assert!(f.transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_post_queues_then_drains_on_reconnect() {
        let f = fixture();
        f.connectivity.set_online(false);

        let response = f
            .gateway
            .request(
                Request::post("/api/expenses", json!({"amount": 12.5}))
                    .with_fallback(json!({"id": "temp"})),
            )
            .await
            .unwrap();

        assert!(response.is_queued());
        assert_eq!(response.data(), Some(&json!({"id": "temp"})));
        assert_eq!(f.queue.size(), 1);
        assert_eq!(f.queue.snapshot()[0].description, "POST /api/expenses");

        f.connectivity.set_online(true);
        let report = f.gateway.sync().await;
        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(f.queue.size(), 0);

        let sent = f.transport.seen.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(
            f.notices.messages(),
            vec![
                "Action queued for when connection is restored",
                "Successfully synced 1 actions",
            ]
        );
    }

    #[tokio::test]
    async fn sync_reports_dropped_actions() {
        let f = fixture();
        f.connectivity.set_online(false);
        f.gateway
            .request(Request::new(Method::Delete, "/api/goals/9").with_description("Delete goal"))
            .await
            .unwrap();
        f.connectivity.set_online(true);
        f.transport.set_down(true);

        for _ in 0..3 {
            assert_eq!(f.gateway.sync().await.requeued.len(), 1);
        }
        let report = f.gateway.sync().await;
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(f.notices.messages().last().unwrap(), "Failed to sync: Delete goal");
    }

    #[tokio::test]
    async fn empty_sync_emits_nothing() {
        let f = fixture();
        let report = f.gateway.sync().await;
        assert!(report.is_noop());
        assert!(f.notices.notices().is_empty());
    }

    #[tokio::test]
    async fn trigger_sync_refuses_while_offline() {
        let f = fixture();
        f.connectivity.set_online(false);

        let err = f.gateway.trigger_sync().await.unwrap_err();
        assert!(matches!(err, GatewayError::Offline));
        assert_eq!(f.notices.messages(), vec!["Cannot sync while offline"]);
    }

    #[tokio::test]
    async fn offline_status_reflects_components() {
        let f = fixture().gateway_without_notices();
        f.connectivity.set_online(false);
        f.cache.store("k", json!(1));
        f.gateway
            .request(Request::post("/api/expenses", json!({})))
            .await
            .unwrap();

        let status = f.gateway.offline_status();
        assert!(!status.is_online);
        assert_eq!(status.pending_actions, 1);
        assert_eq!(status.cached_entries, 1);
        assert!(status.last_queued_at.is_some());
        assert!(f.notices.notices().is_empty());
    }

    impl Fixture {
        fn gateway_without_notices(mut self) -> Self {
            self.gateway = self.gateway.with_notices(false);
            self
        }
    }

    /// Never answers.
    struct HangingTransport;

    #[async_trait]
    impl Transport for HangingTransport {
        async fn send(&self, _request: &TransportRequest) -> Result<Value, TransportError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_requests_time_out() {
        let f = fixture();
        let gateway = RequestGateway::new(
            f.connectivity,
            f.cache,
            f.queue,
            Arc::new(HangingTransport),
            Arc::new(f.notices),
            Duration::from_secs(30),
        );

        let err = gateway.request(Request::get("/slow")).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Transport(TransportError::Timeout(d)) if d == Duration::from_secs(30)
        ));
    }
}
