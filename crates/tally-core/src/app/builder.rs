//! EngineBuilder: wiring and start-up validation.

use std::sync::{Arc, Mutex};

use super::engine::Engine;
use crate::bus::EventBus;
use crate::cache::OfflineCache;
use crate::config::{ConfigError, EngineConfig};
use crate::connectivity::ConnectivityMonitor;
use crate::gateway::RequestGateway;
use crate::impls::{MemoryStore, TracingNotifier, TransportBudgetSource};
use crate::monitor::BudgetThresholdMonitor;
use crate::ports::{
    BudgetSource, Clock, DurableStore, IdGenerator, Notifier, SystemClock, Transport, UlidGenerator,
};
use crate::queue::{ActionQueue, RetryPolicy};

/// Builds an [`Engine`].
///
/// Only the transport is mandatory. Defaults:
/// - store: in-memory (nothing survives the process)
/// - budget source: the financial-summary endpoint over the same transport
/// - notifier: `tracing`
/// - clock: system time
///
/// ```ignore
/// let engine = EngineBuilder::new()
///     .with_config(EngineConfig::load("tally.toml")?)
///     .with_store(Arc::new(FileStore::open("./state")?))
///     .with_transport(Arc::new(HttpTransport::new("https://api.example.com")))
///     .build()?;
/// engine.start().await;
/// ```
pub struct EngineBuilder {
    config: EngineConfig,
    store: Option<Arc<dyn DurableStore>>,
    transport: Option<Arc<dyn Transport>>,
    source: Option<Arc<dyn BudgetSource>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    initially_online: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no transport configured; call `with_transport` before `build`")]
    MissingTransport,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            store: None,
            transport: None,
            source: None,
            notifier: None,
            clock: None,
            initially_online: true,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_budget_source(mut self, source: Arc<dyn BudgetSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Connectivity state before the first signal arrives.
    pub fn initially_online(mut self, online: bool) -> Self {
        self.initially_online = online;
        self
    }

    pub fn build(self) -> Result<Engine, BuildError> {
        self.config.validate()?;
        let transport = self.transport.ok_or(BuildError::MissingTransport)?;
        let config = self.config;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(TransportBudgetSource::new(Arc::clone(&transport))));
        let ids: Arc<dyn IdGenerator> = Arc::new(UlidGenerator::new(Arc::clone(&clock)));

        let bus = Arc::new(EventBus::new());
        let connectivity = Arc::new(ConnectivityMonitor::new(self.initially_online));
        let cache = Arc::new(OfflineCache::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.cache_key.clone(),
        ));
        let queue = Arc::new(ActionQueue::new(
            RetryPolicy::new(config.max_retries),
            store,
            Arc::clone(&ids),
            Arc::clone(&clock),
            config.actions_key.clone(),
        ));
        let gateway = Arc::new(
            RequestGateway::new(
                Arc::clone(&connectivity),
                Arc::clone(&cache),
                Arc::clone(&queue),
                transport,
                notifier,
                config.request_timeout(),
            )
            .with_notices(config.notices_enabled),
        );
        let monitor = Arc::new(
            BudgetThresholdMonitor::new(Arc::clone(&bus), ids, clock)
                .with_source(source)
                .with_history_limit(config.alert_history_limit),
        );

        Ok(Engine {
            config,
            bus,
            connectivity,
            cache,
            queue,
            gateway,
            monitor,
            background: Mutex::new(None),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
