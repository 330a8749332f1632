//! Engine: owns every component and the background tasks that drive them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::reconnect::ReconnectWatcher;
use super::status::OfflineStatus;
use crate::bus::EventBus;
use crate::cache::OfflineCache;
use crate::config::EngineConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::gateway::RequestGateway;
use crate::monitor::{BudgetThresholdMonitor, MonitorTimers};
use crate::queue::ActionQueue;

pub(super) struct Background {
    timers: MonitorTimers,
    reconnect: ReconnectWatcher,
}

/// Explicitly constructed, explicitly torn down. Build one with
/// [`EngineBuilder`](super::EngineBuilder), await [`start`](Engine::start),
/// and [`dispose`](Engine::dispose) before dropping it.
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) bus: Arc<EventBus>,
    pub(super) connectivity: Arc<ConnectivityMonitor>,
    pub(super) cache: Arc<OfflineCache>,
    pub(super) queue: Arc<ActionQueue>,
    pub(super) gateway: Arc<RequestGateway>,
    pub(super) monitor: Arc<BudgetThresholdMonitor>,
    pub(super) background: Mutex<Option<Background>>,
}

impl Engine {
    fn background(&self) -> MutexGuard<'_, Option<Background>> {
        self.background.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the budget snapshot, then spawn the monitor timers and the
    /// reconnect watcher. Returns false when already running.
    ///
    /// A failed initial load is logged; the refresh timer retries it.
    pub async fn start(&self) -> bool {
        if self.is_running() {
            return false;
        }
        if let Err(e) = self.monitor.refresh().await {
            tracing::warn!(error = %e, "initial budget load failed");
        }

        let mut background = self.background();
        if background.is_some() {
            return false;
        }

        let timers = MonitorTimers::start(
            Arc::clone(&self.monitor),
            self.config.tick_interval(),
            self.config.refresh_interval(),
        );
        let reconnect = ReconnectWatcher::spawn(
            Arc::clone(&self.gateway),
            self.connectivity.subscribe(),
            self.config.sync_on_reconnect,
        );
        *background = Some(Background { timers, reconnect });
        tracing::info!("engine started");
        true
    }

    pub fn is_running(&self) -> bool {
        self.background().is_some()
    }

    /// Stop every background task and drop every bus subscription.
    /// Nothing fires after this returns. The engine may be started again.
    pub async fn dispose(&self) {
        let background = self.background().take();
        if let Some(Background { timers, reconnect }) = background {
            timers.shutdown_and_join().await;
            reconnect.shutdown_and_join().await;
        }
        self.bus.clear();
        tracing::info!("engine disposed");
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn cache(&self) -> &Arc<OfflineCache> {
        &self.cache
    }

    pub fn queue(&self) -> &Arc<ActionQueue> {
        &self.queue
    }

    pub fn gateway(&self) -> &Arc<RequestGateway> {
        &self.gateway
    }

    pub fn monitor(&self) -> &Arc<BudgetThresholdMonitor> {
        &self.monitor
    }

    pub fn offline_status(&self) -> OfflineStatus {
        self.gateway.offline_status()
    }
}
