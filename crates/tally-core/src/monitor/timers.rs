use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::BudgetThresholdMonitor;

/// The monitor's two periodic triggers, cancellable as a pair.
/// - tick: `periodic_check` every `tick` period
/// - refresh: `refresh` (full reconciliation) every `refresh` period
///
/// Neither fires immediately on start. Dropping the handle without calling
/// `shutdown_and_join` still stops both loops, since the shutdown sender goes away.
pub struct MonitorTimers {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl MonitorTimers {
    pub fn start(monitor: Arc<BudgetThresholdMonitor>, tick: Duration, refresh: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let joins = vec![
            tokio::spawn(tick_loop(Arc::clone(&monitor), tick, shutdown_rx.clone())),
            tokio::spawn(refresh_loop(monitor, refresh, shutdown_rx)),
        ];
        tracing::debug!(?tick, ?refresh, "monitor timers started");

        Self { shutdown_tx, joins }
    }

    /// Ask both loops to stop. An in-flight refresh is abandoned.
    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            let _ = join.await;
        }
        tracing::debug!("monitor timers stopped");
    }
}

fn interval_after(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

fn stopped(shutdown_rx: &watch::Receiver<bool>) -> bool {
    *shutdown_rx.borrow()
}

async fn tick_loop(
    monitor: Arc<BudgetThresholdMonitor>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut interval = interval_after(period);
    loop {
        if stopped(&shutdown_rx) {
            break;
        }
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = interval.tick() => {
                let published = monitor.periodic_check();
                tracing::trace!(published, "periodic budget check");
            }
        }
    }
}

async fn refresh_loop(
    monitor: Arc<BudgetThresholdMonitor>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut interval = interval_after(period);
    loop {
        if stopped(&shutdown_rx) {
            break;
        }
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = interval.tick() => {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    result = monitor.refresh() => {
                        if let Err(e) = result {
                            tracing::warn!(error = %e, "budget refresh failed; keeping current state");
                        }
                    }
                }
            }
        }
    }
}
