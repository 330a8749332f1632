use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time::{Duration, sleep};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::domain::{BusEvent, Method, SpendEvent, Topic, TransportError};
use tally_core::impls::FINANCIAL_SUMMARY_ENDPOINT;
use tally_core::ports::{Transport, TransportRequest};
use tally_core::{EngineBuilder, EngineConfig, Request};

/// In-process stand-in for the backend. The first `remaining_failures`
/// mutations fail, everything after succeeds.
struct DemoBackend {
    remaining_failures: AtomicU32,
}

impl DemoBackend {
    fn new(n: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(n),
        }
    }
}

#[async_trait]
impl Transport for DemoBackend {
    async fn send(&self, request: &TransportRequest) -> Result<Value, TransportError> {
        if request.method == Method::Get && request.endpoint == FINANCIAL_SUMMARY_ENDPOINT {
            return Ok(json!({
                "members": [
                    {"userId": "p1", "username": "Mina", "role": "parent",
                     "monthlyBudget": 2000, "monthlyExpenses": 600, "monthlyIncome": 5200},
                    {"userId": "c1", "username": "Leo", "role": "child",
                     "monthlyBudget": 1000, "monthlyExpenses": 0}
                ]
            }));
        }
        if request.method.is_read() {
            return Ok(json!({ "endpoint": request.endpoint, "items": [] }));
        }

        let left = self.remaining_failures.load(Ordering::Relaxed);
        if left > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(TransportError::Status {
                status: 503,
                reason: format!("intentional failure (left={left})"),
            });
        }
        Ok(json!({ "ok": true }))
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tally_core=debug")),
        )
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

/// First CLI argument, then `TALLY_CONFIG`, then defaults.
fn load_config() -> Result<EngineConfig, Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TALLY_CONFIG").ok());
    match path {
        Some(path) => {
            tracing::info!(%path, "loading config");
            Ok(EngineConfig::load(path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    // (A) build and start the engine; start loads the family budgets
    let engine = EngineBuilder::new()
        .with_config(load_config()?)
        .with_transport(Arc::new(DemoBackend::new(1)))
        .build()?;
    engine.start().await;

    engine.bus().subscribe(Topic::BudgetAlert, |event| {
        if let BusEvent::Alert(alert) = event {
            println!("ALERT [{}] {}", alert.alert_type, alert.message());
        }
    });

    // (B) go offline and issue writes; they are queued, not sent
    engine.connectivity().set_online(false);
    for (amount, category) in [(120.0, "groceries"), (45.5, "transport")] {
        let response = engine
            .gateway()
            .request(
                Request::post("/api/expenses", json!({ "amount": amount, "category": category }))
                    .with_description(format!("Add {category} expense")),
            )
            .await?;
        println!("queued: {response:?}");
    }
    println!("status: {:?}", engine.offline_status());

    // (C) come back online; the first replay fails once and is retried
    engine.connectivity().set_online(true);
    while engine.queue().size() > 0 {
        sleep(Duration::from_millis(50)).await;
        if engine.queue().snapshot().iter().any(|a| a.retries > 0) {
            let report = engine.gateway().trigger_sync().await?;
            println!("manual sync: {} synced", report.succeeded.len());
        }
    }
    println!("status: {:?}", engine.offline_status());

    // (D) walk one member up the alert ladder
    let monitor = engine.monitor();
    for amount in [750.0, 200.0, 100.0] {
        monitor.record_spend_event(SpendEvent::new("c1", amount, "games"));
    }
    for member in monitor.family_status() {
        println!(
            "{:<6} spent {:>8.2} of {:>8.2} ({:.1}%)",
            member.member_name, member.current_spent, member.monthly_budget, member.usage_percentage
        );
    }

    // (E) tear down
    engine.dispose().await;
    Ok(())
}
