//! tally-core
//!
//! Offline-resilient sync engine for a family budget client.
//!
//! # Modules
//! - **domain**: plain data (ids, pending actions, cache entries, budget state, alerts, bus events, errors)
//! - **ports**: seams to the outside world (Clock, IdGenerator, DurableStore, Transport, ActionExecutor, BudgetSource, Notifier)
//! - **impls**: adapters for the ports (memory/file stores, HTTP transport, notifiers)
//! - **bus**: synchronous publish/subscribe
//! - **connectivity**: online/offline signal
//! - **cache**: last successful read per cache key
//! - **queue**: durable queue of unsent mutations with bounded retries
//! - **gateway**: one request contract regardless of connectivity
//! - **monitor**: per-member budget tiers, alerts and timers
//! - **app**: `EngineBuilder` / `Engine`
//! - **config**: `EngineConfig`

pub mod app;
pub mod bus;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod domain;
pub mod gateway;
pub mod impls;
pub mod monitor;
pub mod ports;
pub mod queue;

pub use app::{BuildError, Engine, EngineBuilder, OfflineStatus};
pub use config::EngineConfig;
pub use gateway::{GatewayResponse, Request, RequestGateway};
