//! Implementations of the ports.
//!
//! - **MemoryStore** / **FileStore**: durable key/value stores
//! - **HttpTransport**: reqwest-backed network calls
//! - **TransportExecutor**: replays queued actions through a transport
//! - **TransportBudgetSource**: reads the family snapshot through a transport
//! - **TracingNotifier** / **MemoryNotifier**: notice sinks

pub mod budget_source;
pub mod executor;
pub mod file_store;
pub mod http;
pub mod memory_store;
pub mod notifier;

pub use self::budget_source::{FINANCIAL_SUMMARY_ENDPOINT, TransportBudgetSource};
pub use self::executor::TransportExecutor;
pub use self::file_store::FileStore;
pub use self::http::HttpTransport;
pub use self::memory_store::MemoryStore;
pub use self::notifier::{MemoryNotifier, TracingNotifier};
