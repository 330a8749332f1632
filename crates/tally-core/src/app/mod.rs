//! Composition root.
//!
//! - **EngineBuilder**: wires the components and validates configuration
//! - **Engine**: owns the components and their background tasks
//! - **OfflineStatus**: sync state summary for status indicators

pub mod builder;
pub mod engine;
mod reconnect;
pub mod status;

pub use self::builder::{BuildError, EngineBuilder};
pub use self::engine::Engine;
pub use self::status::OfflineStatus;
