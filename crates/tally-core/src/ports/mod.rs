//! Ports: traits at the edges of the engine.
//!
//! The engine never touches the network, the disk or the wall clock
//! directly; it goes through these seams so each piece can be swapped in tests.

pub mod budget_source;
pub mod clock;
pub mod executor;
pub mod id_generator;
pub mod notifier;
pub mod storage;
pub mod transport;

pub use self::budget_source::BudgetSource;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::executor::ActionExecutor;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notifier::{Notice, NoticeLevel, Notifier};
pub use self::storage::DurableStore;
pub use self::transport::{Transport, TransportRequest};
