//! Budget threshold monitoring.
//!
//! - **transition**: pure tier evaluation shared by both triggers
//! - **threshold**: `BudgetThresholdMonitor`, owner of per-member state
//! - **timers**: the periodic check and reconciliation loops

mod threshold;
mod timers;
pub mod transition;

pub use self::threshold::BudgetThresholdMonitor;
pub use self::timers::MonitorTimers;
pub use self::transition::{Transition, Trigger, evaluate};
