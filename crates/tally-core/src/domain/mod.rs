//! Domain model: ids, queued actions, cache entries, budget state, alerts,
//! bus events and errors. Plain data, no I/O.

pub mod action;
pub mod alert;
pub mod budget;
pub mod cache;
pub mod errors;
pub mod events;
pub mod ids;

pub use action::{Headers, Method, NewAction, PendingAction, default_headers};
pub use alert::{AlertType, BudgetAlert};
pub use budget::{
    FamilySnapshot, FamilySummary, MemberBudgetState, MemberRecord, MemberStatus, SpendEvent, Tier,
};
pub use cache::CacheEntry;
pub use errors::{ExecutionError, GatewayError, SourceError, StorageError, TransportError};
pub use events::{BudgetStatus, BusEvent, DataLoaded, ExpenseUpdate, Topic};
pub use ids::{ActionId, AlertId};
