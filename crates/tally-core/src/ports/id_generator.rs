//! IdGenerator port.
//!
//! `UlidGenerator` takes its timestamp from a `Clock`, so a `FixedClock` in
//! tests yields ids sharing one timestamp while the random part keeps them unique.

use std::sync::Arc;

use ulid::Ulid;

use crate::domain::ids::{ActionId, AlertId};
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_action_id(&self) -> ActionId;

    fn generate_alert_id(&self) -> AlertId;
}

pub struct UlidGenerator {
    clock: Arc<dyn Clock>,
}

impl UlidGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl IdGenerator for UlidGenerator {
    fn generate_action_id(&self) -> ActionId {
        ActionId::from(self.next_ulid())
    }

    fn generate_alert_id(&self) -> AlertId {
        AlertId::from(self.next_ulid())
    }
}
