use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::{DrainReport, DroppedAction, RetryDecision, RetryPolicy};
use crate::domain::{ActionId, NewAction, PendingAction};
use crate::ports::{ActionExecutor, Clock, DurableStore, IdGenerator};

/// Durable FIFO of unsent mutations.
///
/// Design:
/// - The in-memory list is the source of truth; every change is mirrored to
///   one durable key, which is removed once the list is empty.
/// - `drain` snapshots the list at its start. Actions enqueued mid-drain stay
///   queued for the next pass.
/// - Only one drain runs at a time; a concurrent call returns a skipped report.
/// - The lock is never held across the executor's `.await`.
pub struct ActionQueue {
    actions: Mutex<VecDeque<PendingAction>>,
    draining: AtomicBool,
    policy: RetryPolicy,
    store: Arc<dyn DurableStore>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    durable_key: String,
}

/// Clears the draining flag however the drain future ends.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ActionQueue {
    /// Create a queue, restoring whatever the durable store holds.
    pub fn new(
        policy: RetryPolicy,
        store: Arc<dyn DurableStore>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        durable_key: impl Into<String>,
    ) -> Self {
        let durable_key = durable_key.into();
        let restored = restore(store.as_ref(), &durable_key);
        if !restored.is_empty() {
            tracing::info!(count = restored.len(), "restored pending actions");
        }
        Self {
            actions: Mutex::new(restored),
            draining: AtomicBool::new(false),
            policy,
            store,
            ids,
            clock,
            durable_key,
        }
    }

    fn actions(&self) -> MutexGuard<'_, VecDeque<PendingAction>> {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a mutation with `retries = 0` and persist it immediately.
    pub fn enqueue(&self, action: NewAction) -> ActionId {
        let id = self.ids.generate_action_id();
        let pending = PendingAction::from_new(id, action, self.clock.now());
        tracing::debug!(action_id = %id, description = %pending.description, "action queued");

        let mut actions = self.actions();
        actions.push_back(pending);
        self.persist(&actions);
        id
    }

    pub fn size(&self) -> usize {
        self.actions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn snapshot(&self) -> Vec<PendingAction> {
        self.actions().iter().cloned().collect()
    }

    pub fn last_queued_at(&self) -> Option<DateTime<Utc>> {
        self.actions().iter().map(|a| a.created_at).max()
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// Attempt every currently queued action once, in FIFO order.
    ///
    /// Never fails as a whole: each action's outcome lands in the report.
    pub async fn drain(&self, executor: &dyn ActionExecutor) -> DrainReport {
        if self.draining.swap(true, Ordering::SeqCst) {
            tracing::debug!("drain already in progress");
            return DrainReport::skipped();
        }
        let _guard = DrainGuard(&self.draining);

        let batch = self.snapshot();
        let mut report = DrainReport::default();
        if batch.is_empty() {
            return report;
        }
        tracing::info!(count = batch.len(), "draining pending actions");

        for action in batch {
            let result = executor.execute(&action).await;
            let mut actions = self.actions();
            let Some(pos) = actions.iter().position(|a| a.id == action.id) else {
                continue;
            };

            match result {
                Ok(()) => {
                    actions.remove(pos);
                    tracing::debug!(action_id = %action.id, "action synced");
                    report.succeeded.push(action.id);
                }
                Err(error) => match self.policy.decide(action.retries) {
                    RetryDecision::Requeue { retries } => {
                        actions[pos].retries = retries;
                        tracing::debug!(action_id = %action.id, retries, error = %error, "sync attempt failed");
                        report.requeued.push(action.id);
                    }
                    RetryDecision::Drop { reason } => {
                        let dropped = actions.remove(pos).unwrap_or(action);
                        tracing::warn!(
                            action_id = %dropped.id,
                            description = %dropped.description,
                            error = %error,
                            "dropping action: {reason}"
                        );
                        report.dropped.push(DroppedAction {
                            action: dropped,
                            error,
                        });
                    }
                },
            }
            self.persist(&actions);
        }

        report
    }

    fn persist(&self, actions: &VecDeque<PendingAction>) {
        let result = if actions.is_empty() {
            self.store.remove(&self.durable_key)
        } else {
            match serde_json::to_string(actions) {
                Ok(json) => self.store.set(&self.durable_key, &json),
                Err(e) => Err(e.into()),
            }
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist pending actions");
        }
    }
}

fn restore(store: &dyn DurableStore, key: &str) -> VecDeque<PendingAction> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return VecDeque::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load pending actions");
            return VecDeque::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "discarding corrupt pending action list");
        VecDeque::new()
    })
}
