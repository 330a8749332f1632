//! Budget threshold monitor.
//!
//! Owns per-member budget state. Spend events are applied optimistically and
//! may raise one alert each; ticks only republish status; a full load
//! replaces everything (last refresh wins, never merged).
//!
//! Every mutation happens under one short lock. Events are collected while
//! the lock is held and published after it is released, so subscribers may
//! call back into the monitor.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::transition::{Trigger, evaluate};
use crate::bus::EventBus;
use crate::domain::{
    BudgetAlert, BudgetStatus, BusEvent, DataLoaded, ExpenseUpdate, FamilySnapshot, FamilySummary,
    MemberBudgetState, MemberStatus, SourceError, SpendEvent,
};
use crate::ports::{BudgetSource, Clock, IdGenerator};

pub struct BudgetThresholdMonitor {
    members: Mutex<Vec<MemberBudgetState>>,
    alerts: Mutex<VecDeque<BudgetAlert>>,
    history_limit: usize,
    bus: Arc<EventBus>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    source: Option<Arc<dyn BudgetSource>>,
}

impl BudgetThresholdMonitor {
    pub fn new(bus: Arc<EventBus>, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            members: Mutex::new(Vec::new()),
            alerts: Mutex::new(VecDeque::new()),
            history_limit: 50,
            bus,
            ids,
            clock,
            source: None,
        }
    }

    /// Remote snapshot used by `refresh`.
    pub fn with_source(mut self, source: Arc<dyn BudgetSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    fn members(&self) -> MutexGuard<'_, Vec<MemberBudgetState>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn alerts(&self) -> MutexGuard<'_, VecDeque<BudgetAlert>> {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace all member state with `snapshot` and publish `budget-data-loaded`.
    ///
    /// Members without a positive budget are skipped. The summary is taken
    /// from the snapshot when present, otherwise summed from its members.
    pub fn load_full_state(&self, snapshot: FamilySnapshot) {
        let mut loaded = Vec::with_capacity(snapshot.members.len());
        for record in &snapshot.members {
            match MemberBudgetState::from_record(record) {
                Some(state) => loaded.push(state),
                None => tracing::debug!(
                    user_id = %record.user_id,
                    monthly_budget = record.monthly_budget,
                    "skipping member without a usable budget"
                ),
            }
        }
        tracing::info!(members = loaded.len(), "budget state reloaded");
        *self.members() = loaded;

        let summary = snapshot
            .summary
            .unwrap_or_else(|| FamilySummary::from_members(&snapshot.members));
        self.bus.publish(&BusEvent::DataLoaded(DataLoaded {
            members: snapshot.members,
            summary,
        }));
    }

    /// Apply one local expense.
    ///
    /// Publishes, in order: the alert (only when the member moved into a
    /// higher tier), the member's status, and the expense echo. Malformed
    /// events and unknown members are ignored. Returns the alert, if any.
    pub fn record_spend_event(&self, event: SpendEvent) -> Option<BudgetAlert> {
        if !event.is_well_formed() {
            tracing::debug!(user_id = %event.user_id, amount = event.amount, "ignoring malformed spend event");
            return None;
        }

        let (alert, status, echo) = {
            let mut members = self.members();
            let Some(state) = members.iter_mut().find(|m| m.user_id == event.user_id) else {
                tracing::debug!(user_id = %event.user_id, "ignoring spend event for unknown member");
                return None;
            };

            let transition = evaluate(
                state,
                Trigger::Spend {
                    amount: event.amount,
                },
            );
            *state = transition.next;
            tracing::debug!(
                user_id = %state.user_id,
                current_spent = state.current_spent,
                from = ?transition.previous_tier,
                to = ?transition.tier,
                "spend applied"
            );

            let member_name = event
                .member_name
                .clone()
                .unwrap_or_else(|| state.name.clone());

            let alert = transition
                .alert
                .and_then(|tier| tier.alert_type())
                .map(|alert_type| BudgetAlert {
                    id: self.ids.generate_alert_id(),
                    alert_type,
                    user_id: state.user_id.clone(),
                    member_name: member_name.clone(),
                    category: event.category.clone(),
                    amount: event.amount,
                    usage_percentage: state.usage_percentage(),
                    current_spent: state.current_spent,
                    budget_limit: state.monthly_budget,
                    timestamp: self.clock.now(),
                });
            let echo = ExpenseUpdate {
                user_id: state.user_id.clone(),
                amount: event.amount,
                category: event.category,
                member_name: member_name.clone(),
                new_total: state.current_spent,
                budget_limit: state.monthly_budget,
            };
            (alert, status_of(state, &member_name), echo)
        };

        if let Some(alert) = &alert {
            tracing::info!(user_id = %alert.user_id, alert_type = %alert.alert_type, "budget alert");
            self.remember(alert.clone());
            self.bus.publish(&BusEvent::Alert(alert.clone()));
        }
        self.bus.publish(&BusEvent::StatusUpdate(status));
        self.bus.publish(&BusEvent::ExpenseUpdate(echo));
        alert
    }

    /// Republish every member's status. Never raises an alert.
    /// Returns the number of status events published.
    pub fn periodic_check(&self) -> usize {
        let statuses: Vec<BudgetStatus> = self
            .members()
            .iter()
            .map(|state| status_of(&evaluate(state, Trigger::Tick).next, &state.name))
            .collect();

        for status in &statuses {
            self.bus.publish(&BusEvent::StatusUpdate(status.clone()));
        }
        statuses.len()
    }

    /// Reconcile from the remote source. A monitor without a source keeps
    /// its current state.
    pub async fn refresh(&self) -> Result<(), SourceError> {
        let Some(source) = &self.source else {
            tracing::debug!("no budget source configured; skipping refresh");
            return Ok(());
        };
        let snapshot = source.fetch_snapshot().await?;
        self.load_full_state(snapshot);
        Ok(())
    }

    /// A transaction was recorded elsewhere: reload, then republish status.
    pub async fn on_transaction_added(&self) -> Result<(), SourceError> {
        self.refresh().await?;
        self.periodic_check();
        Ok(())
    }

    pub fn family_status(&self) -> Vec<MemberStatus> {
        self.members().iter().map(MemberStatus::from).collect()
    }

    pub fn member(&self, user_id: &str) -> Option<MemberBudgetState> {
        self.members().iter().find(|m| m.user_id == user_id).cloned()
    }

    /// Newest first.
    pub fn recent_alerts(&self, limit: usize) -> Vec<BudgetAlert> {
        self.alerts().iter().rev().take(limit).cloned().collect()
    }

    pub fn clear_alerts(&self) {
        self.alerts().clear();
    }

    fn remember(&self, alert: BudgetAlert) {
        let mut alerts = self.alerts();
        alerts.push_back(alert);
        while alerts.len() > self.history_limit {
            alerts.pop_front();
        }
    }
}

fn status_of(state: &MemberBudgetState, member_name: &str) -> BudgetStatus {
    let usage = state.usage_percentage();
    BudgetStatus {
        user_id: state.user_id.clone(),
        member_name: member_name.to_string(),
        role: state.role.clone(),
        usage_percentage: usage,
        current_spent: state.current_spent,
        budget_limit: state.monthly_budget,
        alert_type: state.tier().alert_type(),
        is_over_budget: usage >= 100.0,
    }
}
