//! Events published on the bus.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::alert::{AlertType, BudgetAlert};
use super::budget::{FamilySummary, MemberRecord};

/// Bus topics exposed to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    BudgetStatusUpdate,
    BudgetAlert,
    FamilyExpenseUpdate,
    BudgetDataLoaded,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::BudgetStatusUpdate,
        Topic::BudgetAlert,
        Topic::FamilyExpenseUpdate,
        Topic::BudgetDataLoaded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::BudgetStatusUpdate => "budget-status-update",
            Topic::BudgetAlert => "budget-alert",
            Topic::FamilyExpenseUpdate => "family-expense-update",
            Topic::BudgetDataLoaded => "budget-data-loaded",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-member usage snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub user_id: String,
    pub member_name: String,
    pub role: String,
    pub usage_percentage: f64,
    pub current_spent: f64,
    pub budget_limit: f64,
    /// Alert type matching the current tier, if any. Informational only.
    pub alert_type: Option<AlertType>,
    pub is_over_budget: bool,
}

/// Echo of a raw spend event, for activity feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseUpdate {
    pub user_id: String,
    pub amount: f64,
    pub category: String,
    pub member_name: String,
    pub new_total: f64,
    pub budget_limit: f64,
}

/// Full reconciliation snapshot plus aggregate summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLoaded {
    pub members: Vec<MemberRecord>,
    pub summary: FamilySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload")]
pub enum BusEvent {
    #[serde(rename = "budget-status-update")]
    StatusUpdate(BudgetStatus),
    #[serde(rename = "budget-alert")]
    Alert(BudgetAlert),
    #[serde(rename = "family-expense-update")]
    ExpenseUpdate(ExpenseUpdate),
    #[serde(rename = "budget-data-loaded")]
    DataLoaded(DataLoaded),
}

impl BusEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::StatusUpdate(_) => Topic::BudgetStatusUpdate,
            BusEvent::Alert(_) => Topic::BudgetAlert,
            BusEvent::ExpenseUpdate(_) => Topic::FamilyExpenseUpdate,
            BusEvent::DataLoaded(_) => Topic::BudgetDataLoaded,
        }
    }
}
