//! Budget alerts emitted on tier crossings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::AlertId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    #[serde(rename = "budget-warning-75")]
    BudgetWarning75,
    #[serde(rename = "budget-warning-90")]
    BudgetWarning90,
    #[serde(rename = "budget-exceeded")]
    BudgetExceeded,
}

impl AlertType {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::BudgetWarning75 => "budget-warning-75",
            AlertType::BudgetWarning90 => "budget-warning-90",
            AlertType::BudgetExceeded => "budget-exceeded",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-only notification of a tier crossing. Rendering is up to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlert {
    pub id: AlertId,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub user_id: String,
    pub member_name: String,
    pub category: String,
    /// Amount of the spend event that caused the crossing.
    pub amount: f64,
    pub usage_percentage: f64,
    /// Post-increment total.
    pub current_spent: f64,
    pub budget_limit: f64,
    pub timestamp: DateTime<Utc>,
}

impl BudgetAlert {
    /// Human-readable summary, e.g. for a toast.
    pub fn message(&self) -> String {
        match self.alert_type {
            AlertType::BudgetExceeded => format!(
                "{} has exceeded their monthly budget of {:.2}",
                self.member_name, self.budget_limit
            ),
            AlertType::BudgetWarning90 => format!(
                "{} has used 90% of their monthly budget ({:.2} / {:.2})",
                self.member_name, self.current_spent, self.budget_limit
            ),
            AlertType::BudgetWarning75 => {
                format!("{} has used 75% of their monthly budget", self.member_name)
            }
        }
    }
}
