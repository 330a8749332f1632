//! Per-member budget state and the remote snapshot it is reconciled from.

use serde::{Deserialize, Serialize};

use super::alert::AlertType;

/// Budget usage band.
///
/// Ordered `None < Warning75 < Warning90 < Exceeded`; the monitor compares
/// tiers to decide whether a spend event crossed a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    None,
    Warning75,
    Warning90,
    Exceeded,
}

impl Tier {
    /// Classify a usage percentage. Boundaries are inclusive.
    pub fn classify(usage_percentage: f64) -> Tier {
        if usage_percentage >= 100.0 {
            Tier::Exceeded
        } else if usage_percentage >= 90.0 {
            Tier::Warning90
        } else if usage_percentage >= 75.0 {
            Tier::Warning75
        } else {
            Tier::None
        }
    }

    pub fn alert_type(self) -> Option<AlertType> {
        match self {
            Tier::None => None,
            Tier::Warning75 => Some(AlertType::BudgetWarning75),
            Tier::Warning90 => Some(AlertType::BudgetWarning90),
            Tier::Exceeded => Some(AlertType::BudgetExceeded),
        }
    }
}

/// Budget aggregate for one family member.
///
/// `monthly_budget` is authoritative from the last full refresh.
/// `current_spent` may run ahead of the server between refreshes because
/// local spend events are applied optimistically; the next refresh overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBudgetState {
    pub user_id: String,
    pub name: String,
    pub role: String,
    pub monthly_budget: f64,
    pub current_spent: f64,
}

impl MemberBudgetState {
    /// Build state from a remote member record. Returns `None` when the
    /// record's budget is not a positive finite number.
    pub fn from_record(record: &MemberRecord) -> Option<Self> {
        if !(record.monthly_budget.is_finite() && record.monthly_budget > 0.0) {
            return None;
        }
        Some(Self {
            user_id: record.user_id.clone(),
            name: record.username.clone(),
            role: record.role.clone(),
            monthly_budget: record.monthly_budget,
            current_spent: record.monthly_expenses.max(0.0),
        })
    }

    pub fn usage_percentage(&self) -> f64 {
        usage_percentage(self.current_spent, self.monthly_budget)
    }

    pub fn tier(&self) -> Tier {
        Tier::classify(self.usage_percentage())
    }

    pub fn remaining_budget(&self) -> f64 {
        (self.monthly_budget - self.current_spent).max(0.0)
    }
}

pub fn usage_percentage(spent: f64, budget: f64) -> f64 {
    spent / budget * 100.0
}

/// One member as returned by the financial-summary endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub role: String,
    pub monthly_budget: f64,
    #[serde(default)]
    pub monthly_expenses: f64,
    #[serde(default)]
    pub monthly_income: f64,
}

/// Family-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilySummary {
    pub total_budget: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_savings: f64,
}

impl FamilySummary {
    pub fn from_members(members: &[MemberRecord]) -> Self {
        members.iter().fold(Self::default(), |mut acc, m| {
            acc.total_budget += m.monthly_budget;
            acc.total_income += m.monthly_income;
            acc.total_expenses += m.monthly_expenses;
            acc.total_savings += m.monthly_income - m.monthly_expenses;
            acc
        })
    }
}

/// Full reconciliation snapshot: `{ members: [...], summary: {...} }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilySnapshot {
    #[serde(default)]
    pub members: Vec<MemberRecord>,
    #[serde(default)]
    pub summary: Option<FamilySummary>,
}

/// A locally observed expense for one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendEvent {
    pub user_id: String,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub member_name: Option<String>,
}

impl SpendEvent {
    pub fn new(user_id: impl Into<String>, amount: f64, category: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            amount,
            category: category.into(),
            member_name: None,
        }
    }

    /// Negative or non-finite amounts cannot be applied.
    pub fn is_well_formed(&self) -> bool {
        self.amount.is_finite() && self.amount >= 0.0
    }
}

/// Read-only view of one member, as returned by `family_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStatus {
    pub user_id: String,
    pub member_name: String,
    pub role: String,
    pub monthly_budget: f64,
    pub current_spent: f64,
    pub remaining_budget: f64,
    pub usage_percentage: f64,
    pub is_over_budget: bool,
}

impl From<&MemberBudgetState> for MemberStatus {
    fn from(state: &MemberBudgetState) -> Self {
        let usage = state.usage_percentage();
        Self {
            user_id: state.user_id.clone(),
            member_name: state.name.clone(),
            role: state.role.clone(),
            monthly_budget: state.monthly_budget,
            current_spent: state.current_spent,
            remaining_budget: state.remaining_budget(),
            usage_percentage: usage,
            is_over_budget: usage >= 100.0,
        }
    }
}
