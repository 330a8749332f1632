//! Pure tier transition.
//!
//! Both triggers (a spend event and a timer tick) go through `evaluate`, which
//! takes the member's current state and returns the state to commit plus
//! whether a pop-up alert is due. No clock, no bus, no locking.

use crate::domain::budget::usage_percentage;
use crate::domain::{MemberBudgetState, Tier};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Local expense of `amount` for this member.
    Spend { amount: f64 },
    /// Timer re-evaluation; never raises an alert.
    Tick,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub previous_tier: Tier,
    pub tier: Tier,
    /// State after applying the trigger.
    pub next: MemberBudgetState,
    /// Set only when a spend event lifts the member into a higher tier.
    pub alert: Option<Tier>,
}

pub fn evaluate(state: &MemberBudgetState, trigger: Trigger) -> Transition {
    let previous_tier = state.tier();
    let mut next = state.clone();

    let alert = match trigger {
        Trigger::Tick => None,
        Trigger::Spend { amount } => {
            // Classify the projected total before committing it.
            let projected = state.current_spent + amount;
            let projected_tier = Tier::classify(usage_percentage(projected, state.monthly_budget));
            next.current_spent = projected;
            (projected_tier > previous_tier).then_some(projected_tier)
        }
    };

    Transition {
        previous_tier,
        tier: next.tier(),
        next,
        alert,
    }
}
