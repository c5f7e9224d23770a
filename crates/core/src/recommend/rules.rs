//! The rule table.
//!
//! Each rule is an independent `{action, matcher}` pair evaluated uniformly
//! over the same input; adding or removing a rule cannot change how any
//! other rule fires. Missing optional fields simply keep a rule silent.

use chrono::Duration;

use crate::analysis::signal::Signal;
use crate::domain::action::ClientStatus;
use crate::recommend::types::{Priority, RecommendedAction, RuleInput};

/// Days past the scheduled follow-up before the overdue rule escalates.
pub const OVERDUE_ESCALATION_DAYS: i64 = 7;
/// Days around the expected order date that count as the order window.
pub const ORDER_WINDOW_DAYS: i64 = 7;
/// Days of silence on an in-progress client before the dialogue counts as
/// stalled.
pub const STALLED_DIALOGUE_DAYS: i64 = 14;
/// Revenue drop (percent, negative) at which a drop becomes a collapse.
pub const COLLAPSE_DROP_PERCENT: f64 = -50.0;

pub struct RuleMatch {
    pub priority: Priority,
    pub title: String,
    pub rationale: String,
}

pub struct RecommendationRule {
    pub action: RecommendedAction,
    pub matches: fn(&RuleInput) -> Option<RuleMatch>,
}

pub fn rules() -> &'static [RecommendationRule] {
    &RULES
}

static RULES: [RecommendationRule; 9] = [
    RecommendationRule { action: RecommendedAction::FirstContact, matches: first_contact },
    RecommendationRule {
        action: RecommendedAction::OverdueScheduledAction,
        matches: overdue_scheduled_action,
    },
    RecommendationRule { action: RecommendedAction::ExpectedOrderDue, matches: expected_order_due },
    RecommendationRule { action: RecommendedAction::RevenueCollapse, matches: revenue_collapse },
    RecommendationRule { action: RecommendedAction::CoolingFrequency, matches: cooling_frequency },
    RecommendationRule { action: RecommendedAction::ShrinkingBasket, matches: shrinking_basket },
    RecommendationRule { action: RecommendedAction::ForecastOverdue, matches: forecast_overdue },
    RecommendationRule { action: RecommendedAction::StalledDialogue, matches: stalled_dialogue },
    RecommendationRule { action: RecommendedAction::ReopenFollowUp, matches: reopen_follow_up },
];

fn first_contact(input: &RuleInput) -> Option<RuleMatch> {
    let untouched = match input.record {
        None => true,
        Some(record) => record.status == ClientStatus::New && !record.has_active_actions(),
    };

    untouched.then(|| RuleMatch {
        priority: Priority::Medium,
        title: "Make first contact".to_string(),
        rationale: format!("{} has no logged outreach yet.", input.client_name),
    })
}

fn overdue_scheduled_action(input: &RuleInput) -> Option<RuleMatch> {
    let action = input.record?.latest_active_action()?;
    let due = action.next_action_date?;
    if due >= input.anchor {
        return None;
    }

    let days_overdue = (input.anchor - due).num_days();
    let priority = if days_overdue > OVERDUE_ESCALATION_DAYS {
        Priority::Critical
    } else {
        Priority::High
    };
    let planned = action.next_action.as_deref().unwrap_or("the planned follow-up");

    Some(RuleMatch {
        priority,
        title: "Scheduled action is overdue".to_string(),
        rationale: format!("{planned} was due {days_overdue} day(s) ago."),
    })
}

fn expected_order_due(input: &RuleInput) -> Option<RuleMatch> {
    let record = input.record?;
    if record.status.is_settled() {
        return None;
    }
    let expected = record.potential_order_date?;
    let distance = (expected - input.anchor).num_days().abs();
    if distance > ORDER_WINDOW_DAYS {
        return None;
    }

    let amount = record
        .expected_amount
        .map(|value| format!(" worth ~{value}"))
        .unwrap_or_default();

    Some(RuleMatch {
        priority: Priority::High,
        title: "Expected order window is open".to_string(),
        rationale: format!(
            "An order{amount} was expected around {}.",
            expected.date_naive()
        ),
    })
}

fn revenue_collapse(input: &RuleInput) -> Option<RuleMatch> {
    input.signals.iter().find_map(|signal| match signal {
        Signal::RevenueDrop { drop_percent, .. } if *drop_percent <= COLLAPSE_DROP_PERCENT => {
            Some(RuleMatch {
                priority: Priority::Critical,
                title: "Revenue collapsed".to_string(),
                rationale: format!(
                    "Revenue fell {:.0}% against the previous period.",
                    drop_percent.abs()
                ),
            })
        }
        _ => None,
    })
}

fn cooling_frequency(input: &RuleInput) -> Option<RuleMatch> {
    input.signals.iter().find_map(|signal| match signal {
        Signal::FrequencyDrop { slowdown_percent, .. } => Some(RuleMatch {
            priority: Priority::Medium,
            title: "Purchase rhythm is cooling".to_string(),
            rationale: format!(
                "The gap between purchases grew {:.0}%.",
                slowdown_percent
            ),
        }),
        _ => None,
    })
}

fn shrinking_basket(input: &RuleInput) -> Option<RuleMatch> {
    input.signals.iter().find_map(|signal| match signal {
        Signal::AvgCheckDrop { drop_percent, .. } => Some(RuleMatch {
            priority: Priority::Medium,
            title: "Average order value is shrinking".to_string(),
            rationale: format!(
                "The average check fell {:.0}% against the previous period.",
                drop_percent.abs()
            ),
        }),
        _ => None,
    })
}

fn forecast_overdue(input: &RuleInput) -> Option<RuleMatch> {
    input.signals.iter().find_map(|signal| match signal {
        Signal::MissedForecast { days_since_last_purchase, .. } => Some(RuleMatch {
            priority: Priority::High,
            title: "Purchase is overdue by forecast".to_string(),
            rationale: format!(
                "No purchase for {days_since_last_purchase} day(s), past the usual rhythm."
            ),
        }),
        _ => None,
    })
}

fn stalled_dialogue(input: &RuleInput) -> Option<RuleMatch> {
    let record = input.record?;
    if record.status != ClientStatus::InProgress {
        return None;
    }
    let latest = record.latest_active_action()?;
    if input.anchor - latest.created_at <= Duration::days(STALLED_DIALOGUE_DAYS) {
        return None;
    }

    let idle_days = (input.anchor - latest.created_at).num_days();
    Some(RuleMatch {
        priority: Priority::Medium,
        title: "Dialogue has stalled".to_string(),
        rationale: format!("Work is in progress but the last touch was {idle_days} day(s) ago."),
    })
}

fn reopen_follow_up(input: &RuleInput) -> Option<RuleMatch> {
    let record = input.record?;
    if !record.status.is_settled() || input.signals.is_empty() {
        return None;
    }

    Some(RuleMatch {
        priority: Priority::Low,
        title: "Re-open follow-up".to_string(),
        rationale: "The client was settled but new anomaly signals fired this pass.".to_string(),
    })
}
