use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::aggregate::ClientPeriodTotals;
use crate::analysis::signal::Signal;
use crate::domain::action::ClientActionRecord;
use crate::domain::sale::ClientCode;

/// Ordered so that `Ord` ranks Critical highest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    FirstContact,
    OverdueScheduledAction,
    ExpectedOrderDue,
    RevenueCollapse,
    CoolingFrequency,
    ShrinkingBasket,
    ForecastOverdue,
    StalledDialogue,
    ReopenFollowUp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: RecommendedAction,
    pub priority: Priority,
    pub client_code: ClientCode,
    pub client_name: String,
    pub title: String,
    pub rationale: String,
}

/// Everything the rules may look at for one client. All fields are
/// borrowed snapshots; rules never mutate state.
pub struct RuleInput<'a> {
    pub client_code: &'a ClientCode,
    pub client_name: &'a str,
    pub record: Option<&'a ClientActionRecord>,
    pub totals: Option<&'a ClientPeriodTotals>,
    pub signals: Vec<&'a Signal>,
    pub anchor: DateTime<Utc>,
}
