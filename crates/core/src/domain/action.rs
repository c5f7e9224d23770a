use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::sale::ClientCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    New,
    InProgress,
    Resolved,
    Closed,
}

impl ClientStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

/// One logged touch on a client: a call, a meeting, a note. Cancelled
/// actions stay in the list but are invisible to every rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientAction {
    pub action_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub next_action: Option<String>,
    #[serde(default)]
    pub next_action_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled: bool,
}

/// Per-client working state maintained by the sales team. Read-only input to
/// the recommendation engine; only explicit user actions mutate it upstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientActionRecord {
    pub client_code: ClientCode,
    pub status: ClientStatus,
    #[serde(default)]
    pub actions: Vec<ClientAction>,
    #[serde(default)]
    pub potential_order_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expected_amount: Option<Decimal>,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
}

impl ClientActionRecord {
    pub fn active_actions(&self) -> impl Iterator<Item = &ClientAction> {
        self.actions.iter().filter(|action| !action.cancelled)
    }

    /// Newest non-cancelled action by creation time.
    pub fn latest_active_action(&self) -> Option<&ClientAction> {
        self.active_actions().max_by_key(|action| action.created_at)
    }

    pub fn has_active_actions(&self) -> bool {
        self.active_actions().next().is_some()
    }
}
