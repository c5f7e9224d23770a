use serde::{Deserialize, Serialize};

use crate::domain::action::ClientStatus;
use crate::domain::employee::{DepartmentId, EmployeeId};

/// Filter state handed over by the presentation layer. Immutable for the
/// duration of one analysis pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterContext {
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub manager_id: Option<EmployeeId>,
    pub period_months: u32,
    #[serde(default)]
    pub status_filter: Option<ClientStatus>,
    #[serde(default)]
    pub search_term: Option<String>,
}

impl FilterContext {
    pub fn for_period(period_months: u32) -> Self {
        Self {
            department_id: None,
            manager_id: None,
            period_months,
            status_filter: None,
            search_term: None,
        }
    }

    /// Case-insensitive substring match on client name or code. An empty or
    /// absent search term matches everything.
    pub fn matches_search(&self, client_code: &str, client_name: &str) -> bool {
        match self.search_term.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let needle = term.to_lowercase();
                client_code.to_lowercase().contains(&needle)
                    || client_name.to_lowercase().contains(&needle)
            }
        }
    }
}
