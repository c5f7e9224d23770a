use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analysis::window::{AnalysisWindow, WindowSlot};
use crate::domain::sale::{ClientCode, Sale};

/// Per-client totals for the two comparison windows. Carries the raw
/// purchase days so every downstream signal stays re-derivable from the
/// aggregate alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientPeriodTotals {
    pub client_name: String,
    pub now_revenue: Decimal,
    pub prev_revenue: Decimal,
    pub now_dates: Vec<NaiveDate>,
    pub prev_dates: Vec<NaiveDate>,
    pub now_tx_count: u32,
    pub prev_tx_count: u32,
}

impl ClientPeriodTotals {
    pub fn now_avg_check(&self) -> Option<Decimal> {
        (self.now_tx_count > 0).then(|| self.now_revenue / Decimal::from(self.now_tx_count))
    }

    pub fn prev_avg_check(&self) -> Option<Decimal> {
        (self.prev_tx_count > 0).then(|| self.prev_revenue / Decimal::from(self.prev_tx_count))
    }
}

/// Bucket every sale into the current or previous window and sum per
/// client. Sales outside both windows are discarded. Pure function of the
/// (already visibility-filtered) sales and the window; the BTreeMap keeps
/// iteration order deterministic.
pub fn aggregate(sales: &[Sale], window: &AnalysisWindow) -> BTreeMap<ClientCode, ClientPeriodTotals> {
    let mut totals: BTreeMap<ClientCode, ClientPeriodTotals> = BTreeMap::new();

    for sale in sales {
        let Some(slot) = window.bucket(sale.date) else {
            continue;
        };

        let entry = totals.entry(sale.client_code.clone()).or_default();
        if entry.client_name.is_empty() {
            entry.client_name = sale.client_name.clone();
        }

        match slot {
            WindowSlot::Current => {
                entry.now_revenue += sale.revenue;
                entry.now_dates.push(sale.date.date_naive());
                entry.now_tx_count += 1;
            }
            WindowSlot::Previous => {
                entry.prev_revenue += sale.revenue;
                entry.prev_dates.push(sale.date.date_naive());
                entry.prev_tx_count += 1;
            }
        }
    }

    totals
}
