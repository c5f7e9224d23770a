use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::sale::Sale;

/// A maximal contiguous run of one client's sales under one manager.
/// `end` is the date of the first sale under the successor, `None` for the
/// tenure still running.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TenurePeriod {
    pub manager: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub revenue: Decimal,
    pub sale_count: u32,
}

/// Fold one client's sales into tenure periods. The input may arrive in any
/// order; segmentation sorts by date ascending first. Manager identity
/// within a single client's ledger sequence is the trimmed name itself.
pub fn segment_tenures(sales: &[Sale]) -> Vec<TenurePeriod> {
    let mut ordered: Vec<&Sale> = sales.iter().collect();
    ordered.sort_by_key(|sale| sale.date);

    let mut tenures: Vec<TenurePeriod> = Vec::new();
    for sale in ordered {
        let manager = sale.manager_name.trim();
        match tenures.last_mut() {
            Some(current) if current.manager == manager => {
                current.revenue += sale.revenue;
                current.sale_count += 1;
                continue;
            }
            Some(previous) => previous.end = Some(sale.date),
            None => {}
        }
        tenures.push(TenurePeriod {
            manager: manager.to_string(),
            start: sale.date,
            end: None,
            revenue: sale.revenue,
            sale_count: 1,
        });
    }

    tenures
}
