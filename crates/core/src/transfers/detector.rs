use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::access::names::same_person;
use crate::domain::directory::DirectoryLookup;
use crate::domain::sale::{ClientCode, Sale};
use crate::transfers::segmentation::segment_tenures;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferSource {
    /// Derived from a manager change inside the ledger sequence.
    Sales,
    /// Synthesized from a directory reassignment with no transaction
    /// evidence yet.
    Directory,
}

/// One account hand-off for one client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub client_code: ClientCode,
    pub client_name: String,
    pub from_manager: String,
    pub to_manager: String,
    pub transfer_date: DateTime<Utc>,
    pub prev_tenure_revenue: Decimal,
    pub current_tenure_revenue: Decimal,
    pub source: TransferSource,
}

/// Detects hand-offs by segmenting each client's ledger into tenure
/// periods, then cross-checking the directory for administrative
/// reassignments the ledger has not caught up with.
#[derive(Clone, Copy, Debug)]
pub struct TransferDetector {
    pub lookback_days: i64,
}

impl TransferDetector {
    pub fn new(lookback_days: i64) -> Self {
        Self { lookback_days }
    }

    pub fn detect<D: DirectoryLookup>(
        &self,
        sales: &[Sale],
        directory: &D,
        anchor: DateTime<Utc>,
    ) -> Vec<TransferEvent> {
        let window_start = anchor - Duration::days(self.lookback_days);

        let mut by_client: BTreeMap<ClientCode, Vec<Sale>> = BTreeMap::new();
        for sale in sales {
            if sale.date <= anchor {
                by_client.entry(sale.client_code.clone()).or_default().push(sale.clone());
            }
        }

        let mut events = Vec::new();
        for (client_code, client_sales) in &by_client {
            let tenures = segment_tenures(client_sales);
            let Some(last_tenure) = tenures.last() else {
                continue;
            };
            let client_name = client_sales
                .iter()
                .max_by_key(|sale| sale.date)
                .map(|sale| sale.client_name.clone())
                .unwrap_or_default();

            let mut client_events = Vec::new();
            for pair in tenures.windows(2) {
                let boundary = pair[1].start;
                if boundary < window_start || boundary > anchor {
                    continue;
                }
                client_events.push(TransferEvent {
                    client_code: client_code.clone(),
                    client_name: client_name.clone(),
                    from_manager: pair[0].manager.clone(),
                    to_manager: pair[1].manager.clone(),
                    transfer_date: boundary,
                    prev_tenure_revenue: pair[0].revenue,
                    current_tenure_revenue: pair[1].revenue,
                    source: TransferSource::Sales,
                });
            }

            if let Some(synthesized) = self.directory_reassignment(
                directory,
                client_code,
                &client_name,
                last_tenure.manager.as_str(),
                last_tenure.revenue,
                client_sales,
                &client_events,
                window_start,
                anchor,
            ) {
                client_events.push(synthesized);
            }

            events.extend(client_events);
        }

        // Newest hand-offs first; client code breaks date ties.
        events.sort_by(|left, right| {
            right
                .transfer_date
                .cmp(&left.transfer_date)
                .then_with(|| left.client_code.cmp(&right.client_code))
        });
        events
    }

    /// A directory entry naming a different manager than the client's last
    /// sale surfaces a reassignment that has produced no transactions yet.
    #[allow(clippy::too_many_arguments)]
    fn directory_reassignment<D: DirectoryLookup>(
        &self,
        directory: &D,
        client_code: &ClientCode,
        client_name: &str,
        last_sale_manager: &str,
        last_tenure_revenue: Decimal,
        client_sales: &[Sale],
        existing: &[TransferEvent],
        window_start: DateTime<Utc>,
        anchor: DateTime<Utc>,
    ) -> Option<TransferEvent> {
        let entry = directory.entry(client_code)?;
        if same_person(&entry.current_manager, last_sale_manager) {
            return None;
        }

        let last_sale_date = client_sales.iter().map(|sale| sale.date).max()?;
        if last_sale_date < window_start || last_sale_date > anchor {
            return None;
        }

        let already_reported = existing.iter().any(|event| {
            same_person(&event.from_manager, last_sale_manager)
                && same_person(&event.to_manager, &entry.current_manager)
        });
        if already_reported {
            return None;
        }

        Some(TransferEvent {
            client_code: client_code.clone(),
            client_name: client_name.to_string(),
            from_manager: last_sale_manager.to_string(),
            to_manager: entry.current_manager.clone(),
            transfer_date: last_sale_date,
            prev_tenure_revenue: last_tenure_revenue,
            current_tenure_revenue: Decimal::ZERO,
            source: TransferSource::Directory,
        })
    }
}
