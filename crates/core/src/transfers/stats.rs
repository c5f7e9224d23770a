//! Roll-up of hand-off events into management statistics.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::access::names::name_key;
use crate::domain::employee::{DepartmentId, EmployeeDirectory};
use crate::transfers::detector::TransferEvent;

/// Event activity inside one fixed day-span ending at the anchor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBucket {
    pub days: i64,
    pub event_count: u32,
    pub distinct_clients: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManagerTransferSummary {
    pub manager: String,
    pub sent: u32,
    pub received: u32,
    pub distinct_clients: u32,
    /// Revenue of tenures this manager handed away.
    pub revenue_before: Decimal,
    /// Revenue accumulated under this manager after receiving clients.
    pub revenue_after: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepartmentTransferSummary {
    pub department: DepartmentId,
    pub sent: u32,
    pub received: u32,
    pub distinct_clients: u32,
    pub revenue_before: Decimal,
    pub revenue_after: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferStatistics {
    pub total_events: u32,
    pub distinct_clients: u32,
    pub distinct_managers: u32,
    pub buckets: Vec<PeriodBucket>,
    pub managers: Vec<ManagerTransferSummary>,
    pub departments: Vec<DepartmentTransferSummary>,
    /// Share of hand-offs that produced any post-transfer revenue.
    pub conversion_rate: f64,
    /// Mean post-transfer revenue among the converted subset only.
    pub avg_post_transfer_revenue: Option<Decimal>,
}

#[derive(Default)]
struct Rollup {
    display_name: String,
    sent: u32,
    received: u32,
    clients: BTreeSet<String>,
    revenue_before: Decimal,
    revenue_after: Decimal,
}

pub fn summarize(
    events: &[TransferEvent],
    anchor: DateTime<Utc>,
    bucket_days: &[i64],
    employees: &EmployeeDirectory,
) -> TransferStatistics {
    let distinct_clients: BTreeSet<&str> =
        events.iter().map(|event| event.client_code.0.as_str()).collect();
    let distinct_managers: BTreeSet<String> = events
        .iter()
        .flat_map(|event| [name_key(&event.from_manager), name_key(&event.to_manager)])
        .collect();

    let buckets = bucket_days
        .iter()
        .map(|&days| {
            let start = anchor - Duration::days(days);
            let in_bucket: Vec<&TransferEvent> = events
                .iter()
                .filter(|event| event.transfer_date >= start && event.transfer_date <= anchor)
                .collect();
            let clients: BTreeSet<&str> =
                in_bucket.iter().map(|event| event.client_code.0.as_str()).collect();
            PeriodBucket {
                days,
                event_count: in_bucket.len() as u32,
                distinct_clients: clients.len() as u32,
            }
        })
        .collect();

    let mut manager_rollups: BTreeMap<String, Rollup> = BTreeMap::new();
    let mut department_rollups: BTreeMap<DepartmentId, Rollup> = BTreeMap::new();

    for event in events {
        {
            let sender = manager_rollups.entry(name_key(&event.from_manager)).or_default();
            if sender.display_name.is_empty() {
                sender.display_name = event.from_manager.clone();
            }
            sender.sent += 1;
            sender.clients.insert(event.client_code.0.clone());
            sender.revenue_before += event.prev_tenure_revenue;
        }
        {
            let receiver = manager_rollups.entry(name_key(&event.to_manager)).or_default();
            if receiver.display_name.is_empty() {
                receiver.display_name = event.to_manager.clone();
            }
            receiver.received += 1;
            receiver.clients.insert(event.client_code.0.clone());
            receiver.revenue_after += event.current_tenure_revenue;
        }

        if let Some(department) = employees.department_of_manager(&event.from_manager) {
            let rollup = department_rollups.entry(department.clone()).or_default();
            rollup.sent += 1;
            rollup.clients.insert(event.client_code.0.clone());
            rollup.revenue_before += event.prev_tenure_revenue;
        }
        if let Some(department) = employees.department_of_manager(&event.to_manager) {
            let rollup = department_rollups.entry(department.clone()).or_default();
            rollup.received += 1;
            rollup.clients.insert(event.client_code.0.clone());
            rollup.revenue_after += event.current_tenure_revenue;
        }
    }

    let mut managers: Vec<ManagerTransferSummary> = manager_rollups
        .into_values()
        .map(|rollup| ManagerTransferSummary {
            manager: rollup.display_name,
            sent: rollup.sent,
            received: rollup.received,
            distinct_clients: rollup.clients.len() as u32,
            revenue_before: rollup.revenue_before,
            revenue_after: rollup.revenue_after,
        })
        .collect();
    managers.sort_by(|left, right| {
        (right.sent + right.received)
            .cmp(&(left.sent + left.received))
            .then_with(|| left.manager.cmp(&right.manager))
    });

    let mut departments: Vec<DepartmentTransferSummary> = department_rollups
        .into_iter()
        .map(|(department, rollup)| DepartmentTransferSummary {
            department,
            sent: rollup.sent,
            received: rollup.received,
            distinct_clients: rollup.clients.len() as u32,
            revenue_before: rollup.revenue_before,
            revenue_after: rollup.revenue_after,
        })
        .collect();
    departments.sort_by(|left, right| {
        (right.sent + right.received)
            .cmp(&(left.sent + left.received))
            .then_with(|| left.department.cmp(&right.department))
    });

    let converted: Vec<Decimal> = events
        .iter()
        .filter(|event| event.current_tenure_revenue > Decimal::ZERO)
        .map(|event| event.current_tenure_revenue)
        .collect();
    let conversion_rate = if events.is_empty() {
        0.0
    } else {
        converted.len() as f64 / events.len() as f64
    };
    let avg_post_transfer_revenue = (!converted.is_empty()).then(|| {
        converted.iter().copied().sum::<Decimal>() / Decimal::from(converted.len() as u64)
    });

    TransferStatistics {
        total_events: events.len() as u32,
        distinct_clients: distinct_clients.len() as u32,
        distinct_managers: distinct_managers.len() as u32,
        buckets,
        managers,
        departments,
        conversion_rate,
        avg_post_transfer_revenue,
    }
}
