//! One analysis pass, end to end.
//!
//! The pass filters the ledger through the access resolver exactly once and
//! hands every downstream stage the same immutable snapshot, so no
//! unauthorized record can influence any sum, count, or interval. Given
//! identical inputs and anchor, the emitted signal, transfer, and
//! recommendation lists are byte-identical between runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::{AccessContext, AccessResolver, FallbackPolicy};
use crate::analysis::aggregate::{aggregate, ClientPeriodTotals};
use crate::analysis::detectors::detect_all;
use crate::analysis::signal::Signal;
use crate::analysis::window::AnalysisWindow;
use crate::domain::action::ClientActionRecord;
use crate::domain::directory::{DirectoryLookup, ManagerDirectory};
use crate::domain::employee::EmployeeDirectory;
use crate::domain::filter::FilterContext;
use crate::domain::sale::{ClientCode, Sale};
use crate::errors::DomainError;
use crate::recommend::{self, Recommendation, RuleInput};
use crate::transfers::{summarize, TransferDetector, TransferEvent, TransferStatistics};

/// The already-fetched snapshot one pass computes over.
#[derive(Clone, Debug, Default)]
pub struct AnalysisInputs {
    pub sales: Vec<Sale>,
    pub directory: ManagerDirectory,
    pub employees: EmployeeDirectory,
    pub actions: BTreeMap<ClientCode, ClientActionRecord>,
}

#[derive(Clone, Debug)]
pub struct AnalysisRequest {
    pub context: AccessContext,
    pub filter: FilterContext,
    pub anchor: DateTime<Utc>,
    pub lookback_days: i64,
    pub stat_bucket_days: Vec<i64>,
    pub fallback: FallbackPolicy,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub anchor: DateTime<Utc>,
    pub period_months: u32,
    pub lookback_days: i64,
    pub signals: Vec<Signal>,
    pub transfers: Vec<TransferEvent>,
    pub transfer_stats: TransferStatistics,
    pub recommendations: Vec<Recommendation>,
}

pub fn run_analysis(
    inputs: &AnalysisInputs,
    request: &AnalysisRequest,
) -> Result<AnalysisReport, DomainError> {
    if request.filter.period_months == 0 {
        return Err(DomainError::InvalidPeriod { months: request.filter.period_months });
    }
    if request.lookback_days <= 0 {
        return Err(DomainError::InvalidLookback { days: request.lookback_days });
    }

    let run_id = Uuid::new_v4();
    info!(
        event_name = "analysis.pass.start",
        correlation_id = %run_id,
        ledger_size = inputs.sales.len(),
        period_months = request.filter.period_months,
        lookback_days = request.lookback_days,
        "starting analysis pass"
    );

    let resolver = AccessResolver::new(
        &request.context,
        &inputs.directory,
        &inputs.employees,
        request.fallback,
    );

    let visible: Vec<Sale> = inputs
        .sales
        .iter()
        .filter(|sale| resolver.is_visible(&sale.client_code, &sale.manager_name))
        .cloned()
        .collect();

    let window = AnalysisWindow::new(request.filter.period_months, request.anchor);
    let totals = aggregate(&visible, &window);
    let signals = detect_all(&totals, request.anchor.date_naive());

    let detector = TransferDetector::new(request.lookback_days);
    let transfers = detector.detect(&visible, &inputs.directory, request.anchor);
    let transfer_stats =
        summarize(&transfers, request.anchor, &request.stat_bucket_days, &inputs.employees);

    let recommendations =
        recommend_for_clients(inputs, request, &resolver, &totals, &signals);

    if resolver.fallback_resolutions() > 0 {
        warn!(
            event_name = "analysis.access.fallback_used",
            correlation_id = %run_id,
            fallback_resolutions = resolver.fallback_resolutions(),
            "visibility fell back to ledger manager names for clients missing from the directory"
        );
    }
    info!(
        event_name = "analysis.pass.completed",
        correlation_id = %run_id,
        visible_sales = visible.len(),
        signal_count = signals.len(),
        transfer_count = transfers.len(),
        recommendation_count = recommendations.len(),
        "analysis pass completed"
    );

    Ok(AnalysisReport {
        run_id,
        anchor: request.anchor,
        period_months: request.filter.period_months,
        lookback_days: request.lookback_days,
        signals,
        transfers,
        transfer_stats,
        recommendations,
    })
}

fn recommend_for_clients<D: DirectoryLookup>(
    inputs: &AnalysisInputs,
    request: &AnalysisRequest,
    resolver: &AccessResolver<'_, D>,
    totals: &BTreeMap<ClientCode, ClientPeriodTotals>,
    signals: &[Signal],
) -> Vec<Recommendation> {
    let mut clients: BTreeSet<ClientCode> = totals.keys().cloned().collect();
    for (code, record) in &inputs.actions {
        // Action-only clients have no ledger manager to fall back on; an
        // empty name makes the legacy path fail closed for them.
        if resolver.is_visible(code, "") {
            clients.insert(record.client_code.clone());
        }
    }

    let mut recommendations = Vec::new();
    for code in &clients {
        let record = inputs.actions.get(code);
        let entry = totals.get(code);

        if let Some(status_filter) = request.filter.status_filter {
            if record.map(|r| r.status) != Some(status_filter) {
                continue;
            }
        }

        let client_name = entry
            .map(|totals| totals.client_name.clone())
            .or_else(|| {
                inputs.directory.entry(code).and_then(|entry| entry.display_name.clone())
            })
            .unwrap_or_else(|| code.0.clone());

        if !request.filter.matches_search(&code.0, &client_name) {
            continue;
        }

        let client_signals: Vec<&Signal> =
            signals.iter().filter(|signal| signal.client_code() == code).collect();

        let input = RuleInput {
            client_code: code,
            client_name: &client_name,
            record,
            totals: entry,
            signals: client_signals,
            anchor: request.anchor,
        };
        recommendations.extend(recommend::evaluate_client(&input));
    }

    recommend::rank(recommendations)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{run_analysis, AnalysisInputs, AnalysisRequest};
    use crate::access::{AccessContext, FallbackPolicy};
    use crate::analysis::signal::Signal;
    use crate::domain::directory::{DirectoryEntry, ManagerDirectory};
    use crate::domain::employee::{
        DepartmentId, Employee, EmployeeDirectory, EmployeeId, EmployeeRole,
    };
    use crate::domain::filter::FilterContext;
    use crate::domain::sale::{parse_revenue, ClientCode, Sale};
    use crate::errors::DomainError;
    use crate::recommend::{Priority, RecommendedAction};
    use crate::transfers::TransferSource;

    fn date(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, month, day, 0, 0, 0).unwrap()
    }

    fn sale(code: &str, manager: &str, when: DateTime<Utc>, revenue: &str) -> Sale {
        Sale {
            client_code: ClientCode(code.to_string()),
            client_name: format!("Client {code}"),
            manager_name: manager.to_string(),
            date: when,
            revenue: parse_revenue(revenue),
            sphere: None,
            product: None,
        }
    }

    fn admin_request(period_months: u32) -> AnalysisRequest {
        AnalysisRequest {
            context: AccessContext::admin("u-admin"),
            filter: FilterContext::for_period(period_months),
            anchor: date(6, 15),
            lookback_days: 180,
            stat_bucket_days: vec![7, 30, 90],
            fallback: FallbackPolicy::default(),
        }
    }

    #[test]
    fn hand_off_ledger_produces_drop_signal_and_transfer_event() {
        // Two sales half a year apart under different managers: the revenue
        // halves and the client changes hands.
        let inputs = AnalysisInputs {
            sales: vec![
                sale("C1", "A", date(1, 1), "1000,00"),
                sale("C1", "B", date(6, 1), "500,00"),
            ],
            directory: ManagerDirectory::default(),
            employees: EmployeeDirectory::default(),
            actions: BTreeMap::new(),
        };

        let report = run_analysis(&inputs, &admin_request(3)).unwrap();

        let drop = report
            .signals
            .iter()
            .find_map(|signal| match signal {
                Signal::RevenueDrop { prev_revenue, now_revenue, drop_percent, .. } => {
                    Some((*prev_revenue, *now_revenue, *drop_percent))
                }
                _ => None,
            })
            .expect("expected a revenue drop for C1");
        assert_eq!(drop.0, Decimal::new(100_000, 2));
        assert_eq!(drop.1, Decimal::new(50_000, 2));
        assert!((drop.2 - (-50.0)).abs() < 1e-9);

        assert_eq!(report.transfers.len(), 1);
        let event = &report.transfers[0];
        assert_eq!(event.from_manager, "A");
        assert_eq!(event.to_manager, "B");
        assert_eq!(event.transfer_date, date(6, 1));
        assert_eq!(event.source, TransferSource::Sales);

        assert_eq!(report.transfer_stats.total_events, 1);
    }

    #[test]
    fn pipeline_is_idempotent_for_identical_inputs() {
        let inputs = AnalysisInputs {
            sales: vec![
                sale("C1", "A", date(1, 1), "1000,00"),
                sale("C1", "B", date(6, 1), "500,00"),
                sale("C2", "A", date(5, 1), "300,00"),
            ],
            directory: ManagerDirectory::default(),
            employees: EmployeeDirectory::default(),
            actions: BTreeMap::new(),
        };
        let request = admin_request(3);

        let first = run_analysis(&inputs, &request).unwrap();
        let second = run_analysis(&inputs, &request).unwrap();

        let serialize = |report: &super::AnalysisReport| {
            (
                serde_json::to_string(&report.signals).unwrap(),
                serde_json::to_string(&report.transfers).unwrap(),
                serde_json::to_string(&report.recommendations).unwrap(),
            )
        };
        assert_eq!(serialize(&first), serialize(&second));
    }

    #[test]
    fn unauthorized_sales_never_reach_aggregates() {
        // The directory says Ivan owns C-theirs; Anna's session must not see
        // it even though the raw ledger rows carry her name.
        let inputs = AnalysisInputs {
            sales: vec![
                sale("C-mine", "Anna Petrova", date(5, 1), "200,00"),
                sale("C-mine", "Anna Petrova", date(6, 1), "100,00"),
                sale("C-theirs", "Anna Petrova", date(5, 10), "900,00"),
            ],
            directory: ManagerDirectory::from_entries(vec![
                DirectoryEntry {
                    client_code: ClientCode("C-mine".to_string()),
                    current_manager: "Anna Petrova".to_string(),
                    crm_link: None,
                    display_name: None,
                },
                DirectoryEntry {
                    client_code: ClientCode("C-theirs".to_string()),
                    current_manager: "Ivan Sidorov".to_string(),
                    crm_link: None,
                    display_name: None,
                },
            ]),
            employees: EmployeeDirectory::new(vec![Employee {
                id: EmployeeId("e-1".to_string()),
                name: "Anna Petrova".to_string(),
                department: Some(DepartmentId("dept-a".to_string())),
                role: EmployeeRole::Manager,
            }]),
            actions: BTreeMap::new(),
        };

        let mut request = admin_request(3);
        request.context = AccessContext::derive(
            "u-1",
            Some(Employee {
                id: EmployeeId("e-1".to_string()),
                name: "Anna Petrova".to_string(),
                department: Some(DepartmentId("dept-a".to_string())),
                role: EmployeeRole::Manager,
            }),
            false,
        );

        let report = run_analysis(&inputs, &request).unwrap();

        assert!(report
            .signals
            .iter()
            .all(|signal| signal.client_code() != &ClientCode("C-theirs".to_string())));
        assert!(report
            .recommendations
            .iter()
            .all(|rec| rec.client_code != ClientCode("C-theirs".to_string())));
    }

    #[test]
    fn untouched_client_gets_first_contact_recommendation() {
        let inputs = AnalysisInputs {
            sales: vec![sale("C1", "A", date(6, 1), "500,00")],
            directory: ManagerDirectory::default(),
            employees: EmployeeDirectory::default(),
            actions: BTreeMap::new(),
        };

        let report = run_analysis(&inputs, &admin_request(3)).unwrap();

        assert!(report.recommendations.iter().any(|rec| {
            rec.action == RecommendedAction::FirstContact && rec.priority == Priority::Medium
        }));
    }

    #[test]
    fn recommendations_come_out_priority_first() {
        let inputs = AnalysisInputs {
            sales: vec![
                // Revenue collapse (critical) for C1.
                sale("C1", "A", date(2, 1), "1000,00"),
                sale("C1", "A", date(6, 1), "100,00"),
                // Quiet new client (medium) for C2.
                sale("C2", "A", date(6, 5), "300,00"),
            ],
            directory: ManagerDirectory::default(),
            employees: EmployeeDirectory::default(),
            actions: BTreeMap::new(),
        };

        let report = run_analysis(&inputs, &admin_request(3)).unwrap();

        assert!(!report.recommendations.is_empty());
        let priorities: Vec<Priority> =
            report.recommendations.iter().map(|rec| rec.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn search_filter_narrows_recommendations() {
        let inputs = AnalysisInputs {
            sales: vec![
                sale("C1", "A", date(6, 1), "500,00"),
                sale("C2", "A", date(6, 2), "600,00"),
            ],
            directory: ManagerDirectory::default(),
            employees: EmployeeDirectory::default(),
            actions: BTreeMap::new(),
        };

        let mut request = admin_request(3);
        request.filter.search_term = Some("C2".to_string());
        let report = run_analysis(&inputs, &request).unwrap();

        assert!(!report.recommendations.is_empty());
        assert!(report
            .recommendations
            .iter()
            .all(|rec| rec.client_code == ClientCode("C2".to_string())));
    }

    #[test]
    fn invalid_request_parameters_fail_fast() {
        let inputs = AnalysisInputs::default();

        let mut request = admin_request(0);
        assert!(matches!(
            run_analysis(&inputs, &request),
            Err(DomainError::InvalidPeriod { months: 0 })
        ));

        request.filter.period_months = 3;
        request.lookback_days = 0;
        assert!(matches!(
            run_analysis(&inputs, &request),
            Err(DomainError::InvalidLookback { days: 0 })
        ));
    }
}
