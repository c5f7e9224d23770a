//! The four behavioral anomaly detectors.
//!
//! All four read the period aggregator's output and return their signals
//! most-severe-first. Clients with insufficient history are excluded, not
//! flagged. Severity ties break on client code so output is byte-stable
//! across runs.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::analysis::aggregate::ClientPeriodTotals;
use crate::analysis::intervals::{average_interval_days, unique_days};
use crate::analysis::signal::Signal;
use crate::domain::sale::ClientCode;

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn rank_by(mut flagged: Vec<(f64, Signal)>, ascending: bool) -> Vec<Signal> {
    flagged.sort_by(|left, right| {
        let ordering = left.0.partial_cmp(&right.0).unwrap_or(Ordering::Equal);
        let ordering = if ascending { ordering } else { ordering.reverse() };
        ordering.then_with(|| left.1.client_code().cmp(right.1.client_code()))
    });
    flagged.into_iter().map(|(_, signal)| signal).collect()
}

/// Clients whose current-window revenue fell below the previous window.
/// Ranked by the `now/prev` ratio ascending: the biggest relative loss
/// comes first.
pub fn detect_revenue_drops(totals: &BTreeMap<ClientCode, ClientPeriodTotals>) -> Vec<Signal> {
    let mut flagged = Vec::new();

    for (code, entry) in totals {
        if entry.prev_revenue <= Decimal::ZERO || entry.now_revenue >= entry.prev_revenue {
            continue;
        }

        let prev = to_f64(entry.prev_revenue);
        let now = to_f64(entry.now_revenue);
        flagged.push((
            now / prev,
            Signal::RevenueDrop {
                client_code: code.clone(),
                client_name: entry.client_name.clone(),
                prev_revenue: entry.prev_revenue,
                now_revenue: entry.now_revenue,
                drop_percent: (now - prev) / prev * 100.0,
            },
        ));
    }

    rank_by(flagged, true)
}

/// Clients buying less often: the mean gap between purchase days grew.
/// Requires at least two distinct purchase days in each window. Ranked by
/// the interval ratio descending: the sharpest slowdown first.
pub fn detect_frequency_drops(totals: &BTreeMap<ClientCode, ClientPeriodTotals>) -> Vec<Signal> {
    let mut flagged = Vec::new();

    for (code, entry) in totals {
        let now_days = unique_days(&entry.now_dates);
        let prev_days = unique_days(&entry.prev_dates);
        let (Some(now_interval), Some(prev_interval)) =
            (average_interval_days(&now_days), average_interval_days(&prev_days))
        else {
            continue;
        };

        if now_interval <= prev_interval {
            continue;
        }

        flagged.push((
            now_interval / prev_interval,
            Signal::FrequencyDrop {
                client_code: code.clone(),
                client_name: entry.client_name.clone(),
                prev_interval_days: prev_interval,
                now_interval_days: now_interval,
                slowdown_percent: (now_interval - prev_interval) / prev_interval * 100.0,
            },
        ));
    }

    rank_by(flagged, false)
}

/// Clients whose mean order value shrank. Requires transactions in both
/// windows. Ranked by the `now/prev` average ratio ascending.
pub fn detect_avg_check_drops(totals: &BTreeMap<ClientCode, ClientPeriodTotals>) -> Vec<Signal> {
    let mut flagged = Vec::new();

    for (code, entry) in totals {
        let (Some(now_avg), Some(prev_avg)) = (entry.now_avg_check(), entry.prev_avg_check())
        else {
            continue;
        };

        if now_avg >= prev_avg || prev_avg <= Decimal::ZERO {
            continue;
        }

        let prev = to_f64(prev_avg);
        let now = to_f64(now_avg);
        flagged.push((
            now / prev,
            Signal::AvgCheckDrop {
                client_code: code.clone(),
                client_name: entry.client_name.clone(),
                prev_avg_check: prev_avg,
                now_avg_check: now_avg,
                drop_percent: (now - prev) / prev * 100.0,
            },
        ));
    }

    rank_by(flagged, true)
}

/// Clients overdue against their own purchase rhythm: project the next
/// purchase as `last unique day + mean interval` over all unique days in
/// both windows, and flag when the anchor has passed that date with no
/// purchase on or after it. Most overdue first.
pub fn detect_missed_forecasts(
    totals: &BTreeMap<ClientCode, ClientPeriodTotals>,
    anchor_day: NaiveDate,
) -> Vec<Signal> {
    let mut flagged = Vec::new();

    for (code, entry) in totals {
        let mut all_dates = entry.prev_dates.clone();
        all_dates.extend_from_slice(&entry.now_dates);
        let days = unique_days(&all_dates);

        let Some(avg_interval) = average_interval_days(&days) else {
            continue;
        };
        // unique_days guarantees a last element once the interval exists
        let Some(&last_purchase) = days.last() else {
            continue;
        };

        let forecast = last_purchase + Duration::days(avg_interval.round() as i64);
        let purchased_since_forecast = days.iter().any(|day| *day >= forecast);
        if forecast >= anchor_day || purchased_since_forecast {
            continue;
        }

        let days_past_forecast = (anchor_day - forecast).num_days();
        flagged.push((
            days_past_forecast as f64,
            Signal::MissedForecast {
                client_code: code.clone(),
                client_name: entry.client_name.clone(),
                last_purchase,
                forecast,
                avg_interval_days: avg_interval,
                days_past_forecast,
                days_since_last_purchase: (anchor_day - last_purchase).num_days(),
            },
        ));
    }

    rank_by(flagged, false)
}

/// All four detectors over one aggregate snapshot, concatenated in a fixed
/// kind order with each block keeping its own severity ranking.
pub fn detect_all(
    totals: &BTreeMap<ClientCode, ClientPeriodTotals>,
    anchor_day: NaiveDate,
) -> Vec<Signal> {
    let mut signals = detect_revenue_drops(totals);
    signals.extend(detect_frequency_drops(totals));
    signals.extend(detect_avg_check_drops(totals));
    signals.extend(detect_missed_forecasts(totals, anchor_day));
    signals
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{
        detect_avg_check_drops, detect_frequency_drops, detect_missed_forecasts,
        detect_revenue_drops,
    };
    use crate::analysis::aggregate::ClientPeriodTotals;
    use crate::analysis::signal::Signal;
    use crate::domain::sale::ClientCode;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn code(value: &str) -> ClientCode {
        ClientCode(value.to_string())
    }

    fn revenue_entry(now: i64, prev: i64) -> ClientPeriodTotals {
        ClientPeriodTotals {
            client_name: "client".to_string(),
            now_revenue: Decimal::new(now, 0),
            prev_revenue: Decimal::new(prev, 0),
            now_tx_count: 1,
            prev_tx_count: 1,
            ..ClientPeriodTotals::default()
        }
    }

    #[test]
    fn biggest_relative_revenue_loss_ranks_first() {
        let mut totals = BTreeMap::new();
        totals.insert(code("C-mild"), revenue_entry(900, 1000));
        totals.insert(code("C-steep"), revenue_entry(400, 1000));

        let signals = detect_revenue_drops(&totals);
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].client_code(), &code("C-steep"));
        let Signal::RevenueDrop { drop_percent, .. } = &signals[0] else {
            panic!("expected revenue drop");
        };
        assert!((drop_percent - (-60.0)).abs() < 1e-9);
    }

    #[test]
    fn growth_and_zero_previous_revenue_are_not_flagged() {
        let mut totals = BTreeMap::new();
        totals.insert(code("C-growing"), revenue_entry(1200, 1000));
        totals.insert(code("C-new"), revenue_entry(500, 0));

        assert!(detect_revenue_drops(&totals).is_empty());
    }

    #[test]
    fn frequency_detector_collapses_same_day_purchases() {
        let mut totals = BTreeMap::new();
        // Three purchases on two distinct days previously; duplicates must
        // not manufacture a zero-length interval.
        totals.insert(
            code("C-1"),
            ClientPeriodTotals {
                client_name: "client".to_string(),
                prev_dates: vec![day(1), day(1), day(5)],
                now_dates: vec![day(20), day(28)],
                ..ClientPeriodTotals::default()
            },
        );

        let signals = detect_frequency_drops(&totals);
        assert_eq!(signals.len(), 1);
        let Signal::FrequencyDrop { prev_interval_days, now_interval_days, slowdown_percent, .. } =
            &signals[0]
        else {
            panic!("expected frequency drop");
        };
        assert!((prev_interval_days - 4.0).abs() < 1e-9);
        assert!((now_interval_days - 8.0).abs() < 1e-9);
        assert!((slowdown_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn single_purchase_day_windows_are_excluded_from_frequency() {
        let mut totals = BTreeMap::new();
        totals.insert(
            code("C-1"),
            ClientPeriodTotals {
                prev_dates: vec![day(1), day(1)],
                now_dates: vec![day(20), day(25)],
                ..ClientPeriodTotals::default()
            },
        );

        assert!(detect_frequency_drops(&totals).is_empty());
    }

    #[test]
    fn shrinking_average_check_is_flagged_and_ranked() {
        let mut totals = BTreeMap::new();
        totals.insert(
            code("C-halved"),
            ClientPeriodTotals {
                now_revenue: Decimal::new(500, 0),
                prev_revenue: Decimal::new(1000, 0),
                now_tx_count: 1,
                prev_tx_count: 1,
                ..ClientPeriodTotals::default()
            },
        );
        totals.insert(
            code("C-dip"),
            ClientPeriodTotals {
                now_revenue: Decimal::new(1800, 0),
                prev_revenue: Decimal::new(1000, 0),
                now_tx_count: 2,
                prev_tx_count: 1,
                ..ClientPeriodTotals::default()
            },
        );

        let signals = detect_avg_check_drops(&totals);
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].client_code(), &code("C-halved"));
        let Signal::AvgCheckDrop { drop_percent, .. } = &signals[0] else {
            panic!("expected avg check drop");
        };
        assert!((drop_percent - (-50.0)).abs() < 1e-9);
    }

    #[test]
    fn empty_window_excludes_client_from_avg_check() {
        let mut totals = BTreeMap::new();
        totals.insert(
            code("C-1"),
            ClientPeriodTotals {
                prev_revenue: Decimal::new(1000, 0),
                prev_tx_count: 2,
                ..ClientPeriodTotals::default()
            },
        );

        assert!(detect_avg_check_drops(&totals).is_empty());
    }

    #[test]
    fn forecast_overdue_scenario_from_purchase_rhythm() {
        // Purchases on day 1 and day 11 (interval 10), anchor day 26, no
        // purchase since: forecast lands on day 21, five days before the
        // anchor, fifteen days after the last purchase.
        let mut totals = BTreeMap::new();
        totals.insert(
            code("C-1"),
            ClientPeriodTotals {
                client_name: "client".to_string(),
                prev_dates: vec![day(1)],
                now_dates: vec![day(11)],
                ..ClientPeriodTotals::default()
            },
        );

        let signals = detect_missed_forecasts(&totals, day(26));
        assert_eq!(signals.len(), 1);
        let Signal::MissedForecast {
            forecast,
            days_past_forecast,
            days_since_last_purchase,
            avg_interval_days,
            ..
        } = &signals[0]
        else {
            panic!("expected missed forecast");
        };
        assert_eq!(*forecast, day(21));
        assert_eq!(*days_past_forecast, 5);
        assert_eq!(*days_since_last_purchase, 15);
        assert!((avg_interval_days - 10.0).abs() < 1e-9);
    }

    #[test]
    fn forecast_still_in_the_future_is_not_flagged() {
        let mut totals = BTreeMap::new();
        totals.insert(
            code("C-1"),
            ClientPeriodTotals {
                prev_dates: vec![day(1)],
                now_dates: vec![day(11)],
                ..ClientPeriodTotals::default()
            },
        );

        assert!(detect_missed_forecasts(&totals, day(20)).is_empty());
        assert!(detect_missed_forecasts(&totals, day(21)).is_empty());
    }

    #[test]
    fn fewer_than_two_unique_days_excludes_from_forecast() {
        let mut totals = BTreeMap::new();
        totals.insert(
            code("C-1"),
            ClientPeriodTotals {
                now_dates: vec![day(11), day(11)],
                ..ClientPeriodTotals::default()
            },
        );

        assert!(detect_missed_forecasts(&totals, day(26)).is_empty());
    }

    #[test]
    fn most_overdue_forecast_ranks_first() {
        let mut totals = BTreeMap::new();
        totals.insert(
            code("C-fresh"),
            ClientPeriodTotals {
                prev_dates: vec![day(10)],
                now_dates: vec![day(20)],
                ..ClientPeriodTotals::default()
            },
        );
        totals.insert(
            code("C-stale"),
            ClientPeriodTotals {
                prev_dates: vec![day(1)],
                now_dates: vec![day(6)],
                ..ClientPeriodTotals::default()
            },
        );

        let signals = detect_missed_forecasts(&totals, day(31));
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].client_code(), &code("C-stale"));
    }
}
