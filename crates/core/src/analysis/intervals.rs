//! Purchase-rhythm arithmetic shared by the frequency and forecast
//! detectors.

use chrono::NaiveDate;

/// Collapse purchase timestamps to unique calendar days, ascending. Two
/// purchases on the same day are one day of purchasing activity.
pub fn unique_days(dates: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = dates.to_vec();
    days.sort_unstable();
    days.dedup();
    days
}

/// Mean gap in days between consecutive unique purchase days. `None` when
/// fewer than two unique days exist; callers exclude such clients instead
/// of flagging them.
pub fn average_interval_days(days: &[NaiveDate]) -> Option<f64> {
    if days.len() < 2 {
        return None;
    }

    let total_gap: i64 = days.windows(2).map(|pair| (pair[1] - pair[0]).num_days()).sum();
    Some(total_gap as f64 / (days.len() - 1) as f64)
}
