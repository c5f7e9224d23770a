use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Days per analysis month. Windows use fixed 30-day months so `current`
/// and `previous` are exactly equal in length and contiguous; calendar
/// months would make the two windows unequal.
pub const DAYS_PER_MONTH: i64 = 30;

/// Where a sale lands relative to the analysis anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowSlot {
    Current,
    Previous,
}

/// Two adjacent, disjoint comparison windows anchored at `anchor`:
/// `current = [anchor - P, anchor]`, `previous = [anchor - 2P, anchor - P)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub period_months: u32,
    pub anchor: DateTime<Utc>,
}

impl AnalysisWindow {
    pub fn new(period_months: u32, anchor: DateTime<Utc>) -> Self {
        Self { period_months, anchor }
    }

    pub fn period(&self) -> Duration {
        Duration::days(i64::from(self.period_months) * DAYS_PER_MONTH)
    }

    pub fn current_start(&self) -> DateTime<Utc> {
        self.anchor - self.period()
    }

    pub fn previous_start(&self) -> DateTime<Utc> {
        self.anchor - self.period() * 2
    }

    /// `previous` ends exactly where `current` begins.
    pub fn previous_end(&self) -> DateTime<Utc> {
        self.current_start()
    }

    /// Bucket a sale date. Future-dated sales and sales older than two
    /// periods fall outside both windows.
    pub fn bucket(&self, date: DateTime<Utc>) -> Option<WindowSlot> {
        let age = self.anchor - date;
        if age < Duration::zero() {
            None
        } else if age <= self.period() {
            Some(WindowSlot::Current)
        } else if age <= self.period() * 2 {
            Some(WindowSlot::Previous)
        } else {
            None
        }
    }
}
