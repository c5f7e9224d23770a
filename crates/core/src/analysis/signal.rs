use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::sale::ClientCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    RevenueDrop,
    FrequencyDrop,
    AvgCheckDrop,
    MissedForecast,
}

/// A flagged behavioral anomaly for one client. Every variant carries the
/// raw aggregate it was derived from, so a signal can be re-checked without
/// access to detector internals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    RevenueDrop {
        client_code: ClientCode,
        client_name: String,
        prev_revenue: Decimal,
        now_revenue: Decimal,
        /// `(now - prev) / prev * 100`, negative for a drop.
        drop_percent: f64,
    },
    FrequencyDrop {
        client_code: ClientCode,
        client_name: String,
        prev_interval_days: f64,
        now_interval_days: f64,
        /// How much the purchase rhythm slowed, in percent of the previous
        /// interval.
        slowdown_percent: f64,
    },
    AvgCheckDrop {
        client_code: ClientCode,
        client_name: String,
        prev_avg_check: Decimal,
        now_avg_check: Decimal,
        drop_percent: f64,
    },
    MissedForecast {
        client_code: ClientCode,
        client_name: String,
        last_purchase: NaiveDate,
        forecast: NaiveDate,
        avg_interval_days: f64,
        /// Days the anchor sits past the forecast date.
        days_past_forecast: i64,
        /// Days since the client last purchased at all.
        days_since_last_purchase: i64,
    },
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::RevenueDrop { .. } => SignalKind::RevenueDrop,
            Self::FrequencyDrop { .. } => SignalKind::FrequencyDrop,
            Self::AvgCheckDrop { .. } => SignalKind::AvgCheckDrop,
            Self::MissedForecast { .. } => SignalKind::MissedForecast,
        }
    }

    pub fn client_code(&self) -> &ClientCode {
        match self {
            Self::RevenueDrop { client_code, .. }
            | Self::FrequencyDrop { client_code, .. }
            | Self::AvgCheckDrop { client_code, .. }
            | Self::MissedForecast { client_code, .. } => client_code,
        }
    }

    pub fn client_name(&self) -> &str {
        match self {
            Self::RevenueDrop { client_name, .. }
            | Self::FrequencyDrop { client_name, .. }
            | Self::AvgCheckDrop { client_name, .. }
            | Self::MissedForecast { client_name, .. } => client_name,
        }
    }
}
