use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientCode(pub String);

impl std::fmt::Display for ClientCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One transaction from the ledger. Immutable after ingestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub client_code: ClientCode,
    pub client_name: String,
    pub manager_name: String,
    pub date: DateTime<Utc>,
    pub revenue: Decimal,
    pub sphere: Option<String>,
    pub product: Option<String>,
}

/// Wire form of a sale as exported by the upstream ledger: revenue arrives as
/// locale-formatted text (decimal comma, space or NBSP thousands separators).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaleRecord {
    pub client_code: String,
    pub client_name: String,
    pub manager_name: String,
    pub date: DateTime<Utc>,
    pub revenue: String,
    #[serde(default)]
    pub sphere: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
}

impl Sale {
    pub fn from_record(record: SaleRecord) -> Self {
        Self {
            client_code: ClientCode(record.client_code),
            client_name: record.client_name,
            manager_name: record.manager_name.trim().to_string(),
            date: record.date,
            revenue: parse_revenue(&record.revenue),
            sphere: record.sphere,
            product: record.product,
        }
    }
}

/// Parse a locale-formatted revenue string. Whitespace (including NBSP
/// thousands separators) is stripped and a decimal comma becomes a dot.
/// Anything unparseable coerces to zero rather than failing the ingest.
pub fn parse_revenue(raw: &str) -> Decimal {
    let cleaned: String =
        raw.chars().filter(|ch| !ch.is_whitespace()).map(|ch| if ch == ',' { '.' } else { ch }).collect();

    cleaned.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}
