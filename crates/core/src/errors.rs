use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("analysis period must cover at least one month, got {months}")]
    InvalidPeriod { months: u32 },
    #[error("lookback window must be positive, got {days} days")]
    InvalidLookback { days: i64 },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("data source failure: {0}")]
    Source(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}
