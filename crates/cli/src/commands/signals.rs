use serde::Serialize;

use salesradar_core::analysis::signal::Signal;
use salesradar_core::config::AppConfig;

use super::{run_pass, CommandResult};
use crate::AnalysisArgs;

#[derive(Serialize)]
struct SignalsPayload {
    anchor: chrono::DateTime<chrono::Utc>,
    period_months: u32,
    signal_count: usize,
    signals: Vec<Signal>,
}

pub async fn run(args: &AnalysisArgs, config: &AppConfig) -> CommandResult {
    match run_pass(args, config).await {
        Ok(report) => CommandResult::data(SignalsPayload {
            anchor: report.anchor,
            period_months: report.period_months,
            signal_count: report.signals.len(),
            signals: report.signals,
        }),
        Err(error) => CommandResult::failure("signals", "analysis", error.to_string(), 1),
    }
}
