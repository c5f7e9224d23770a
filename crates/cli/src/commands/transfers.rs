use serde::Serialize;

use salesradar_core::config::AppConfig;
use salesradar_core::transfers::{TransferEvent, TransferStatistics};

use super::{run_pass, CommandResult};
use crate::AnalysisArgs;

#[derive(Serialize)]
struct TransfersPayload {
    anchor: chrono::DateTime<chrono::Utc>,
    lookback_days: i64,
    events: Vec<TransferEvent>,
    statistics: TransferStatistics,
}

pub async fn run(args: &AnalysisArgs, config: &AppConfig) -> CommandResult {
    match run_pass(args, config).await {
        Ok(report) => CommandResult::data(TransfersPayload {
            anchor: report.anchor,
            lookback_days: report.lookback_days,
            events: report.transfers,
            statistics: report.transfer_stats,
        }),
        Err(error) => CommandResult::failure("transfers", "analysis", error.to_string(), 1),
    }
}
