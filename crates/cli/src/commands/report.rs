use salesradar_core::config::AppConfig;

use super::{run_pass, CommandResult};
use crate::AnalysisArgs;

pub async fn run(args: &AnalysisArgs, config: &AppConfig) -> CommandResult {
    match run_pass(args, config).await {
        Ok(report) => CommandResult::data(report),
        Err(error) => CommandResult::failure("report", "analysis", error.to_string(), 1),
    }
}
