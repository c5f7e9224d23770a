use serde::Serialize;

use salesradar_core::config::AppConfig;
use salesradar_core::recommend::Recommendation;

use super::{run_pass, CommandResult};
use crate::AnalysisArgs;

#[derive(Serialize)]
struct RecommendPayload {
    anchor: chrono::DateTime<chrono::Utc>,
    recommendation_count: usize,
    recommendations: Vec<Recommendation>,
}

pub async fn run(args: &AnalysisArgs, config: &AppConfig) -> CommandResult {
    match run_pass(args, config).await {
        Ok(report) => CommandResult::data(RecommendPayload {
            anchor: report.anchor,
            recommendation_count: report.recommendations.len(),
            recommendations: report.recommendations,
        }),
        Err(error) => CommandResult::failure("recommend", "analysis", error.to_string(), 1),
    }
}
