pub mod config;
pub mod recommend;
pub mod report;
pub mod signals;
pub mod transfers;

use std::sync::Arc;

use serde::Serialize;

use salesradar_core::access::AccessContext;
use salesradar_core::config::AppConfig;
use salesradar_core::domain::filter::FilterContext;
use salesradar_core::pipeline::{run_analysis, AnalysisReport, AnalysisRequest};
use salesradar_data::{
    CachedDataProvider, DataProviderConfig, InMemoryActionRecordSource, InMemoryDirectorySource,
    InMemoryEmployeeSource, InMemorySalesSource,
};

use crate::fixtures;
use crate::AnalysisArgs;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn data(payload: impl Serialize) -> Self {
        match serde_json::to_string_pretty(&payload) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure("output", "serialization", error.to_string(), 1),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Load fixtures, snapshot them through the cached provider, and run one
/// analysis pass with the argument/configuration defaults resolved.
pub(crate) async fn run_pass(
    args: &AnalysisArgs,
    config: &AppConfig,
) -> anyhow::Result<AnalysisReport> {
    let fixture_set = fixtures::load(&args.fixtures)?;

    let provider = CachedDataProvider::new(
        DataProviderConfig { ttl: std::time::Duration::from_secs(config.cache.ttl_secs) },
        Arc::new(InMemorySalesSource::new(fixture_set.sales)),
        Arc::new(InMemoryDirectorySource::new(fixture_set.directory)),
        Arc::new(InMemoryEmployeeSource::new(fixture_set.employees)),
        Arc::new(InMemoryActionRecordSource::new(fixture_set.actions)),
    );
    let inputs = provider.snapshot().await;

    let context = match &args.as_employee {
        None => AccessContext::admin("cli-operator"),
        Some(employee_id) => {
            let employee = inputs
                .employees
                .iter()
                .find(|employee| employee.id.0 == *employee_id)
                .cloned()
                .ok_or_else(|| {
                    anyhow::anyhow!("employee `{employee_id}` was not found in the fixtures")
                })?;
            AccessContext::derive(format!("cli:{employee_id}"), Some(employee), false)
        }
    };

    let request = AnalysisRequest {
        context,
        filter: FilterContext::for_period(
            args.period.unwrap_or(config.analysis.period_months),
        ),
        anchor: args.anchor.unwrap_or_else(chrono::Utc::now),
        lookback_days: args.lookback.unwrap_or(config.analysis.lookback_days),
        stat_bucket_days: config.analysis.stat_bucket_days.clone(),
        fallback: config.analysis.fallback,
    };

    Ok(run_analysis(&inputs, &request)?)
}
