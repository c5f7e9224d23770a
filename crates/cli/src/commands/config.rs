use serde::Serialize;

use salesradar_core::access::FallbackPolicy;
use salesradar_core::config::{AppConfig, LogFormat};

use super::CommandResult;

#[derive(Serialize)]
struct ConfigView {
    analysis: AnalysisView,
    cache: CacheView,
    analytics: AnalyticsView,
    logging: LoggingView,
}

#[derive(Serialize)]
struct AnalysisView {
    period_months: u32,
    lookback_days: i64,
    stat_bucket_days: Vec<i64>,
    fallback: FallbackPolicy,
}

#[derive(Serialize)]
struct CacheView {
    ttl_secs: u64,
}

#[derive(Serialize)]
struct AnalyticsView {
    base_url: Option<String>,
    api_key: &'static str,
}

#[derive(Serialize)]
struct LoggingView {
    level: String,
    format: LogFormat,
}

pub fn run(config: &AppConfig) -> CommandResult {
    CommandResult::data(ConfigView {
        analysis: AnalysisView {
            period_months: config.analysis.period_months,
            lookback_days: config.analysis.lookback_days,
            stat_bucket_days: config.analysis.stat_bucket_days.clone(),
            fallback: config.analysis.fallback,
        },
        cache: CacheView { ttl_secs: config.cache.ttl_secs },
        analytics: AnalyticsView {
            base_url: config.analytics.base_url.clone(),
            api_key: if config.analytics.api_key.is_some() { "<redacted>" } else { "<unset>" },
        },
        logging: LoggingView {
            level: config.logging.level.clone(),
            format: config.logging.format,
        },
    })
}

#[cfg(test)]
mod tests {
    use salesradar_core::config::AppConfig;

    use super::run;

    #[test]
    fn config_output_redacts_the_api_key() {
        let mut config = AppConfig::default();
        config.analytics.base_url = Some("https://analytics.example.com".to_string());
        config.analytics.api_key = Some("super-secret".to_string().into());

        let result = run(&config);

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("<redacted>"));
        assert!(!result.output.contains("super-secret"));
    }
}
