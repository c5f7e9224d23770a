use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::FallbackPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub cache: CacheConfig,
    pub analytics: AnalyticsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Default comparison period when the filter context does not set one.
    pub period_months: u32,
    /// How far back transfer boundaries are reported.
    pub lookback_days: i64,
    /// Day spans for the transfer statistics buckets.
    pub stat_bucket_days: Vec<i64>,
    /// Visibility policy for clients missing from the manager directory.
    pub fallback: FallbackPolicy,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

/// Credentials for the upstream REST analytics endpoint. Consumed by the
/// transport layer, never by the engine itself.
#[derive(Clone, Debug)]
pub struct AnalyticsConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub period_months: Option<u32>,
    pub lookback_days: Option<i64>,
    pub fallback: Option<FallbackPolicy>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig {
                period_months: 3,
                lookback_days: 90,
                stat_bucket_days: vec![7, 30, 90],
                fallback: FallbackPolicy::default(),
            },
            cache: CacheConfig { ttl_secs: 300 },
            analytics: AnalyticsConfig { base_url: None, api_key: None },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for FallbackPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "legacy_manager_name" | "legacy" => Ok(Self::LegacyManagerName),
            "closed" => Ok(Self::Closed),
            other => Err(ConfigError::Validation(format!(
                "unsupported fallback policy `{other}` (expected legacy_manager_name|closed)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("salesradar.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(analysis) = patch.analysis {
            if let Some(period_months) = analysis.period_months {
                self.analysis.period_months = period_months;
            }
            if let Some(lookback_days) = analysis.lookback_days {
                self.analysis.lookback_days = lookback_days;
            }
            if let Some(stat_bucket_days) = analysis.stat_bucket_days {
                self.analysis.stat_bucket_days = stat_bucket_days;
            }
            if let Some(fallback) = analysis.fallback {
                self.analysis.fallback = fallback;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(ttl_secs) = cache.ttl_secs {
                self.cache.ttl_secs = ttl_secs;
            }
        }

        if let Some(analytics) = patch.analytics {
            if let Some(base_url) = analytics.base_url {
                self.analytics.base_url = Some(base_url);
            }
            if let Some(api_key_value) = analytics.api_key {
                self.analytics.api_key = Some(api_key_value.into());
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SALESRADAR_ANALYSIS_PERIOD_MONTHS") {
            self.analysis.period_months = parse_u32("SALESRADAR_ANALYSIS_PERIOD_MONTHS", &value)?;
        }
        if let Some(value) = read_env("SALESRADAR_ANALYSIS_LOOKBACK_DAYS") {
            self.analysis.lookback_days = parse_i64("SALESRADAR_ANALYSIS_LOOKBACK_DAYS", &value)?;
        }
        if let Some(value) = read_env("SALESRADAR_ANALYSIS_FALLBACK") {
            self.analysis.fallback = value.parse()?;
        }

        if let Some(value) = read_env("SALESRADAR_CACHE_TTL_SECS") {
            self.cache.ttl_secs = parse_u64("SALESRADAR_CACHE_TTL_SECS", &value)?;
        }

        if let Some(value) = read_env("SALESRADAR_ANALYTICS_BASE_URL") {
            self.analytics.base_url = Some(value);
        }
        if let Some(value) = read_env("SALESRADAR_ANALYTICS_API_KEY") {
            self.analytics.api_key = Some(value.into());
        }

        let log_level =
            read_env("SALESRADAR_LOGGING_LEVEL").or_else(|| read_env("SALESRADAR_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SALESRADAR_LOGGING_FORMAT").or_else(|| read_env("SALESRADAR_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(period_months) = overrides.period_months {
            self.analysis.period_months = period_months;
        }
        if let Some(lookback_days) = overrides.lookback_days {
            self.analysis.lookback_days = lookback_days;
        }
        if let Some(fallback) = overrides.fallback {
            self.analysis.fallback = fallback;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_analysis(&self.analysis)?;
        validate_cache(&self.cache)?;
        validate_analytics(&self.analytics)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("salesradar.toml"), PathBuf::from("config/salesradar.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), ConfigError> {
    if analysis.period_months == 0 || analysis.period_months > 24 {
        return Err(ConfigError::Validation(
            "analysis.period_months must be in range 1..=24".to_string(),
        ));
    }

    if analysis.lookback_days <= 0 || analysis.lookback_days > 730 {
        return Err(ConfigError::Validation(
            "analysis.lookback_days must be in range 1..=730".to_string(),
        ));
    }

    if analysis.stat_bucket_days.is_empty() {
        return Err(ConfigError::Validation(
            "analysis.stat_bucket_days must name at least one bucket".to_string(),
        ));
    }
    if analysis.stat_bucket_days.iter().any(|&days| days <= 0) {
        return Err(ConfigError::Validation(
            "analysis.stat_bucket_days entries must be positive".to_string(),
        ));
    }

    Ok(())
}

fn validate_cache(cache: &CacheConfig) -> Result<(), ConfigError> {
    if cache.ttl_secs == 0 || cache.ttl_secs > 86_400 {
        return Err(ConfigError::Validation(
            "cache.ttl_secs must be in range 1..=86400".to_string(),
        ));
    }

    Ok(())
}

fn validate_analytics(analytics: &AnalyticsConfig) -> Result<(), ConfigError> {
    if let Some(base_url) = &analytics.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "analytics.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if analytics.api_key.is_some() && analytics.base_url.is_none() {
        return Err(ConfigError::Validation(
            "analytics.api_key is set but analytics.base_url is missing".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    analysis: Option<AnalysisPatch>,
    cache: Option<CachePatch>,
    analytics: Option<AnalyticsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    period_months: Option<u32>,
    lookback_days: Option<i64>,
    stat_bucket_days: Option<Vec<i64>>,
    fallback: Option<FallbackPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyticsPatch {
    base_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::access::FallbackPolicy;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.analysis.period_months == 3, "default period should be 3 months")?;
        ensure(config.analysis.lookback_days == 90, "default lookback should be 90 days")?;
        ensure(
            config.analysis.fallback == FallbackPolicy::LegacyManagerName,
            "default fallback should be the legacy name path",
        )?;
        ensure(config.cache.ttl_secs == 300, "default cache ttl should be 5 minutes")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_ANALYTICS_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("salesradar.toml");
            fs::write(
                &path,
                r#"
[analytics]
base_url = "https://analytics.example.com"
api_key = "${TEST_ANALYTICS_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let api_key = config.analytics.api_key.as_ref().ok_or("api key should be set")?;
            ensure(
                api_key.expose_secret() == "key-from-env",
                "api key should be interpolated from environment",
            )
        })();

        clear_vars(&["TEST_ANALYTICS_KEY"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESRADAR_ANALYSIS_LOOKBACK_DAYS", "120");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("salesradar.toml");
            fs::write(
                &path,
                r#"
[analysis]
period_months = 6
lookback_days = 30

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    period_months: Some(12),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.analysis.period_months == 12, "override period should win")?;
            ensure(config.analysis.lookback_days == 120, "env lookback should beat the file")?;
            ensure(config.logging.level == "warn", "file log level should beat defaults")
        })();

        clear_vars(&["SALESRADAR_ANALYSIS_LOOKBACK_DAYS"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESRADAR_LOG_LEVEL", "debug");
        env::set_var("SALESRADAR_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "debug", "alias log level should apply")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "alias log format should apply",
            )
        })();

        clear_vars(&["SALESRADAR_LOG_LEVEL", "SALESRADAR_LOG_FORMAT"]);
        result
    }

    #[test]
    fn validation_rejects_zero_period() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESRADAR_ANALYSIS_PERIOD_MONTHS", "0");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("period_months")
            );
            ensure(has_message, "validation failure should mention period_months")
        })();

        clear_vars(&["SALESRADAR_ANALYSIS_PERIOD_MONTHS"]);
        result
    }

    #[test]
    fn api_key_without_base_url_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESRADAR_ANALYTICS_API_KEY", "stray-key");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected validation failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::Validation(ref message) if message.contains("base_url")),
                "validation failure should mention base_url",
            )
        })();

        clear_vars(&["SALESRADAR_ANALYTICS_API_KEY"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESRADAR_ANALYTICS_BASE_URL", "https://analytics.example.com");
        env::set_var("SALESRADAR_ANALYTICS_API_KEY", "super-secret-key");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("super-secret-key"), "debug output should not contain the key")
        })();

        clear_vars(&["SALESRADAR_ANALYTICS_BASE_URL", "SALESRADAR_ANALYTICS_API_KEY"]);
        result
    }

    #[test]
    fn fallback_policy_parses_from_config_strings() {
        assert_eq!(
            "legacy_manager_name".parse::<FallbackPolicy>().ok(),
            Some(FallbackPolicy::LegacyManagerName)
        );
        assert_eq!("closed".parse::<FallbackPolicy>().ok(), Some(FallbackPolicy::Closed));
        assert!("open_sesame".parse::<FallbackPolicy>().is_err());
    }
}
