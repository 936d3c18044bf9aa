//! Configuration structures.
//!
//! Configuration is loaded from an optional JSON file and then overridden by
//! `TOOLHUB_*` environment variables.

use crate::tools::health::HealthConfig;
use crate::types::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Global toolhub configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Dispatcher behaviour.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Name resolution thresholds.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Batch and retry defaults for orchestration.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Health tracking and circuit breaking.
    #[serde(default)]
    pub health: HealthConfig,
}

impl Config {
    /// Load configuration from a JSON file. Missing sections take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `TOOLHUB_*` overrides using the given variable lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("TOOLHUB_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("TOOLHUB_LOG_FORMAT") {
            self.observability.json_logs = format.eq_ignore_ascii_case("json");
        }
        if let Some(name) = lookup("TOOLHUB_HEALTH_TOOL") {
            self.dispatch.health_tool_name = name;
        }
        if let Some(flag) = lookup("TOOLHUB_LOG_REQUESTS") {
            self.dispatch.log_requests = parse_flag(&flag, "TOOLHUB_LOG_REQUESTS")?;
        }
        if let Some(flag) = lookup("TOOLHUB_CIRCUIT_BREAKER") {
            self.health.circuit_breaker_enabled =
                parse_flag(&flag, "TOOLHUB_CIRCUIT_BREAKER")?;
        }
        if let Some(raw) = lookup("TOOLHUB_BATCH_CONCURRENCY") {
            self.pipeline.batch_concurrency = raw.parse().map_err(|_| {
                Error::validation(format!("TOOLHUB_BATCH_CONCURRENCY is not a number: {raw}"))
            })?;
        }
        self.validate()
    }

    /// Reject configurations the core cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.health_tool_name.is_empty() {
            return Err(Error::validation("dispatch.health_tool_name cannot be empty"));
        }
        if self.pipeline.batch_concurrency == 0 {
            return Err(Error::validation("pipeline.batch_concurrency must be positive"));
        }
        if self.pipeline.retry_attempts == 0 {
            return Err(Error::validation("pipeline.retry_attempts must be positive"));
        }
        Ok(())
    }

    /// JSON schema of the configuration file.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(Config);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }
}

fn parse_flag(raw: &str, key: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::validation(format!("{key} is not a boolean: {raw}"))),
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DispatchConfig {
    /// Reserved tool name answered by the diagnostics responder.
    pub health_tool_name: String,

    /// Emit one structured log event per request.
    pub log_requests: bool,

    /// Validate arguments against the descriptor schema before invoking handlers.
    pub validate_arguments: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            health_tool_name: "__health".to_string(),
            log_requests: true,
            validate_arguments: true,
        }
    }
}

/// Name resolution thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolverConfig {
    /// Largest accepted edit distance for a fuzzy match.
    pub max_edit_distance: usize,

    /// Inputs shorter than this (in chars, after normalization) only match exactly.
    pub min_fuzzy_input_len: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_edit_distance: crate::tools::resolver::MAX_EDIT_DISTANCE,
            min_fuzzy_input_len: crate::tools::resolver::MIN_FUZZY_INPUT_LEN,
        }
    }
}

/// Orchestration defaults.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    /// Maximum batch items in flight.
    pub batch_concurrency: usize,

    /// Attempts made by the retry variant before giving up.
    pub retry_attempts: u32,

    /// Fixed delay between retry attempts.
    #[serde(with = "humantime_serde")]
    #[schemars(with = "String")]
    pub retry_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: 5,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dispatch.health_tool_name, "__health");
        assert_eq!(config.resolver.max_edit_distance, 2);
        assert_eq!(config.resolver.min_fuzzy_input_len, 4);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides(lookup(&[
                ("TOOLHUB_LOG_FORMAT", "JSON"),
                ("TOOLHUB_HEALTH_TOOL", "__status"),
                ("TOOLHUB_BATCH_CONCURRENCY", "8"),
                ("TOOLHUB_CIRCUIT_BREAKER", "on"),
            ]))
            .unwrap();

        assert!(config.observability.json_logs);
        assert_eq!(config.dispatch.health_tool_name, "__status");
        assert_eq!(config.pipeline.batch_concurrency, 8);
        assert!(config.health.circuit_breaker_enabled);
    }

    #[test]
    fn test_env_override_rejects_zero_concurrency() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(lookup(&[("TOOLHUB_BATCH_CONCURRENCY", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_override_rejects_bad_flag() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(lookup(&[("TOOLHUB_LOG_REQUESTS", "maybe")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = concat!(
            r#"{"pipeline": {"batch_concurrency": 2, "retry_attempts": 5, "#,
            r#""retry_delay": "250ms"}}"#,
        );
        write!(file, "{body}").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.pipeline.batch_concurrency, 2);
        assert_eq!(config.pipeline.retry_attempts, 5);
        assert_eq!(config.pipeline.retry_delay, Duration::from_millis(250));
        assert_eq!(config.dispatch.health_tool_name, "__health");
    }

    #[test]
    fn test_json_schema_lists_sections() {
        let schema = Config::json_schema();
        let props = schema.get("properties").unwrap();
        assert!(props.get("dispatch").is_some());
        assert!(props.get("pipeline").is_some());
    }
}
