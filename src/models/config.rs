//! Test configuration data model and validation

use crate::models::check::CheckSpec;
use crate::models::threshold::{threshold_map_serde, ThresholdExpr};
use crate::types::{duration_serde, parse_duration, AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Most virtual users a single process will spawn
pub const MAX_VUS: u32 = 100_000;

/// Everything a load test run needs
///
/// The scenario-file shape follows the k6 options object:
/// `{"url": ..., "vus": 25, "duration": "30s", "thresholds": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    /// URL every virtual user requests
    #[serde(rename = "url", default = "default_target_url")]
    pub target_url: String,

    /// Number of concurrent virtual users
    #[serde(default = "default_vus")]
    pub vus: u32,

    /// Wall-clock length of the run
    #[serde(default = "default_duration", with = "duration_serde")]
    pub duration: Duration,

    /// Pause between iterations of one virtual user
    #[serde(default = "default_sleep", with = "duration_serde")]
    pub sleep: Duration,

    /// Per-request timeout
    #[serde(rename = "timeout", default = "default_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// How long in-flight requests may run past the deadline
    #[serde(rename = "gracePeriod", alias = "grace_period", default = "default_grace_period", with = "duration_serde")]
    pub grace_period: Duration,

    /// Pass/fail conditions, in declaration order
    #[serde(default, with = "threshold_map_serde")]
    pub thresholds: Vec<ThresholdExpr>,

    /// Named predicates evaluated against each response
    #[serde(default = "default_checks")]
    pub checks: Vec<CheckSpec>,

    /// Write the JSON summary here after the run
    #[serde(rename = "summaryExport", alias = "summary_export", default)]
    pub summary_export: Option<PathBuf>,

    #[serde(rename = "enableColor", alias = "enable_color", default = "default_enable_color")]
    pub enable_color: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub debug: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            vus: default_vus(),
            duration: default_duration(),
            sleep: default_sleep(),
            request_timeout: default_timeout(),
            grace_period: default_grace_period(),
            thresholds: Vec::new(),
            checks: default_checks(),
            summary_export: None,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl TestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a scenario file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(format!("Cannot read scenario file {}: {}", path.display(), e)))?;
        Self::from_json(&content)
            .map_err(|e| AppError::config(format!("Invalid scenario file {}: {}", path.display(), e)))
    }

    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.target_url.trim().is_empty() {
            return Err(AppError::config("Target URL cannot be empty"));
        }

        match url::Url::parse(&self.target_url) {
            Ok(parsed) => {
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!(
                        "Target URL must use http or https: {}",
                        self.target_url
                    )));
                }
                if parsed.host_str().is_none() {
                    return Err(AppError::config(format!("Target URL has no host: {}", self.target_url)));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!("Invalid target URL '{}': {}", self.target_url, e)));
            }
        }

        if self.vus == 0 {
            return Err(AppError::config("vus must be at least 1"));
        }

        if self.vus > MAX_VUS {
            return Err(AppError::config(format!("vus cannot exceed {}", MAX_VUS)));
        }

        if self.duration.is_zero() {
            return Err(AppError::config("duration must be greater than 0"));
        }

        if self.request_timeout.is_zero() {
            return Err(AppError::config("timeout must be greater than 0"));
        }

        for check in &self.checks {
            check.validate()?;
        }

        Ok(())
    }

    /// Merge `LOAD_*` environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("LOAD_TARGET_URL") {
            self.target_url = url.trim().to_string();
        }

        if let Ok(vus) = std::env::var("LOAD_VUS") {
            self.vus = vus
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid LOAD_VUS value '{}': {}", vus, e)))?;
        }

        self.duration = env_duration("LOAD_DURATION")?.unwrap_or(self.duration);
        self.sleep = env_duration("LOAD_SLEEP")?.unwrap_or(self.sleep);
        self.request_timeout = env_duration("LOAD_TIMEOUT")?.unwrap_or(self.request_timeout);
        self.grace_period = env_duration("LOAD_GRACE_PERIOD")?.unwrap_or(self.grace_period);

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }

    /// Deadline after which no new iteration starts
    pub fn soft_stop_after(&self) -> Duration {
        self.duration
    }

    /// Point after which in-flight requests are abandoned
    pub fn hard_stop_after(&self) -> Duration {
        self.duration + self.grace_period
    }
}

fn env_duration(name: &str) -> Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(value) => parse_duration(&value)
            .map(Some)
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", name, value, e))),
        Err(_) => Ok(None),
    }
}

// Default value functions for serde
fn default_target_url() -> String {
    crate::defaults::DEFAULT_TARGET_URL.to_string()
}

fn default_vus() -> u32 {
    crate::defaults::DEFAULT_VUS
}

fn default_duration() -> Duration {
    crate::defaults::DEFAULT_DURATION
}

fn default_sleep() -> Duration {
    crate::defaults::DEFAULT_SLEEP
}

fn default_timeout() -> Duration {
    crate::defaults::DEFAULT_TIMEOUT
}

fn default_grace_period() -> Duration {
    crate::defaults::DEFAULT_GRACE_PERIOD
}

fn default_checks() -> Vec<CheckSpec> {
    vec![CheckSpec::status_is(crate::defaults::DEFAULT_CHECK_STATUS)]
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::threshold::MetricName;

    #[test]
    fn test_default_config_is_valid() {
        let config = TestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sleep, Duration::from_secs(1));
        assert_eq!(config.checks, vec![CheckSpec::status_is(200)]);
        assert!(config.thresholds.is_empty());
    }

    #[test]
    fn test_zero_vus_invalid() {
        let config = TestConfig { vus: 0, ..Default::default() };
        let err = config.validate().unwrap_err();
        assert_eq!(err.category(), "CONFIG");
        assert!(err.to_string().contains("vus"));
    }

    #[test]
    fn test_zero_duration_invalid() {
        let config = TestConfig { duration: Duration::ZERO, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sleep_is_allowed() {
        let config = TestConfig { sleep: Duration::ZERO, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_target_urls() {
        for url in ["", "not-a-url", "ftp://example.com/", "http://"] {
            let config = TestConfig { target_url: url.to_string(), ..Default::default() };
            assert!(config.validate().is_err(), "expected '{}' to be rejected", url);
        }
    }

    #[test]
    fn test_k6_options_shape() {
        let config = TestConfig::from_json(
            r#"{
                "url": "http://host.docker.internal:9001/",
                "vus": 25,
                "duration": "30s",
                "thresholds": {
                    "http_req_duration": ["p(95)<500"],
                    "http_req_failed": ["rate<0.01"]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.vus, 25);
        assert_eq!(config.duration, Duration::from_secs(30));
        assert_eq!(config.sleep, Duration::from_secs(1));
        assert_eq!(config.thresholds.len(), 2);
        assert_eq!(config.thresholds[0].metric, MetricName::HttpReqDuration);
        assert_eq!(config.thresholds[1].metric, MetricName::HttpReqFailed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_optional_keys() {
        let config = TestConfig::from_json(
            r#"{
                "url": "http://localhost:9000/docs",
                "sleep": "250ms",
                "timeout": 2,
                "gracePeriod": "3s",
                "summaryExport": "summary.json",
                "checks": [{"name": "fast", "rule": {"max_latency_ms": 200}}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.sleep, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.grace_period, Duration::from_secs(3));
        assert_eq!(config.summary_export, Some(PathBuf::from("summary.json")));
        assert_eq!(config.checks.len(), 1);
        assert_eq!(config.hard_stop_after(), config.duration + Duration::from_secs(3));
    }

    #[test]
    fn test_bad_threshold_in_file_is_rejected() {
        let result = TestConfig::from_json(r#"{"thresholds": {"http_req_latency": ["p(95)<500"]}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_missing_file_is_io_error() {
        let err = TestConfig::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.category(), "IO");
    }

    #[test]
    fn test_serialized_config_reloads() {
        let mut config = TestConfig::default();
        config.thresholds.push(ThresholdExpr::parse("http_req_duration", "p(95)<500").unwrap());
        let json = serde_json::to_string(&config).unwrap();
        let reloaded = TestConfig::from_json(&json).unwrap();
        assert_eq!(reloaded.thresholds, config.thresholds);
        assert_eq!(reloaded.duration, config.duration);
    }
}
