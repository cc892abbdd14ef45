//! Configuration validation utilities and rules
//!
//! `TestConfig::validate` rejects configurations that cannot run. The
//! checks here flag configurations that will run but probably not the
//! way the user expects.

use crate::{
    error::Result,
    models::{MetricName, TestConfig},
    types::format_duration,
};
use std::collections::HashSet;

/// VU count above which a single process starts to strain
const HIGH_VU_COUNT: u32 = 1_000;

/// Configuration validator with advanced validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run the hard validation, then collect soft warnings
    pub fn validate_comprehensive(config: &TestConfig) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_load_shape(config));
        warnings.extend(Self::validate_timing(config));
        warnings.extend(Self::validate_thresholds(config));

        Ok(warnings)
    }

    fn validate_load_shape(config: &TestConfig) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.vus > HIGH_VU_COUNT {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "{} virtual users may exhaust local sockets or file descriptors",
                    config.vus
                ),
            ));
        }

        if config.sleep.is_zero() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "sleep is 0: virtual users will issue requests back to back".to_string(),
            ));
        }

        warnings
    }

    fn validate_timing(config: &TestConfig) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.request_timeout >= config.duration {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "timeout ({}) is not shorter than duration ({}); slow requests may never complete",
                    format_duration(config.request_timeout),
                    format_duration(config.duration)
                ),
            ));
        }

        if config.grace_period < config.request_timeout {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "requests still running {} after the deadline will be cancelled",
                    format_duration(config.grace_period)
                ),
            ));
        }

        warnings
    }

    fn validate_thresholds(config: &TestConfig) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.thresholds.is_empty() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "No thresholds defined; the run passes regardless of results".to_string(),
            ));
        }

        if config.checks.is_empty() && config.thresholds.iter().any(|t| t.metric == MetricName::Checks) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "checks thresholds are defined but no checks are configured; they will be indeterminate"
                    .to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for threshold in &config.thresholds {
            if !seen.insert(threshold.to_string()) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Duplicate threshold '{}'", threshold),
                ));
            }
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self) -> String {
        format!("[{}] {}", self.level.as_str(), self.message)
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &TestConfig) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
