//! Declarative check definitions as written in scenario files

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Rule a check applies to a single sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRule {
    /// Response status equals this code
    Status(u16),
    /// Response status within `min..=max`
    StatusRange { min: u16, max: u16 },
    /// A response arrived within this many milliseconds
    MaxLatencyMs(u64),
    /// Response body has at least one byte
    BodyNotEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub name: String,
    pub rule: CheckRule,
}

impl CheckSpec {
    pub fn new<S: Into<String>>(name: S, rule: CheckRule) -> Self {
        Self {
            name: name.into(),
            rule,
        }
    }

    /// The `status is N` check
    pub fn status_is(code: u16) -> Self {
        Self::new(format!("status is {}", code), CheckRule::Status(code))
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::config("Check name cannot be empty"));
        }

        let valid_status = |code: u16| (100..=599).contains(&code);
        match &self.rule {
            CheckRule::Status(code) if !valid_status(*code) => Err(AppError::config(format!(
                "Check '{}': status {} is not a valid HTTP status",
                self.name, code
            ))),
            CheckRule::StatusRange { min, max } if !valid_status(*min) || !valid_status(*max) || min > max => {
                Err(AppError::config(format!(
                    "Check '{}': invalid status range {}..={}",
                    self.name, min, max
                )))
            }
            CheckRule::MaxLatencyMs(0) => Err(AppError::config(format!(
                "Check '{}': max_latency_ms must be greater than 0",
                self.name
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_name() {
        let check = CheckSpec::status_is(200);
        assert_eq!(check.name, "status is 200");
        assert_eq!(check.rule, CheckRule::Status(200));
        assert!(check.validate().is_ok());
    }

    #[test]
    fn test_rule_json_shape() {
        let checks: Vec<CheckSpec> = serde_json::from_str(
            r#"[
                {"name": "ok", "rule": {"status": 200}},
                {"name": "2xx", "rule": {"status_range": {"min": 200, "max": 299}}},
                {"name": "fast", "rule": {"max_latency_ms": 500}},
                {"name": "has body", "rule": "body_not_empty"}
            ]"#,
        )
        .unwrap();

        assert_eq!(checks[0].rule, CheckRule::Status(200));
        assert_eq!(checks[1].rule, CheckRule::StatusRange { min: 200, max: 299 });
        assert_eq!(checks[2].rule, CheckRule::MaxLatencyMs(500));
        assert_eq!(checks[3].rule, CheckRule::BodyNotEmpty);
    }

    #[test]
    fn test_validation_rejects_bad_rules() {
        assert!(CheckSpec::new("", CheckRule::BodyNotEmpty).validate().is_err());
        assert!(CheckSpec::new("x", CheckRule::Status(42)).validate().is_err());
        assert!(CheckSpec::new("x", CheckRule::StatusRange { min: 300, max: 200 })
            .validate()
            .is_err());
        assert!(CheckSpec::new("x", CheckRule::MaxLatencyMs(0)).validate().is_err());
    }
}
