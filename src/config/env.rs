//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::models::MAX_VUS;
use crate::types::parse_duration;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                eprintln!("Loaded configuration from .env file");
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# VU Load Tester Configuration
#
# Values here override scenario-file settings and are themselves
# overridden by command-line arguments.

# URL every virtual user requests
# LOAD_TARGET_URL=http://localhost:9001/

# Number of concurrent virtual users
# LOAD_VUS=25

# Test duration (e.g. 30s, 2m, 1m30s)
# LOAD_DURATION=30s

# Pause between iterations of one virtual user
# LOAD_SLEEP=1s

# Per-request timeout
# LOAD_TIMEOUT=10s

# How long in-flight requests may finish after the deadline
# LOAD_GRACE_PERIOD=5s

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::io(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "LOAD_TARGET_URL" => {
                let parsed = url::Url::parse(value.trim())
                    .map_err(|e| AppError::config(format!("Invalid LOAD_TARGET_URL '{}': {}", value, e)))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!("LOAD_TARGET_URL must use http or https: {}", value)));
                }
            }
            "LOAD_VUS" => {
                let vus: u32 = value
                    .trim()
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid LOAD_VUS value '{}': {}", value, e)))?;
                if vus == 0 || vus > MAX_VUS {
                    return Err(AppError::config(format!("LOAD_VUS must be between 1 and {}, got: {}", MAX_VUS, vus)));
                }
            }
            "LOAD_DURATION" | "LOAD_TIMEOUT" => {
                let duration = parse_duration(value)
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if duration.is_zero() {
                    return Err(AppError::config(format!("{} must be greater than 0", key)));
                }
            }
            "LOAD_SLEEP" | "LOAD_GRACE_PERIOD" => {
                parse_duration(value)
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "ENABLE_COLOR" => {
                value
                    .trim()
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("LOAD_TARGET_URL", "URL every virtual user requests", "http://localhost:9001/"),
            ("LOAD_VUS", "Number of concurrent virtual users", "25"),
            ("LOAD_DURATION", "Test duration", "30s"),
            ("LOAD_SLEEP", "Pause between iterations", "1s"),
            ("LOAD_TIMEOUT", "Per-request timeout", "10s"),
            ("LOAD_GRACE_PERIOD", "In-flight allowance after the deadline", "5s"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::from("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<18} {}\n", var, description));
            help.push_str(&format!("  {:<18} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables and .env file\n");
        help.push_str("  3. Scenario file\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value).err().map(|e| format!("Warning: {}", e))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_env_var_validation() {
        assert!(EnvManager::validate_env_var("LOAD_TARGET_URL", "http://localhost:9001/").is_ok());
        assert!(EnvManager::validate_env_var("LOAD_VUS", "25").is_ok());
        assert!(EnvManager::validate_env_var("LOAD_DURATION", "1m30s").is_ok());
        assert!(EnvManager::validate_env_var("LOAD_SLEEP", "0s").is_ok());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "false").is_ok());
        assert!(EnvManager::validate_env_var("SOMETHING_ELSE", "whatever").is_ok());

        assert!(EnvManager::validate_env_var("LOAD_TARGET_URL", "ftp://example.com").is_err());
        assert!(EnvManager::validate_env_var("LOAD_TARGET_URL", "not a url").is_err());
        assert!(EnvManager::validate_env_var("LOAD_VUS", "0").is_err());
        assert!(EnvManager::validate_env_var("LOAD_VUS", "many").is_err());
        assert!(EnvManager::validate_env_var("LOAD_DURATION", "0s").is_err());
        assert!(EnvManager::validate_env_var("LOAD_TIMEOUT", "fast").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "maybe").is_err());
    }

    #[test]
    fn test_example_env_content() {
        let content = EnvManager::create_example_env_content();
        for (name, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(&format!("{}=", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_save_example_env_file() {
        let temp_file = NamedTempFile::new().unwrap();
        EnvManager::save_example_env_file(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("VU Load Tester Configuration"));
    }

    #[test]
    fn test_env_help_lists_priority() {
        let help = EnvManager::display_env_help();
        assert!(help.contains("LOAD_VUS"));
        assert!(help.contains("1. Command-line arguments"));
    }
}
