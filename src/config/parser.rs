//! Configuration parsing from scenario files, environment variables and CLI arguments

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::{CheckSpec, TestConfig, ThresholdExpr},
    types::format_duration,
};

/// Layers defaults, scenario file, environment and CLI into one `TestConfig`
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<TestConfig> {
        let mut config = match &self.cli.config {
            Some(path) => TestConfig::from_file(path)?,
            None => TestConfig::default(),
        };

        self.load_env_file()?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    fn load_env_file(&self) -> Result<()> {
        EnvManager::load_env_file(self.cli.debug)
    }

    fn apply_cli_overrides(&self, config: &mut TestConfig) -> Result<()> {
        let cli = &self.cli;

        if let Some(ref url) = cli.url {
            config.target_url = url.clone();
        }
        if let Some(vus) = cli.vus {
            config.vus = vus;
        }
        if let Some(duration) = cli.duration {
            config.duration = duration;
        }
        if let Some(sleep) = cli.sleep {
            config.sleep = sleep;
        }
        if let Some(timeout) = cli.timeout {
            config.request_timeout = timeout;
        }
        if let Some(grace) = cli.grace_period {
            config.grace_period = grace;
        }

        // Command-line thresholds replace the scenario file's set
        if !cli.thresholds.is_empty() {
            config.thresholds = cli
                .thresholds
                .iter()
                .map(|pair| ThresholdExpr::parse_pair(pair))
                .collect::<Result<Vec<_>>>()?;
        }

        if let Some(code) = cli.check_status {
            config.checks = vec![CheckSpec::status_is(code)];
        }

        if cli.summary_export.is_some() {
            config.summary_export = cli.summary_export.clone();
        }

        if cli.color {
            config.enable_color = true;
        } else if cli.no_color {
            config.enable_color = false;
        }

        // CLI flags only ever switch these on
        config.verbose |= cli.verbose;
        config.debug |= cli.debug;

        Ok(())
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<TestConfig> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &TestConfig) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Target URL: {}", config.target_url));
    summary.push(format!("VUs: {}", config.vus));
    summary.push(format!("Duration: {}", format_duration(config.duration)));
    summary.push(format!("Sleep: {}", format_duration(config.sleep)));
    summary.push(format!("Timeout: {}", format_duration(config.request_timeout)));
    summary.push(format!("Grace Period: {}", format_duration(config.grace_period)));
    summary.push(format!(
        "Thresholds: {}",
        if config.thresholds.is_empty() {
            "none".to_string()
        } else {
            config.thresholds.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        }
    ));
    summary.push(format!(
        "Checks: {}",
        config.checks.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
    ));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricName;
    use clap::Parser;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    // Tests below mutate the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const LOAD_VARS: [&str; 7] = [
        "LOAD_TARGET_URL",
        "LOAD_VUS",
        "LOAD_DURATION",
        "LOAD_SLEEP",
        "LOAD_TIMEOUT",
        "LOAD_GRACE_PERIOD",
        "ENABLE_COLOR",
    ];

    fn clear_env() {
        for var in LOAD_VARS {
            env::remove_var(var);
        }
    }

    fn parse(args: &[&str]) -> Result<TestConfig> {
        let mut argv = vec!["vlt"];
        argv.extend_from_slice(args);
        ConfigParser::new(Cli::parse_from(argv)).parse()
    }

    fn scenario(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cli_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = parse(&["--vus", "10", "--duration", "45s", "--timeout", "2s", "--no-color", "--verbose"]).unwrap();

        assert_eq!(config.vus, 10);
        assert_eq!(config.duration, Duration::from_secs(45));
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert!(!config.enable_color);
        assert!(config.verbose);
    }

    #[test]
    fn test_scenario_file_then_cli() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let file = scenario(
            r#"{
                "url": "http://localhost:9001/",
                "vus": 25,
                "duration": "30s",
                "thresholds": {
                    "http_req_duration": ["p(95)<500"],
                    "http_req_failed": ["rate<0.01"]
                }
            }"#,
        );
        let path = file.path().to_str().unwrap();

        let config = parse(&["-c", path]).unwrap();
        assert_eq!(config.vus, 25);
        assert_eq!(config.thresholds.len(), 2);
        assert_eq!(config.thresholds[0].metric, MetricName::HttpReqDuration);

        // CLI thresholds replace, they do not append
        let config = parse(&["-c", path, "--vus", "5", "--threshold", "checks:rate>0.99"]).unwrap();
        assert_eq!(config.vus, 5);
        assert_eq!(config.thresholds.len(), 1);
        assert_eq!(config.thresholds[0].metric, MetricName::Checks);
    }

    #[test]
    fn test_env_between_file_and_cli() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let file = scenario(r#"{"vus": 3, "duration": "10s"}"#);
        let path = file.path().to_str().unwrap();

        env::set_var("LOAD_VUS", "8");
        env::set_var("LOAD_DURATION", "1m");
        let config = parse(&["-c", path, "--duration", "20s"]);
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.vus, 8);
        assert_eq!(config.duration, Duration::from_secs(20));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let err = parse(&["--vus", "0"]).unwrap_err();
        assert_eq!(err.category(), "CONFIG");

        let err = parse(&["--threshold", "http_req_duration:p95<500"]).unwrap_err();
        assert_eq!(err.category(), "CONFIG");

        let err = parse(&["--threshold", "latency:p(95)<500"]).unwrap_err();
        assert_eq!(err.category(), "CONFIG");

        let err = parse(&["--url", "ftp://example.com/"]).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_missing_scenario_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let err = parse(&["-c", "/definitely/not/here.json"]).unwrap_err();
        assert_eq!(err.category(), "IO");
    }

    #[test]
    fn test_check_status_override() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = parse(&["--check-status", "204"]).unwrap();
        assert_eq!(config.checks, vec![CheckSpec::status_is(204)]);
    }

    #[test]
    fn test_config_summary() {
        let config = TestConfig {
            thresholds: vec![ThresholdExpr::parse("http_req_failed", "rate<0.01").unwrap()],
            ..Default::default()
        };
        let summary = display_config_summary(&config);

        assert!(summary.contains("Target URL: http://localhost:9001/"));
        assert!(summary.contains("Duration: 10s"));
        assert!(summary.contains("Thresholds: http_req_failed: rate<0.01"));
        assert!(summary.contains("Checks: status is 200"));
    }
}
