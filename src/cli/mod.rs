//! Command-line interface

use crate::output::ColoredFormatter;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// VU Load Tester - drive a fixed pool of virtual users against one URL
#[derive(Parser, Debug, Clone)]
#[command(name = "vlt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON scenario file (url, vus, duration, thresholds, checks, ...)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Target URL every virtual user requests
    #[arg(long)]
    pub url: Option<String>,

    /// Number of concurrent virtual users
    #[arg(short = 'u', long)]
    pub vus: Option<u32>,

    /// Test duration, e.g. "30s", "2m", "1m30s"
    #[arg(short, long, value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Pause between iterations of one virtual user
    #[arg(long, value_parser = parse_duration_arg)]
    pub sleep: Option<Duration>,

    /// Per-request timeout
    #[arg(short, long, value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// How long in-flight requests may finish after the deadline
    #[arg(long, value_parser = parse_duration_arg)]
    pub grace_period: Option<Duration>,

    /// Threshold as METRIC:EXPR, e.g. "http_req_duration:p(95)<500" (repeatable)
    #[arg(long = "threshold", value_name = "METRIC:EXPR", action = ArgAction::Append)]
    pub thresholds: Vec<String>,

    /// Replace the default check with "status is N"
    #[arg(long, value_name = "CODE")]
    pub check_status: Option<u16>,

    /// Write the JSON summary to this file
    #[arg(long, value_name = "FILE")]
    pub summary_export: Option<PathBuf>,

    /// Write an example .env file to this path and exit
    #[arg(long, value_name = "FILE")]
    pub init_env: Option<PathBuf>,

    /// Force colored output
    #[arg(long, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            ColoredFormatter::supports_color()
        }
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::from("Command-line overrides:\n");

        if let Some(ref path) = self.config {
            summary.push_str(&format!("  Scenario file: {}\n", path.display()));
        }
        if let Some(ref url) = self.url {
            summary.push_str(&format!("  URL: {}\n", url));
        }
        if let Some(vus) = self.vus {
            summary.push_str(&format!("  VUs: {}\n", vus));
        }
        if let Some(duration) = self.duration {
            summary.push_str(&format!("  Duration: {}\n", crate::types::format_duration(duration)));
        }
        for threshold in &self.thresholds {
            summary.push_str(&format!("  Threshold: {}\n", threshold));
        }
        summary.push_str(&format!("  Colored output: {}\n", self.use_colors()));
        summary.push_str(&format!("  Verbose mode: {}\n", self.verbose));
        summary.push_str(&format!("  Debug mode: {}\n", self.debug));

        summary
    }
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    crate::types::parse_duration(s).map_err(|e| e.to_string())
}
