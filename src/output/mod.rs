//! Result reporting
//!
//! Renders the end-of-run summary, optionally exports it as JSON, and
//! maps the verdict to a process exit code.

mod colored;
mod formatter;

pub use colored::{ColorScheme, ColoredFormatter, LatencyLevel};
pub use formatter::{FormattingOptions, OutputFormatter, PlainFormatter};

use crate::{
    error::{AppError, ErrorContext, Result},
    models::{RunResult, TestConfig},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let enable_color = enable_color && ColoredFormatter::supports_color();
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            ..Default::default()
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }
}

/// Prints the summary and decides the exit code
pub struct ResultReporter {
    formatter: Box<dyn OutputFormatter>,
    verbose: bool,
    summary_export: Option<PathBuf>,
}

impl ResultReporter {
    pub fn new(enable_color: bool, verbose: bool) -> Self {
        Self {
            formatter: OutputFormatterFactory::create_formatter(enable_color, verbose),
            verbose,
            summary_export: None,
        }
    }

    pub fn from_config(config: &TestConfig) -> Self {
        let mut reporter = Self::new(config.enable_color, config.verbose);
        reporter.summary_export = config.summary_export.clone();
        reporter
    }

    pub fn with_export<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.summary_export = Some(path.into());
        self
    }

    /// Full summary text
    pub fn render(&self, result: &RunResult) -> Result<String> {
        let f = &self.formatter;
        let mut sections = vec![
            f.format_header(result)?,
            f.format_thresholds(&result.per_threshold)?,
            f.format_totals(result)?,
            f.format_latency(&result.summary)?,
            f.format_checks(&result.summary)?,
        ];

        // Errors are always worth showing; status codes only on request
        if self.verbose || !result.summary.errors.is_empty() {
            sections.push(f.format_breakdown(&result.summary)?);
        }
        if result.forced_cancellations > 0 {
            sections.push(f.format_warning(&format!(
                "{} in-flight request(s) were cancelled when the grace period ran out",
                result.forced_cancellations
            ))?);
        }
        sections.push(f.format_verdict(result)?);

        Ok(sections.join("\n\n"))
    }

    /// Print the summary, write the export, and return the exit code
    pub fn report(&self, result: &RunResult) -> Result<ExitCode> {
        println!("{}", self.render(result)?);

        if let Some(path) = &self.summary_export {
            export_summary(result, path)?;
        }

        Ok(exit_code_for(result))
    }
}

/// Write the run result as pretty JSON
pub fn export_summary(result: &RunResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Cannot serialize run summary")?;
    std::fs::write(path, json)
        .map_err(|e| AppError::io(format!("Cannot write summary to {}: {}", path.display(), e)))
}

/// 0 when every threshold passed, the thresholds-failed code otherwise
pub fn exit_status_for(result: &RunResult) -> i32 {
    if result.overall_passed {
        0
    } else {
        crate::defaults::THRESHOLDS_FAILED_EXIT_CODE
    }
}

pub fn exit_code_for(result: &RunResult) -> ExitCode {
    ExitCode::from(exit_status_for(result) as u8)
}
