//! Colored formatter with terminal color support

use super::formatter::{
    dotted, format_ms, format_observed, format_percent, threshold_symbol, FormattingOptions, OutputFormatter,
    PlainFormatter,
};
use crate::{
    error::Result,
    models::{MetricsSummary, RunResult, ThresholdOutcome, ThresholdStatus},
    types::format_duration,
};
use colored::*;
use std::fmt::Write as _;

/// Latency classification for color coding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatencyLevel {
    Fast,     // < 100ms
    Moderate, // 100-500ms
    Slow,     // 500-1000ms
    VerySlow, // > 1000ms
}

impl LatencyLevel {
    pub fn from_ms(time_ms: f64) -> Self {
        if time_ms < 100.0 {
            Self::Fast
        } else if time_ms < 500.0 {
            Self::Moderate
        } else if time_ms < 1000.0 {
            Self::Slow
        } else {
            Self::VerySlow
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Fast => Color::Green,
            Self::Moderate => Color::Cyan,
            Self::Slow => Color::Yellow,
            Self::VerySlow => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            plain_formatter: PlainFormatter::new(options.clone()),
            options,
            color_scheme,
        }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.options.enable_color {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn status_color(&self, status: ThresholdStatus) -> Color {
        match status {
            ThresholdStatus::Passed => self.color_scheme.success,
            ThresholdStatus::Failed => self.color_scheme.error,
            ThresholdStatus::Indeterminate => self.color_scheme.warning,
        }
    }

    fn latency(&self, value: f64) -> String {
        self.colorize(&format_ms(value), LatencyLevel::from_ms(value).color())
    }

    fn section(&self, title: &str) -> String {
        if self.options.enable_color {
            title.color(self.color_scheme.header).bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Check if terminal supports colors
    pub fn supports_color() -> bool {
        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }
        if std::env::var("FORCE_COLOR").is_ok() {
            return true;
        }
        std::env::var("TERM").map(|term| term != "dumb").unwrap_or(true)
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, result: &RunResult) -> Result<String> {
        if !self.options.enable_color {
            return self.plain_formatter.format_header(result);
        }
        let mut out = String::new();
        let title = format!("Load Test Summary (v{})", crate::VERSION);
        writeln!(out, "{}", title.color(self.color_scheme.header).bold())?;
        writeln!(out, "{}", "=".repeat(title.len()).color(self.color_scheme.muted))?;
        writeln!(out, "  target: {}", result.target_url.bold())?;
        write!(out, "  vus: {}  elapsed: {}", result.vus, format_duration(result.elapsed))?;
        Ok(out)
    }

    fn format_thresholds(&self, outcomes: &[ThresholdOutcome]) -> Result<String> {
        let mut out = self.section("THRESHOLDS");
        if outcomes.is_empty() {
            write!(out, "\n  {}", self.colorize("(none defined)", self.color_scheme.muted))?;
            return Ok(out);
        }
        for outcome in outcomes {
            let color = self.status_color(outcome.status);
            write!(
                out,
                "\n  {} {} {}  observed {}",
                self.colorize(threshold_symbol(outcome.status), color),
                outcome.threshold.metric,
                self.colorize(&outcome.threshold.source, color),
                format_observed(outcome)
            )?;
        }
        Ok(out)
    }

    fn format_totals(&self, result: &RunResult) -> Result<String> {
        let w = self.options.label_width;
        let s = &result.summary;
        let mut out = self.section("TOTALS");
        write!(out, "\n  {} {}", dotted("iterations", w), result.total_iterations)?;
        write!(out, "\n  {} {}", dotted("http_reqs", w), result.total_requests)?;
        if let Some(rate) = result.request_rate() {
            write!(out, " {}", self.colorize(&format!("({:.2}/s)", rate), self.color_scheme.muted))?;
        }
        let failed_color = if s.failed_requests == 0 {
            self.color_scheme.success
        } else {
            self.color_scheme.error
        };
        let failed = s
            .http_req_failed_rate
            .map(format_percent)
            .unwrap_or_else(|| "-".to_string());
        write!(
            out,
            "\n  {} {} ({} of {})",
            dotted("http_req_failed", w),
            self.colorize(&failed, failed_color),
            s.failed_requests,
            result.total_requests
        )?;
        if result.forced_cancellations > 0 {
            write!(
                out,
                "\n  {} {}",
                dotted("cancelled at stop", w),
                self.colorize(&result.forced_cancellations.to_string(), self.color_scheme.warning)
            )?;
        }
        Ok(out)
    }

    fn format_latency(&self, summary: &MetricsSummary) -> Result<String> {
        let mut out = self.section("HTTP_REQ_DURATION");
        match &summary.http_req_duration {
            None => write!(out, "\n  {}", self.colorize("(no responses received)", self.color_scheme.warning))?,
            Some(d) => write!(
                out,
                "\n  avg={} min={} med={} p(90)={} p(95)={} p(99)={} max={}",
                self.latency(d.avg),
                self.latency(d.min),
                self.latency(d.med),
                self.latency(d.p90),
                self.latency(d.p95),
                self.latency(d.p99),
                self.latency(d.max)
            )?,
        }
        Ok(out)
    }

    fn format_checks(&self, summary: &MetricsSummary) -> Result<String> {
        let mut out = self.section("CHECKS");
        if summary.checks.is_empty() {
            write!(out, "\n  {}", self.colorize("(none evaluated)", self.color_scheme.muted))?;
            return Ok(out);
        }
        for check in &summary.checks {
            let (symbol, color) = if check.fails == 0 {
                ("✓", self.color_scheme.success)
            } else {
                ("✗", self.color_scheme.error)
            };
            let rate = check.pass_rate().map(format_percent).unwrap_or_else(|| "-".to_string());
            write!(
                out,
                "\n  {} {}: {} ({} passed, {} failed)",
                self.colorize(symbol, color),
                check.name,
                self.colorize(&rate, color),
                check.passes,
                check.fails
            )?;
        }
        Ok(out)
    }

    fn format_breakdown(&self, summary: &MetricsSummary) -> Result<String> {
        let mut out = self.section("STATUS CODES");
        if summary.status_codes.is_empty() {
            write!(out, "\n  {}", self.colorize("(none)", self.color_scheme.muted))?;
        }
        for (code, count) in &summary.status_codes {
            let color = if (200..400).contains(code) {
                self.color_scheme.success
            } else {
                self.color_scheme.error
            };
            write!(out, "\n  {}: {}", self.colorize(&code.to_string(), color), count)?;
        }
        if !summary.errors.is_empty() {
            write!(out, "\n{}", self.section("ERRORS"))?;
            for (kind, count) in &summary.errors {
                write!(out, "\n  {}: {}", self.colorize(kind, self.color_scheme.error), count)?;
            }
        }
        Ok(out)
    }

    fn format_verdict(&self, result: &RunResult) -> Result<String> {
        let text = self.plain_formatter.format_verdict(result)?;
        let color = if result.overall_passed {
            self.color_scheme.success
        } else {
            self.color_scheme.error
        };
        if self.options.enable_color {
            Ok(text.color(color).bold().to_string())
        } else {
            Ok(text)
        }
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("⚠ {}", self.colorize(warning, self.color_scheme.warning)))
    }
}
