//! Core formatting trait and the plain text summary
//!
//! The end-of-run summary is built from sections; each formatter renders
//! every section, and the reporter stitches them together.

use crate::{
    error::Result,
    models::{MetricsSummary, RunResult, ThresholdOutcome, ThresholdStatus},
    types::format_duration,
};
use std::fmt::Write as _;

/// Renders the sections of an end-of-run summary
pub trait OutputFormatter {
    /// Title block with target and run shape
    fn format_header(&self, result: &RunResult) -> Result<String>;

    /// One line per threshold, in declaration order
    fn format_thresholds(&self, outcomes: &[ThresholdOutcome]) -> Result<String>;

    /// Request, iteration and failure totals
    fn format_totals(&self, result: &RunResult) -> Result<String>;

    /// `http_req_duration` distribution
    fn format_latency(&self, summary: &MetricsSummary) -> Result<String>;

    /// Per-check pass/fail counts
    fn format_checks(&self, summary: &MetricsSummary) -> Result<String>;

    /// Status code and error kind breakdown
    fn format_breakdown(&self, summary: &MetricsSummary) -> Result<String>;

    /// Final pass/fail line
    fn format_verdict(&self, result: &RunResult) -> Result<String>;

    fn format_warning(&self, warning: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    pub enable_color: bool,
    /// Include status code and error breakdowns
    pub verbose_mode: bool,
    /// Width of the dotted label column
    pub label_width: usize,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            label_width: 22,
        }
    }
}

/// Shared text helpers used by both formatters
pub(crate) fn dotted(label: &str, width: usize) -> String {
    let dots = width.saturating_sub(label.len()).max(2);
    format!("{}{}:", label, ".".repeat(dots))
}

pub(crate) fn format_ms(value: f64) -> String {
    if value >= 1000.0 {
        format!("{:.2}s", value / 1000.0)
    } else {
        format!("{:.2}ms", value)
    }
}

pub(crate) fn format_percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

pub(crate) fn format_observed(outcome: &ThresholdOutcome) -> String {
    match outcome.observed {
        None => "no samples".to_string(),
        Some(value) => match outcome.threshold.metric.kind() {
            crate::models::MetricKind::Rate => format!("{:.4}", value),
            _ => format!("{:.2}", value),
        },
    }
}

pub(crate) fn threshold_symbol(status: ThresholdStatus) -> &'static str {
    match status {
        ThresholdStatus::Passed => "✓",
        ThresholdStatus::Failed => "✗",
        ThresholdStatus::Indeterminate => "?",
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, result: &RunResult) -> Result<String> {
        let mut out = String::new();
        let title = format!("Load Test Summary (v{})", crate::VERSION);
        writeln!(out, "{}", title)?;
        writeln!(out, "{}", "=".repeat(title.len()))?;
        writeln!(out, "  target: {}", result.target_url)?;
        write!(out, "  vus: {}  elapsed: {}", result.vus, format_duration(result.elapsed))?;
        Ok(out)
    }

    fn format_thresholds(&self, outcomes: &[ThresholdOutcome]) -> Result<String> {
        let mut out = String::from("THRESHOLDS");
        if outcomes.is_empty() {
            out.push_str("\n  (none defined)");
            return Ok(out);
        }
        for outcome in outcomes {
            write!(
                out,
                "\n  {} {} {}  observed {}",
                threshold_symbol(outcome.status),
                outcome.threshold.metric,
                outcome.threshold.source,
                format_observed(outcome)
            )?;
        }
        Ok(out)
    }

    fn format_totals(&self, result: &RunResult) -> Result<String> {
        let w = self.options.label_width;
        let s = &result.summary;
        let mut out = String::from("TOTALS");
        write!(out, "\n  {} {}", dotted("iterations", w), result.total_iterations)?;
        write!(out, "\n  {} {}", dotted("http_reqs", w), result.total_requests)?;
        if let Some(rate) = result.request_rate() {
            write!(out, " ({:.2}/s)", rate)?;
        }
        let failed = s
            .http_req_failed_rate
            .map(format_percent)
            .unwrap_or_else(|| "-".to_string());
        write!(
            out,
            "\n  {} {} ({} of {})",
            dotted("http_req_failed", w),
            failed,
            s.failed_requests,
            result.total_requests
        )?;
        if result.forced_cancellations > 0 {
            write!(out, "\n  {} {}", dotted("cancelled at stop", w), result.forced_cancellations)?;
        }
        Ok(out)
    }

    fn format_latency(&self, summary: &MetricsSummary) -> Result<String> {
        let mut out = String::from("HTTP_REQ_DURATION");
        match &summary.http_req_duration {
            None => out.push_str("\n  (no responses received)"),
            Some(d) => write!(
                out,
                "\n  avg={} min={} med={} p(90)={} p(95)={} p(99)={} max={}",
                format_ms(d.avg),
                format_ms(d.min),
                format_ms(d.med),
                format_ms(d.p90),
                format_ms(d.p95),
                format_ms(d.p99),
                format_ms(d.max)
            )?,
        }
        Ok(out)
    }

    fn format_checks(&self, summary: &MetricsSummary) -> Result<String> {
        let mut out = String::from("CHECKS");
        if summary.checks.is_empty() {
            out.push_str("\n  (none evaluated)");
            return Ok(out);
        }
        for check in &summary.checks {
            let symbol = if check.fails == 0 { "✓" } else { "✗" };
            let rate = check.pass_rate().map(format_percent).unwrap_or_else(|| "-".to_string());
            write!(
                out,
                "\n  {} {}: {} ({} passed, {} failed)",
                symbol, check.name, rate, check.passes, check.fails
            )?;
        }
        Ok(out)
    }

    fn format_breakdown(&self, summary: &MetricsSummary) -> Result<String> {
        let mut out = String::from("STATUS CODES");
        if summary.status_codes.is_empty() {
            out.push_str("\n  (none)");
        }
        for (code, count) in &summary.status_codes {
            write!(out, "\n  {}: {}", code, count)?;
        }
        if !summary.errors.is_empty() {
            out.push_str("\nERRORS");
            for (kind, count) in &summary.errors {
                write!(out, "\n  {}: {}", kind, count)?;
            }
        }
        Ok(out)
    }

    fn format_verdict(&self, result: &RunResult) -> Result<String> {
        if result.overall_passed {
            Ok("RESULT: PASSED".to_string())
        } else {
            let failed = result.failed_thresholds().count();
            Ok(format!("RESULT: FAILED ({} of {} thresholds)", failed, result.per_threshold.len()))
        }
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{CheckSummary, LatencySummary, ThresholdExpr};
    use std::collections::BTreeMap;
    use std::time::Duration;

    pub(crate) fn sample_result(passed: bool) -> RunResult {
        let p95 = ThresholdExpr::parse("http_req_duration", "p(95)<500").unwrap();
        let failed = ThresholdExpr::parse("http_req_failed", "rate<0.01").unwrap();
        RunResult {
            target_url: "http://localhost:9001/".to_string(),
            vus: 25,
            elapsed: Duration::from_secs(30),
            total_iterations: 740,
            total_requests: 740,
            forced_cancellations: 0,
            per_threshold: vec![
                ThresholdOutcome { threshold: p95, observed: Some(51.2), status: ThresholdStatus::Passed },
                ThresholdOutcome {
                    threshold: failed,
                    observed: Some(if passed { 0.0 } else { 0.5 }),
                    status: if passed { ThresholdStatus::Passed } else { ThresholdStatus::Failed },
                },
            ],
            overall_passed: passed,
            summary: MetricsSummary {
                http_reqs: 740,
                iterations: 740,
                failed_requests: if passed { 0 } else { 370 },
                errored_requests: 0,
                http_req_failed_rate: Some(if passed { 0.0 } else { 0.5 }),
                checks_rate: Some(1.0),
                http_req_duration: Some(LatencySummary {
                    avg: 50.5,
                    min: 50.0,
                    med: 50.1,
                    p90: 51.0,
                    p95: 51.2,
                    p99: 55.0,
                    max: 1250.0,
                }),
                checks: vec![CheckSummary { name: "status is 200".to_string(), passes: 740, fails: 0 }],
                status_codes: BTreeMap::from([(200, 740)]),
                errors: BTreeMap::new(),
            },
        }
    }

    fn plain() -> PlainFormatter {
        PlainFormatter::new(FormattingOptions { enable_color: false, ..Default::default() })
    }

    #[test]
    fn test_helpers() {
        assert_eq!(format_ms(51.234), "51.23ms");
        assert_eq!(format_ms(1250.0), "1.25s");
        assert_eq!(format_percent(0.0123), "1.23%");
        assert!(dotted("http_reqs", 22).starts_with("http_reqs....."));
        assert!(dotted("a_very_long_label_beyond_width", 10).ends_with("..:"));
    }

    #[test]
    fn test_threshold_lines() {
        let result = sample_result(false);
        let out = plain().format_thresholds(&result.per_threshold).unwrap();
        assert!(out.contains("✓ http_req_duration p(95)<500  observed 51.20"));
        assert!(out.contains("✗ http_req_failed rate<0.01  observed 0.5000"));
    }

    #[test]
    fn test_indeterminate_line() {
        let outcome = ThresholdOutcome {
            threshold: ThresholdExpr::parse("http_req_duration", "p(95)<500").unwrap(),
            observed: None,
            status: ThresholdStatus::Indeterminate,
        };
        let out = plain().format_thresholds(&[outcome]).unwrap();
        assert!(out.contains("? http_req_duration p(95)<500  observed no samples"));
    }

    #[test]
    fn test_totals_and_latency() {
        let result = sample_result(true);
        let totals = plain().format_totals(&result).unwrap();
        assert!(totals.contains("740 (24.67/s)"));
        assert!(totals.contains("0.00% (0 of 740)"));

        let latency = plain().format_latency(&result.summary).unwrap();
        assert!(latency.contains("p(95)=51.20ms"));
        assert!(latency.contains("max=1.25s"));
    }

    #[test]
    fn test_verdicts() {
        assert_eq!(plain().format_verdict(&sample_result(true)).unwrap(), "RESULT: PASSED");
        assert_eq!(
            plain().format_verdict(&sample_result(false)).unwrap(),
            "RESULT: FAILED (1 of 2 thresholds)"
        );
    }
}
