//! Threshold evaluation over a finished run

use crate::logging::Logger;
use crate::models::{
    Aggregation, MetricKind, MetricName, RunResult, RunStats, ThresholdExpr, ThresholdOutcome, ThresholdStatus,
};
use crate::stats::{MetricSeries, RateCounter};

pub struct ThresholdEvaluator {
    logger: Logger,
}

impl ThresholdEvaluator {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Evaluate every threshold, in order, and assemble the run result
    pub fn evaluate(&self, series: &MetricSeries, thresholds: &[ThresholdExpr], run: &RunStats) -> RunResult {
        self.evaluate_for(series, thresholds, run, "")
    }

    /// Same as `evaluate`, recording the target URL in the result
    pub fn evaluate_for(
        &self,
        series: &MetricSeries,
        thresholds: &[ThresholdExpr],
        run: &RunStats,
        target_url: &str,
    ) -> RunResult {
        let per_threshold: Vec<ThresholdOutcome> = thresholds
            .iter()
            .map(|threshold| self.evaluate_one(series, threshold, run))
            .collect();

        let overall_passed = per_threshold.iter().all(ThresholdOutcome::passed);

        RunResult {
            target_url: target_url.to_string(),
            vus: run.spawned,
            elapsed: run.elapsed,
            total_iterations: series.iterations,
            total_requests: series.http_reqs,
            forced_cancellations: run.forced_cancellations,
            per_threshold,
            overall_passed,
            summary: series.summary(),
        }
    }

    fn evaluate_one(&self, series: &MetricSeries, threshold: &ThresholdExpr, run: &RunStats) -> ThresholdOutcome {
        let observed = observe(series, threshold, run);
        let status = match observed {
            Some(value) if threshold.holds_for(value) => ThresholdStatus::Passed,
            Some(_) => ThresholdStatus::Failed,
            None => {
                self.logger
                    .warn(&format!("Threshold '{}' is indeterminate: no samples recorded", threshold))
                    .field("metric", threshold.metric.as_str())
                    .log();
                ThresholdStatus::Indeterminate
            }
        };

        self.logger
            .debug("Threshold evaluated")
            .field("threshold", threshold.to_string())
            .field("observed", observed)
            .field("status", status)
            .log();

        ThresholdOutcome {
            threshold: threshold.clone(),
            observed,
            status,
        }
    }
}

/// Sample count behind a metric
fn sample_count(series: &MetricSeries, metric: MetricName) -> u64 {
    match metric {
        MetricName::HttpReqDuration => series.http_req_duration.len(),
        MetricName::HttpReqFailed => series.http_req_failed.total,
        MetricName::Checks => series.checks.total,
        MetricName::HttpReqs => series.http_reqs,
        MetricName::Iterations => series.iterations,
    }
}

fn rate_counter(series: &MetricSeries, metric: MetricName) -> Option<&RateCounter> {
    match metric {
        MetricName::HttpReqFailed => Some(&series.http_req_failed),
        MetricName::Checks => Some(&series.checks),
        _ => None,
    }
}

/// Aggregate the metric a threshold refers to; `None` when it has no samples
pub fn observe(series: &MetricSeries, threshold: &ThresholdExpr, run: &RunStats) -> Option<f64> {
    let metric = threshold.metric;
    let count = sample_count(series, metric);
    if count == 0 {
        return None;
    }

    match (metric.kind(), threshold.aggregation) {
        (MetricKind::Trend, aggregation) => {
            let sketch = &series.http_req_duration;
            match aggregation {
                Aggregation::Percentile(p) => sketch.percentile_ms(p),
                Aggregation::Avg => sketch.mean_ms(),
                Aggregation::Min => sketch.min_ms(),
                Aggregation::Max => sketch.max_ms(),
                Aggregation::Med => sketch.median_ms(),
                Aggregation::Count => Some(count as f64),
                Aggregation::Rate => None,
            }
        }
        (MetricKind::Rate, Aggregation::Rate) => rate_counter(series, metric).and_then(RateCounter::rate),
        (MetricKind::Rate, Aggregation::Count) => rate_counter(series, metric).map(|c| c.hits as f64),
        (MetricKind::Counter, Aggregation::Count) => Some(count as f64),
        (MetricKind::Counter, Aggregation::Rate) => {
            let secs = run.elapsed.as_secs_f64();
            (secs > 0.0).then(|| count as f64 / secs)
        }
        _ => None,
    }
}
