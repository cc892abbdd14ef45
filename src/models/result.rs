//! Run outcome types shared by the evaluator and the reporter

use crate::models::threshold::ThresholdExpr;
use crate::types::duration_serde;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// What the scheduler observed about the run itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Virtual users spawned
    pub spawned: usize,
    /// Most virtual users running at the same instant
    pub peak_concurrency: usize,
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// In-flight requests abandoned at the hard stop
    pub forced_cancellations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStatus {
    Passed,
    Failed,
    /// The metric had no samples; counts as failed
    Indeterminate,
}

impl ThresholdStatus {
    pub fn is_pass(&self) -> bool {
        matches!(self, ThresholdStatus::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOutcome {
    pub threshold: ThresholdExpr,
    /// Aggregated value the bound was compared against
    pub observed: Option<f64>,
    pub status: ThresholdStatus,
}

impl ThresholdOutcome {
    pub fn passed(&self) -> bool {
        self.status.is_pass()
    }
}

/// Latency distribution in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub avg: f64,
    pub min: f64,
    pub med: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckSummary {
    pub fn pass_rate(&self) -> Option<f64> {
        let total = self.passes + self.fails;
        (total > 0).then(|| self.passes as f64 / total as f64)
    }
}

/// Aggregated view of every metric, for display and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub http_reqs: u64,
    pub iterations: u64,
    /// Requests counted by `http_req_failed`
    pub failed_requests: u64,
    /// Requests that received no response
    pub errored_requests: u64,
    pub http_req_failed_rate: Option<f64>,
    pub checks_rate: Option<f64>,
    /// `None` when no request received a response
    pub http_req_duration: Option<LatencySummary>,
    pub checks: Vec<CheckSummary>,
    pub status_codes: BTreeMap<u16, u64>,
    pub errors: BTreeMap<String, u64>,
}

/// Final verdict of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub target_url: String,
    pub vus: usize,
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    pub total_iterations: u64,
    pub total_requests: u64,
    pub forced_cancellations: usize,
    /// One outcome per threshold, in declaration order
    pub per_threshold: Vec<ThresholdOutcome>,
    /// True when every threshold passed (vacuously true with none)
    pub overall_passed: bool,
    pub summary: MetricsSummary,
}

impl RunResult {
    pub fn failed_thresholds(&self) -> impl Iterator<Item = &ThresholdOutcome> {
        self.per_threshold.iter().filter(|o| !o.passed())
    }

    /// Requests per second over the whole run
    pub fn request_rate(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.total_requests as f64 / secs)
    }
}
