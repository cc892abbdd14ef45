//! Data models shared across the load tester

pub mod check;
pub mod config;
pub mod result;
pub mod sample;
pub mod threshold;

// Re-export main model types
pub use check::{CheckRule, CheckSpec};
pub use config::{TestConfig, MAX_VUS};
pub use result::{
    CheckSummary, LatencySummary, MetricsSummary, RunResult, RunStats, ThresholdOutcome, ThresholdStatus,
};
pub use sample::{CheckResult, ErrorKind, RequestSample, SampleError};
pub use threshold::{Aggregation, Comparator, MetricKind, MetricName, ThresholdExpr};
