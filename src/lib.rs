//! VU Load Tester
//!
//! Drives a fixed pool of virtual users against one HTTP endpoint for a
//! fixed duration, aggregates latency and failure metrics in bounded
//! memory, and judges the run against user-declared thresholds.

pub mod app;
pub mod checks;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod logging;
pub mod models;
pub mod output;
pub mod runner;
pub mod scheduler;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use client::{HttpExecutor, RequestExecutor};
pub use error::{AppError, Result};
pub use evaluator::ThresholdEvaluator;
pub use models::{RequestSample, RunResult, TestConfig, ThresholdExpr, ThresholdOutcome, ThresholdStatus};
pub use output::{OutputFormatter, ResultReporter};
pub use scheduler::{RunHandle, Scheduler};
pub use stats::{LatencySketch, MetricSeries, MetricsCollector};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TARGET_URL: &str = "http://localhost:9001/";
    pub const DEFAULT_VUS: u32 = 1;
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(10);
    pub const DEFAULT_SLEEP: Duration = Duration::from_secs(1);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
    pub const DEFAULT_CHECK_STATUS: u16 = 200;
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Process exit code when at least one threshold did not pass
    pub const THRESHOLDS_FAILED_EXIT_CODE: i32 = 99;
}
