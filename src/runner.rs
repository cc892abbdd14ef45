//! Virtual user loop

use crate::checks::{run_checks, Check};
use crate::client::RequestExecutor;
use crate::logging::Logger;
use crate::models::RequestSample;
use crate::stats::MetricsCollector;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Signals shared by every virtual user of a run
#[derive(Debug, Clone)]
pub struct StopSignals {
    /// Deadline reached: finish the current request, start nothing new
    pub soft: CancellationToken,
    /// Grace period over: abandon the in-flight request
    pub hard: CancellationToken,
}

impl StopSignals {
    pub fn new() -> Self {
        Self {
            soft: CancellationToken::new(),
            hard: CancellationToken::new(),
        }
    }
}

impl Default for StopSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Live/peak count of running virtual users
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// What a virtual user did before it exited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VuReport {
    pub vu_id: usize,
    /// Requests submitted, including a cancelled one
    pub requests: u64,
    /// Exited because the hard stop cut a request short
    pub cancelled: bool,
}

/// One simulated client issuing requests in a loop
pub struct VirtualUser {
    pub id: usize,
    pub url: Arc<str>,
    pub sleep: Duration,
    pub executor: Arc<dyn RequestExecutor>,
    pub checks: Arc<[Check]>,
    pub collector: Arc<MetricsCollector>,
    pub signals: StopSignals,
    pub gauge: Arc<ConcurrencyGauge>,
    pub logger: Logger,
}

impl VirtualUser {
    /// Iterate until stopped: request, check, submit, sleep
    pub async fn run(self) -> VuReport {
        self.gauge.enter();
        let mut report = VuReport {
            vu_id: self.id,
            requests: 0,
            cancelled: false,
        };

        while !self.signals.soft.is_cancelled() {
            let started_at = Utc::now();
            let start = Instant::now();

            let mut sample = tokio::select! {
                biased;
                _ = self.signals.hard.cancelled() => {
                    self.collector.submit(RequestSample::cancelled(self.id, started_at, start.elapsed()));
                    report.requests += 1;
                    report.cancelled = true;
                    self.logger
                        .warn("In-flight request cancelled after grace period")
                        .field("vu", self.id)
                        .log();
                    break;
                }
                sample = self.executor.execute(self.id, &self.url) => sample,
            };

            run_checks(&self.checks, &mut sample);
            if sample.is_failed() {
                self.logger.debug("Request failed").sample(&sample).log();
            }
            self.collector.submit(sample);
            report.requests += 1;

            if self.sleep.is_zero() {
                // Keep a zero-sleep loop from starving the runtime
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    _ = self.signals.soft.cancelled() => break,
                    _ = tokio::time::sleep(self.sleep) => {}
                }
            }
        }

        self.gauge.exit();
        crate::log_debug!(self.logger, "VU {} stopped after {} requests", self.id, report.requests);
        report
    }
}
