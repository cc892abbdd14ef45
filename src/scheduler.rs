//! Spawns virtual users and enforces the run deadline
//!
//! Timeline of a run:
//! - `start`: N virtual users begin iterating immediately
//! - `duration`: soft stop, no new iteration starts
//! - `duration + grace_period`: hard stop, in-flight requests are cancelled

use crate::checks::Check;
use crate::client::RequestExecutor;
use crate::error::{AppError, Result};
use crate::logging::Logger;
use crate::models::{RequestSample, RunStats, TestConfig};
use crate::runner::{ConcurrencyGauge, StopSignals, VirtualUser, VuReport};
use crate::stats::MetricsCollector;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

/// Time virtual users get to exit after the hard stop before being aborted
const HARD_STOP_SETTLE: Duration = Duration::from_secs(1);

pub struct Scheduler {
    executor: Arc<dyn RequestExecutor>,
    collector: Arc<MetricsCollector>,
    checks: Arc<[Check]>,
    logger: Logger,
}

impl Scheduler {
    pub fn new(executor: Arc<dyn RequestExecutor>, collector: Arc<MetricsCollector>, logger: Logger) -> Self {
        Self {
            executor,
            collector,
            checks: Arc::from(Vec::new()),
            logger,
        }
    }

    pub fn with_checks(mut self, checks: Vec<Check>) -> Self {
        self.checks = Arc::from(checks);
        self
    }

    /// Spawn `config.vus` virtual users and arm the deadline
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, config: &TestConfig) -> Result<RunHandle> {
        if config.vus == 0 {
            return Err(AppError::config("vus must be at least 1"));
        }
        if config.duration.is_zero() {
            return Err(AppError::config("duration must be greater than 0"));
        }

        let vus = config.vus as usize;
        let signals = StopSignals::new();
        let gauge = Arc::new(ConcurrencyGauge::default());
        let url: Arc<str> = Arc::from(config.target_url.as_str());
        let started = Instant::now();
        let deadline = started + config.duration;

        self.logger
            .info("Starting load test")
            .field("url", &config.target_url)
            .field("vus", vus)
            .field("duration_ms", config.duration.as_millis() as u64)
            .field("grace_ms", config.grace_period.as_millis() as u64)
            .log();

        let mut handles = Vec::with_capacity(vus);
        for id in 0..vus {
            let user = VirtualUser {
                id,
                url: url.clone(),
                sleep: config.sleep,
                executor: self.executor.clone(),
                checks: self.checks.clone(),
                collector: self.collector.clone(),
                signals: signals.clone(),
                gauge: gauge.clone(),
                logger: self.logger.clone(),
            };
            handles.push((id, tokio::spawn(user.run())));
        }

        let soft = signals.soft.clone();
        let timer_logger = self.logger.clone();
        let timer = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    timer_logger.info("Deadline reached, stopping virtual users").log();
                    soft.cancel();
                }
                _ = soft.cancelled() => {}
            }
        });

        Ok(RunHandle {
            handles,
            signals,
            gauge,
            started,
            deadline,
            grace_period: config.grace_period,
            timer,
            collector: self.collector.clone(),
            logger: self.logger.clone(),
        })
    }
}

/// A running load test
pub struct RunHandle {
    handles: Vec<(usize, JoinHandle<VuReport>)>,
    signals: StopSignals,
    gauge: Arc<ConcurrencyGauge>,
    started: Instant,
    deadline: Instant,
    grace_period: Duration,
    timer: JoinHandle<()>,
    collector: Arc<MetricsCollector>,
    logger: Logger,
}

impl RunHandle {
    /// Token that ends the run early (the grace period still applies)
    pub fn stop_token(&self) -> CancellationToken {
        self.signals.soft.clone()
    }

    pub fn spawned(&self) -> usize {
        self.handles.len()
    }

    pub fn active(&self) -> usize {
        self.gauge.active()
    }

    /// Wait for every virtual user to exit
    pub async fn wait(self) -> Result<RunStats> {
        let RunHandle {
            handles,
            signals,
            gauge,
            started,
            deadline,
            grace_period,
            timer,
            collector,
            logger,
        } = self;

        let spawned = handles.len();
        let mut reports = Vec::with_capacity(spawned);
        let mut stragglers = Vec::new();
        let mut panicked = 0usize;

        // The hard stop is measured from the soft stop, which may come early
        signals.soft.cancelled().await;
        let soft_at = Instant::now().min(deadline);
        let hard_deadline = soft_at + grace_period;

        for (id, mut handle) in handles {
            match timeout_at(hard_deadline, &mut handle).await {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(e)) => {
                    panicked += 1;
                    logger.error(&format!("VU {} terminated abnormally: {}", id, e)).log();
                }
                Err(_) => stragglers.push((id, handle)),
            }
        }

        let mut aborted = 0usize;
        if !stragglers.is_empty() {
            logger
                .warn("Grace period expired, cancelling in-flight requests")
                .field("in_flight", stragglers.len())
                .log();
            signals.hard.cancel();

            // One settle window shared by every straggler
            let settle_deadline = Instant::now() + HARD_STOP_SETTLE;
            for (id, mut handle) in stragglers {
                match timeout_at(settle_deadline, &mut handle).await {
                    Ok(Ok(report)) => reports.push(report),
                    Ok(Err(e)) => {
                        panicked += 1;
                        logger.error(&format!("VU {} terminated abnormally: {}", id, e)).log();
                    }
                    Err(_) => {
                        // Unresponsive to cancellation: abort and record the loss ourselves
                        handle.abort();
                        aborted += 1;
                        collector.submit(RequestSample::cancelled(id, Utc::now(), soft_at.elapsed()));
                    }
                }
            }
        }

        timer.abort();

        if panicked > 0 {
            return Err(AppError::internal(format!("{} virtual user(s) panicked", panicked)));
        }

        let forced_cancellations = reports.iter().filter(|r| r.cancelled).count() + aborted;
        let stats = RunStats {
            spawned,
            peak_concurrency: gauge.peak(),
            elapsed: started.elapsed(),
            forced_cancellations,
        };

        logger
            .info("Load test finished")
            .field("spawned", stats.spawned)
            .field("elapsed_ms", stats.elapsed.as_millis() as u64)
            .field("forced_cancellations", stats.forced_cancellations)
            .log();

        Ok(stats)
    }
}
