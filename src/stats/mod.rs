//! Concurrent metric collection for load test runs
//!
//! Virtual users submit samples into shards picked by `vu_id % shards`,
//! so VUs on different shards never contend for the same lock. Every
//! per-shard aggregate is commutative, which makes the merged snapshot
//! independent of submission order and interleaving.

pub mod sketch;

pub use sketch::LatencySketch;

use crate::error::Result;
use crate::models::{CheckSummary, LatencySummary, MetricsSummary, RequestSample};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running pass/total counter behind every rate metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCounter {
    pub hits: u64,
    pub total: u64,
}

impl RateCounter {
    pub fn add(&mut self, hit: bool) {
        self.total += 1;
        if hit {
            self.hits += 1;
        }
    }

    pub fn merge(&mut self, other: &RateCounter) {
        self.hits += other.hits;
        self.total += other.total;
    }

    /// Exact `hits / total`, `None` before the first event
    pub fn rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.hits as f64 / self.total as f64)
    }
}

/// Aggregates accumulated by one shard
#[derive(Debug, Clone)]
struct ShardState {
    http_req_duration: LatencySketch,
    http_req_failed: RateCounter,
    checks: RateCounter,
    per_check: BTreeMap<String, RateCounter>,
    http_reqs: u64,
    iterations: u64,
    errored: u64,
    status_codes: BTreeMap<u16, u64>,
    errors: BTreeMap<String, u64>,
}

impl ShardState {
    fn new() -> Result<Self> {
        Ok(Self {
            http_req_duration: LatencySketch::new()?,
            http_req_failed: RateCounter::default(),
            checks: RateCounter::default(),
            per_check: BTreeMap::new(),
            http_reqs: 0,
            iterations: 0,
            errored: 0,
            status_codes: BTreeMap::new(),
            errors: BTreeMap::new(),
        })
    }

    fn record(&mut self, sample: &RequestSample) {
        self.http_reqs += 1;
        self.http_req_failed.add(sample.is_failed());

        match &sample.error {
            Some(error) => {
                self.errored += 1;
                *self.errors.entry(error.kind.as_str().to_string()).or_insert(0) += 1;
            }
            None => {
                self.http_req_duration.record(sample.latency);
                *self.status_codes.entry(sample.status_code).or_insert(0) += 1;
            }
        }

        for result in &sample.check_results {
            self.checks.add(result.passed);
            self.per_check
                .entry(result.name.clone())
                .or_default()
                .add(result.passed);
        }

        // A request abandoned at the hard stop did not finish its iteration
        if !sample.is_cancelled() {
            self.iterations += 1;
        }
    }
}

/// Merged, read-only view of all recorded metrics
#[derive(Debug, Clone)]
pub struct MetricSeries {
    pub http_req_duration: LatencySketch,
    pub http_req_failed: RateCounter,
    pub checks: RateCounter,
    pub per_check: BTreeMap<String, RateCounter>,
    pub http_reqs: u64,
    pub iterations: u64,
    pub errored: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub errors: BTreeMap<String, u64>,
}

impl MetricSeries {
    fn from_shard(state: ShardState) -> Self {
        Self {
            http_req_duration: state.http_req_duration,
            http_req_failed: state.http_req_failed,
            checks: state.checks,
            per_check: state.per_check,
            http_reqs: state.http_reqs,
            iterations: state.iterations,
            errored: state.errored,
            status_codes: state.status_codes,
            errors: state.errors,
        }
    }

    fn absorb(&mut self, shard: &ShardState) -> Result<()> {
        self.http_req_duration.merge(&shard.http_req_duration)?;
        self.http_req_failed.merge(&shard.http_req_failed);
        self.checks.merge(&shard.checks);
        for (name, counter) in &shard.per_check {
            self.per_check.entry(name.clone()).or_default().merge(counter);
        }
        self.http_reqs += shard.http_reqs;
        self.iterations += shard.iterations;
        self.errored += shard.errored;
        for (code, count) in &shard.status_codes {
            *self.status_codes.entry(*code).or_insert(0) += count;
        }
        for (kind, count) in &shard.errors {
            *self.errors.entry(kind.clone()).or_insert(0) += count;
        }
        Ok(())
    }

    /// Display/export form of the series
    pub fn summary(&self) -> MetricsSummary {
        let d = &self.http_req_duration;
        let http_req_duration = match (
            d.mean_ms(),
            d.min_ms(),
            d.median_ms(),
            d.percentile_ms(90.0),
            d.percentile_ms(95.0),
            d.percentile_ms(99.0),
            d.max_ms(),
        ) {
            (Some(avg), Some(min), Some(med), Some(p90), Some(p95), Some(p99), Some(max)) => {
                Some(LatencySummary { avg, min, med, p90, p95, p99, max })
            }
            _ => None,
        };

        MetricsSummary {
            http_reqs: self.http_reqs,
            iterations: self.iterations,
            failed_requests: self.http_req_failed.hits,
            errored_requests: self.errored,
            http_req_failed_rate: self.http_req_failed.rate(),
            checks_rate: self.checks.rate(),
            http_req_duration,
            checks: self
                .per_check
                .iter()
                .map(|(name, counter)| CheckSummary {
                    name: name.clone(),
                    passes: counter.hits,
                    fails: counter.total - counter.hits,
                })
                .collect(),
            status_codes: self.status_codes.clone(),
            errors: self.errors.clone(),
        }
    }
}

/// Thread-safe sink for request samples
pub struct MetricsCollector {
    shards: Vec<Mutex<ShardState>>,
}

impl MetricsCollector {
    /// Collector with `num_shards` independent locks (at least one)
    pub fn new(num_shards: usize) -> Result<Self> {
        let shards = (0..num_shards.max(1))
            .map(|_| ShardState::new().map(Mutex::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { shards })
    }

    /// One shard per available CPU
    pub fn with_default_shards() -> Result<Self> {
        Self::new(num_cpus::get())
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Record one sample; safe to call from any number of tasks at once
    pub fn submit(&self, sample: RequestSample) {
        let shard = &self.shards[sample.vu_id % self.shards.len()];
        shard.lock().record(&sample);
    }

    /// Requests recorded so far, across all shards
    pub fn requests_recorded(&self) -> u64 {
        self.shards.iter().map(|s| s.lock().http_reqs).sum()
    }

    /// Merge all shards into a consistent series
    pub fn snapshot(&self) -> Result<MetricSeries> {
        let mut merged = MetricSeries::from_shard(ShardState::new()?);
        for shard in &self.shards {
            let state = shard.lock();
            merged.absorb(&state)?;
        }
        Ok(merged)
    }
}
