//! Bounded-memory latency distribution

use crate::error::{AppError, Result};
use hdrhistogram::Histogram;
use std::time::Duration;

/// Smallest trackable latency, in microseconds
const LOWEST_MICROS: u64 = 1;
/// Largest trackable latency (one hour); larger values saturate
const HIGHEST_MICROS: u64 = 60 * 60 * 1000 * 1000;
/// Two significant digits keep every quantile within 1% of its true value
const SIGNIFICANT_DIGITS: u8 = 2;

/// Latency histogram with exact count, sum, min and max
///
/// Memory stays constant regardless of how many values are recorded.
/// Merging is commutative and associative, so shards can be combined in
/// any order.
#[derive(Debug, Clone)]
pub struct LatencySketch {
    histogram: Histogram<u64>,
    sum_micros: u64,
    min_micros: u64,
    max_micros: u64,
}

impl LatencySketch {
    /// Relative error bound on any reported quantile
    pub const MAX_RELATIVE_ERROR: f64 = 0.01;

    pub fn new() -> Result<Self> {
        let histogram = Histogram::<u64>::new_with_bounds(LOWEST_MICROS, HIGHEST_MICROS, SIGNIFICANT_DIGITS)
            .map_err(|e| AppError::aggregation(format!("Cannot create latency histogram: {:?}", e)))?;
        Ok(Self {
            histogram,
            sum_micros: 0,
            min_micros: u64::MAX,
            max_micros: 0,
        })
    }

    pub fn record(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros())
            .unwrap_or(u64::MAX)
            .clamp(LOWEST_MICROS, HIGHEST_MICROS);
        self.histogram.saturating_record(micros);
        self.sum_micros = self.sum_micros.saturating_add(micros);
        self.min_micros = self.min_micros.min(micros);
        self.max_micros = self.max_micros.max(micros);
    }

    pub fn merge(&mut self, other: &LatencySketch) -> Result<()> {
        self.histogram
            .add(&other.histogram)
            .map_err(|e| AppError::aggregation(format!("Cannot merge latency histograms: {:?}", e)))?;
        self.sum_micros = self.sum_micros.saturating_add(other.sum_micros);
        self.min_micros = self.min_micros.min(other.min_micros);
        self.max_micros = self.max_micros.max(other.max_micros);
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    /// Value at `quantile` (0.0..=1.0) in milliseconds
    pub fn quantile_ms(&self, quantile: f64) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let quantile = quantile.clamp(0.0, 1.0);
        if quantile == 0.0 {
            return self.min_ms();
        }
        if quantile == 1.0 {
            return self.max_ms();
        }
        // Bucket upper bounds may overshoot the largest recorded value
        let micros = self.histogram.value_at_quantile(quantile).min(self.max_micros);
        Some(micros_to_ms(micros))
    }

    /// `p(N)` with N in 0..=100, in milliseconds
    pub fn percentile_ms(&self, percentile: f64) -> Option<f64> {
        self.quantile_ms(percentile / 100.0)
    }

    pub fn median_ms(&self) -> Option<f64> {
        self.quantile_ms(0.5)
    }

    pub fn mean_ms(&self) -> Option<f64> {
        (!self.is_empty()).then(|| micros_to_ms(self.sum_micros) / self.len() as f64)
    }

    pub fn min_ms(&self) -> Option<f64> {
        (!self.is_empty()).then(|| micros_to_ms(self.min_micros))
    }

    pub fn max_ms(&self) -> Option<f64> {
        (!self.is_empty()).then(|| micros_to_ms(self.max_micros))
    }
}

fn micros_to_ms(micros: u64) -> f64 {
    micros as f64 / 1000.0
}
