// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Latency and throughput metrics for stress tests.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use hdrhistogram::{errors::AdditionError, Histogram};

/// Per-operation latency histogram in nanoseconds.
///
/// Accumulate and allocate calls finish in well under a microsecond when
/// uncontended, so microsecond buckets would report zero.
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        Self {
            histogram: Histogram::new(3).expect("histogram creation"),
        }
    }

    /// Record a latency measurement.
    pub fn record(&mut self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.histogram.saturating_record(nanos);
    }

    /// Run `op`, recording how long it took.
    pub fn time<R>(&mut self, op: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = op();
        self.record(start.elapsed());
        result
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    /// Get a snapshot of the current statistics.
    pub fn snapshot(&self) -> LatencySnapshot {
        LatencySnapshot {
            count: self.histogram.len(),
            p50: Duration::from_nanos(self.histogram.value_at_quantile(0.5)),
            p99: Duration::from_nanos(self.histogram.value_at_quantile(0.99)),
            p999: Duration::from_nanos(self.histogram.value_at_quantile(0.999)),
            max: Duration::from_nanos(self.histogram.max()),
            mean: Duration::from_nanos(self.histogram.mean() as u64),
        }
    }

    /// Merge another histogram into this one.
    ///
    /// # Errors
    ///
    /// Fails if `other` holds values this histogram cannot represent.
    pub fn merge(&mut self, other: &LatencyHistogram) -> Result<(), AdditionError> {
        self.histogram.add(&other.histogram)
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of latency statistics.
#[derive(Debug, Clone)]
pub struct LatencySnapshot {
    pub count: u64,
    pub p50: Duration,
    pub p99: Duration,
    pub p999: Duration,
    pub max: Duration,
    pub mean: Duration,
}

impl std::fmt::Display for LatencySnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} mean={:?} p50={:?} p99={:?} p999={:?} max={:?}",
            self.count, self.mean, self.p50, self.p99, self.p999, self.max
        )
    }
}

/// Thread-safe operation counter shared by worker threads.
pub struct ThroughputCounter {
    count: AtomicU64,
    start: Instant,
}

impl ThroughputCounter {
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            start: Instant::now(),
        }
    }

    /// Increment the counter by a specified amount.
    pub fn add(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    /// Get the current count.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get the elapsed time since creation.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Calculate throughput as ops/sec.
    pub fn throughput(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.count() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl Default for ThroughputCounter {
    fn default() -> Self {
        Self::new()
    }
}
