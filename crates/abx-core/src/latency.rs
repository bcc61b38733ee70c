//! Histogram-based latency collector for recovery round-trips.
//!
//! The gap reconciler times every connect/send/receive cycle it performs and
//! feeds the elapsed microseconds into a `LatencyCollector`. At the end of the
//! run, statistics are computed: min, max, average, and percentiles
//! (p50, p90, p99).
//!
//! The histogram uses fixed 100µs bins up to 1s (10000 bins). Samples above
//! 1s are clamped to the last bin.

/// Width of each histogram bin in microseconds.
const BIN_WIDTH_US: u64 = 100;

/// Number of histogram bins (covers 0–1s).
const NUM_BINS: usize = 10_000;

/// Computed latency statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub avg_us: f64,
    pub p50_us: u64,
    pub p90_us: u64,
    pub p99_us: u64,
}

impl std::fmt::Display for LatencyStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} min={}µs max={}µs avg={:.1}µs p50={}µs p90={}µs p99={}µs",
            self.count, self.min_us, self.max_us, self.avg_us, self.p50_us, self.p90_us, self.p99_us,
        )
    }
}

/// A histogram-based latency collector.
///
/// Not thread-safe; the reconciler owns its instance for the whole pass.
#[derive(Debug, Clone)]
pub struct LatencyCollector {
    bins: Vec<u64>,
    count: u64,
    sum: u64,
    min: u64,
    max: u64,
}

impl LatencyCollector {
    pub fn new() -> Self {
        Self { bins: vec![0u64; NUM_BINS], count: 0, sum: 0, min: u64::MAX, max: 0 }
    }

    /// Record a latency sample in microseconds.
    #[inline]
    pub fn record(&mut self, latency_us: u64) {
        self.count += 1;
        self.sum = self.sum.saturating_add(latency_us);
        self.min = self.min.min(latency_us);
        self.max = self.max.max(latency_us);

        let bin = (latency_us / BIN_WIDTH_US) as usize;
        self.bins[bin.min(NUM_BINS - 1)] += 1;
    }

    /// Record an elapsed [`std::time::Duration`].
    #[inline]
    pub fn record_duration(&mut self, elapsed: std::time::Duration) {
        self.record(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
    }

    /// Compute summary statistics. Returns `None` if no samples recorded.
    pub fn stats(&self) -> Option<LatencyStats> {
        if self.count == 0 {
            return None;
        }

        Some(LatencyStats {
            count: self.count,
            min_us: self.min,
            max_us: self.max,
            avg_us: self.sum as f64 / self.count as f64,
            p50_us: self.percentile(0.50),
            p90_us: self.percentile(0.90),
            p99_us: self.percentile(0.99),
        })
    }

    /// Value at the given percentile (0.0–1.0), clamped to the observed max.
    fn percentile(&self, pct: f64) -> u64 {
        let target = (self.count as f64 * pct).ceil() as u64;
        let mut cumulative = 0u64;
        for (i, &count) in self.bins.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                return ((i as u64) * BIN_WIDTH_US).min(self.max);
            }
        }
        self.max
    }
}

impl Default for LatencyCollector {
    fn default() -> Self {
        Self::new()
    }
}
