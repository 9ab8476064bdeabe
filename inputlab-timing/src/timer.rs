use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic clock with a bounded history of measured intervals.
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn record_interval(&mut self, d: Duration);
    fn interval_stats(&self) -> IntervalStats;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalStats {
    pub count: usize,
    pub average_interval_ns: f64,
    pub jitter_ns: f64,
    pub min_interval_ns: f64,
    pub max_interval_ns: f64,
    pub effective_hz: f64,
}

impl IntervalStats {
    pub fn from_intervals<I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = Duration>,
    {
        let times: Vec<f64> = intervals
            .into_iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        if times.is_empty() {
            return IntervalStats::default();
        }
        let n = times.len() as f64;
        let avg = times.iter().sum::<f64>() / n;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        IntervalStats {
            count: times.len(),
            average_interval_ns: avg,
            jitter_ns: var.sqrt(),
            min_interval_ns: min,
            max_interval_ns: max,
            effective_hz: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }

    /// Stats over the gaps between consecutive nanosecond timestamps.
    /// Out-of-order pairs count as zero-length gaps.
    pub fn from_timestamps(timestamps: &[u64]) -> Self {
        Self::from_intervals(
            timestamps
                .windows(2)
                .map(|w| Duration::from_nanos(w[1].saturating_sub(w[0]))),
        )
    }
}

fn push_bounded(buf: &mut Vec<Duration>, max: usize, d: Duration) {
    if buf.len() >= max {
        buf.remove(0);
    }
    buf.push(d);
}

#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
    pub intervals: Vec<Duration>,
    pub max_samples: usize,
}

impl Timer for HighPrecisionTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn record_interval(&mut self, d: Duration) {
        push_bounded(&mut self.intervals, self.max_samples, d);
    }
    fn interval_stats(&self) -> IntervalStats {
        IntervalStats::from_intervals(self.intervals.iter().copied())
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            intervals: Vec::with_capacity(1000),
            max_samples: 1000,
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
    intervals: Vec<Duration>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ns: u64) -> Self {
        Self {
            now_ns: Arc::new(AtomicU64::new(ns)),
            intervals: Vec::new(),
        }
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns
            .fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set(&self, ns: u64) {
        self.now_ns.store(ns, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn record_interval(&mut self, d: Duration) {
        push_bounded(&mut self.intervals, 1000, d);
    }
    fn interval_stats(&self) -> IntervalStats {
        IntervalStats::from_intervals(self.intervals.iter().copied())
    }
}
