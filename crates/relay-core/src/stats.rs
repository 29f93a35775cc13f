use chrono::{DateTime, Utc};
use relay_types::StatsSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free request timing aggregator, shared by every request task
#[derive(Debug)]
pub struct RequestStats {
    total_requests: AtomicU64,
    total_micros: AtomicU64,
    min_micros: AtomicU64,
    max_micros: AtomicU64,
    since: DateTime<Utc>,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_micros: AtomicU64::new(0),
            min_micros: AtomicU64::new(u64::MAX),
            max_micros: AtomicU64::new(0),
            since: Utc::now(),
        }
    }

    pub fn record(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_micros.fetch_add(micros, Ordering::Relaxed);
        self.min_micros.fetch_min(micros, Ordering::Relaxed);
        self.max_micros.fetch_max(micros, Ordering::Relaxed);
        // Counted last: a snapshot that sees this request also sees its timing.
        self.total_requests.fetch_add(1, Ordering::Release);
    }

    /// Fields are read independently; a snapshot taken while requests
    /// complete may include timings of requests not yet counted.
    pub fn snapshot(&self) -> StatsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Acquire);
        if total_requests == 0 {
            return StatsSnapshot::empty(self.since);
        }

        let to_secs = |micros: u64| micros as f64 / 1_000_000.0;
        let total_time = to_secs(self.total_micros.load(Ordering::Relaxed));
        let min_micros = self.min_micros.load(Ordering::Relaxed);
        StatsSnapshot {
            total_requests,
            total_time,
            min_time: (min_micros != u64::MAX).then(|| to_secs(min_micros)),
            max_time: Some(to_secs(self.max_micros.load(Ordering::Relaxed))),
            avg_time: Some(total_time / total_requests as f64),
            since: self.since,
        }
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}
