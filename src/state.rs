// Shared aggregation state: the open bucket plus the closed history.
// Every operation takes the lock once and leaves the state consistent before releasing it.

use crate::models::{Bucket, Snapshot};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::{Duration, Instant};

/// Width of one report bucket.
pub const BUCKET_WIDTH: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Inner {
    current: Bucket,
    closed: Vec<Bucket>,
    next_boundary: Instant,
    finalized_at: Option<Instant>,
}

impl Inner {
    fn close_current(&mut self) {
        let bucket = std::mem::take(&mut self.current);
        self.closed.push(bucket);
    }
}

/// Counters shared by the capture, bandwidth and rotation workers.
///
/// Closed buckets are append-only. Packet and bandwidth totals live in the same
/// [`Bucket`] so the two series can never drift out of alignment.
#[derive(Debug)]
pub struct AggregationState {
    inner: Mutex<Inner>,
    start: Instant,
    width: Duration,
}

impl AggregationState {
    pub fn new() -> Self {
        Self::starting_at(Instant::now(), BUCKET_WIDTH)
    }

    /// State whose first boundary is `start + width`.
    ///
    /// Panics if `width` is zero.
    pub fn starting_at(start: Instant, width: Duration) -> Self {
        assert!(!width.is_zero(), "bucket width must be non-zero");
        Self {
            inner: Mutex::new(Inner {
                current: Bucket::default(),
                closed: Vec::new(),
                next_boundary: start + width,
                finalized_at: None,
            }),
            start,
            width,
        }
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn width(&self) -> Duration {
        self.width
    }

    // A panic inside a critical section cannot leave a half-applied update,
    // so a poisoned guard is still valid.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_packet(&self) {
        let mut inner = self.lock();
        if inner.finalized_at.is_none() {
            inner.current.packets += 1;
        }
    }

    /// Adds one byte-rate sample. Negative, NaN and infinite samples are discarded.
    pub fn record_bandwidth(&self, bytes_per_sec: f64) {
        if !bytes_per_sec.is_finite() || bytes_per_sec <= 0.0 {
            if bytes_per_sec != 0.0 {
                tracing::debug!(sample = bytes_per_sec, "discarding invalid bandwidth sample");
            }
            return;
        }
        let mut inner = self.lock();
        if inner.finalized_at.is_none() {
            inner.current.bandwidth += bytes_per_sec;
        }
    }

    /// Closes one bucket for every boundary at or before `now`, including empty
    /// buckets for intervals in which no tick ran. Returns how many were closed.
    pub fn maybe_rotate(&self, now: Instant) -> usize {
        let mut inner = self.lock();
        if inner.finalized_at.is_some() {
            return 0;
        }
        let mut rotated = 0;
        while now >= inner.next_boundary {
            inner.close_current();
            inner.next_boundary += self.width;
            rotated += 1;
        }
        rotated
    }

    /// Closes the open bucket unconditionally and returns every closed bucket.
    ///
    /// The coordinator calls this once, after all workers are joined. A repeated
    /// call returns the same buckets and elapsed time without appending.
    pub fn finalize_and_snapshot(&self, now: Instant) -> Snapshot {
        let mut inner = self.lock();
        let finalized_at = match inner.finalized_at {
            Some(at) => at,
            None => {
                inner.close_current();
                inner.finalized_at = Some(now);
                now
            }
        };
        Snapshot {
            buckets: inner.closed.clone(),
            elapsed: finalized_at.saturating_duration_since(self.start),
        }
    }

    /// Counts in the still-open bucket.
    pub fn current(&self) -> Bucket {
        self.lock().current
    }

    pub fn closed_len(&self) -> usize {
        self.lock().closed.len()
    }

    pub fn next_boundary(&self) -> Instant {
        self.lock().next_boundary
    }
}

impl Default for AggregationState {
    fn default() -> Self {
        Self::new()
    }
}
