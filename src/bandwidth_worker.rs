// Bandwidth worker: polls sent+received byte rates into the open bucket.
// Only counter setup can end it early; a failed tick is skipped without logging.
// Backend calls run on the blocking pool.

use crate::error::{SampleError, SetupError};
use crate::source::{CounterBackend, CounterId, CounterKind};
use crate::state::AggregationState;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct BandwidthWorkerConfig {
    /// Adapter to monitor; `None` picks the first one the backend enumerates.
    pub adapter: Option<String>,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

impl Default for BandwidthWorkerConfig {
    fn default() -> Self {
        Self {
            adapter: None,
            poll_interval: Duration::from_secs(1),
            settle_delay: Duration::from_secs(1),
        }
    }
}

/// Outcome counters, logged on exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandwidthStats {
    pub samples_recorded: u64,
    pub ticks_skipped: u64,
}

/// Sent/received counter handles on one adapter.
#[derive(Debug, Clone, Copy)]
struct CounterPair {
    sent: CounterId,
    received: CounterId,
}

/// The backend is shared with `spawn_blocking` jobs; its refreshes do file and syscall I/O.
type SharedBackend = Arc<Mutex<Box<dyn CounterBackend>>>;

pub fn spawn(
    backend: Box<dyn CounterBackend>,
    state: Arc<AggregationState>,
    cancel: CancellationToken,
    config: BandwidthWorkerConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(backend, state, cancel, config).await;
    })
}

/// Runs `f` against the backend on the blocking pool. `None` if the job panicked.
async fn with_backend<T, F>(backend: &SharedBackend, f: F) -> Option<T>
where
    F: FnOnce(&mut dyn CounterBackend) -> T + Send + 'static,
    T: Send + 'static,
{
    let backend = backend.clone();
    let job = tokio::task::spawn_blocking(move || {
        let mut guard = backend.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut **guard)
    });
    match job.await {
        Ok(out) => Some(out),
        Err(e) => {
            warn!(error = %e, operation = "counter_backend", "counter backend task failed");
            None
        }
    }
}

fn open_counters(
    backend: &mut dyn CounterBackend,
    adapter: Option<String>,
) -> Result<(String, CounterPair), SetupError> {
    let adapter = match adapter {
        Some(a) => a,
        None => backend
            .adapters()?
            .into_iter()
            .next()
            .ok_or(SetupError::NoAdapters)?,
    };
    let sent = backend.open_counter(&adapter, CounterKind::BytesSent)?;
    let received = backend.open_counter(&adapter, CounterKind::BytesReceived)?;
    // The first reading of a fresh counter is not meaningful.
    let _ = backend.collect();
    Ok((adapter, CounterPair { sent, received }))
}

fn sample(backend: &mut dyn CounterBackend, counters: CounterPair) -> Result<f64, SampleError> {
    backend.collect()?;
    let sent = backend.read(counters.sent)?;
    let received = backend.read(counters.received)?;
    Ok(sent + received)
}

#[instrument(name = "bandwidth_worker", skip_all)]
pub async fn run(
    backend: Box<dyn CounterBackend>,
    state: Arc<AggregationState>,
    cancel: CancellationToken,
    config: BandwidthWorkerConfig,
) -> BandwidthStats {
    let mut stats = BandwidthStats::default();
    let backend: SharedBackend = Arc::new(Mutex::new(backend));

    let requested = config.adapter.clone();
    let opened = with_backend(&backend, move |b| open_counters(b, requested)).await;
    let (adapter, counters) = match opened {
        Some(Ok(opened)) => opened,
        Some(Err(e)) => {
            warn!(error = %e, operation = "open_counters", "bandwidth monitoring unavailable");
            return stats;
        }
        None => return stats,
    };
    info!(adapter = %adapter, "bandwidth monitoring started");

    tokio::select! {
        _ = cancel.cancelled() => return stats,
        _ = sleep(config.settle_delay) => {}
    }

    let mut tick = interval_at(Instant::now() + config.poll_interval, config.poll_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tick.tick() => {
                // A sample still in flight at cancellation is dropped whole.
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    outcome = with_backend(&backend, move |b| sample(b, counters)) => match outcome {
                        Some(Ok(bytes_per_sec)) => {
                            state.record_bandwidth(bytes_per_sec);
                            stats.samples_recorded += 1;
                        }
                        _ => stats.ticks_skipped += 1,
                    },
                }
            }
        }
    }

    debug!(
        adapter = %adapter,
        samples_recorded = stats.samples_recorded,
        ticks_skipped = stats.ticks_skipped,
        "bandwidth worker exiting"
    );
    stats
}
