// Run coordinator: starts the workers under one deadline, joins them, then reports.

use crate::bandwidth_worker::{self, BandwidthWorkerConfig};
use crate::capture_worker::{self, CaptureWorkerConfig};
use crate::models::Report;
use crate::rotation_worker;
use crate::source::{CounterBackend, PacketSource};
use crate::state::AggregationState;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Sources and cancellation for one run.
pub struct MonitorDeps {
    pub packets: Box<dyn PacketSource>,
    /// `None` disables bandwidth monitoring.
    pub counters: Option<Box<dyn CounterBackend>>,
    /// Fired by the deadline or externally (e.g. Ctrl-C).
    pub cancel: CancellationToken,
}

/// Run timing and behaviour.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub duration: Duration,
    /// Must be non-zero; [`run`] panics otherwise.
    pub bucket_width: Duration,
    /// Must be non-zero; the rotation worker's interval panics otherwise.
    pub rotation_tick: Duration,
    pub echo: bool,
    pub bandwidth: BandwidthWorkerConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(10),
            bucket_width: crate::state::BUCKET_WIDTH,
            rotation_tick: Duration::from_secs(1),
            echo: true,
            bandwidth: BandwidthWorkerConfig::default(),
        }
    }
}

/// Cancels `cancel` once `duration` has elapsed, unless it fires first.
pub fn spawn_deadline(cancel: CancellationToken, duration: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = sleep(duration) => {
                info!(duration_secs = duration.as_secs_f64(), "capture duration elapsed");
                cancel.cancel();
            }
        }
    })
}

async fn join(name: &'static str, handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        warn!(worker = name, error = %e, "worker task failed");
    }
}

/// Runs capture, bandwidth and rotation workers to completion and builds the report.
///
/// Worker failures only degrade the data; a report is always produced.
pub async fn run(deps: MonitorDeps, config: MonitorConfig) -> Report {
    let MonitorDeps {
        packets,
        counters,
        cancel,
    } = deps;

    let state = Arc::new(AggregationState::starting_at(
        Instant::now(),
        config.bucket_width,
    ));
    let deadline = spawn_deadline(cancel.clone(), config.duration);

    let capture = capture_worker::spawn(
        packets,
        state.clone(),
        cancel.clone(),
        CaptureWorkerConfig { echo: config.echo },
    );
    let bandwidth = counters.map(|backend| {
        bandwidth_worker::spawn(
            backend,
            state.clone(),
            cancel.clone(),
            config.bandwidth.clone(),
        )
    });
    let rotation = rotation_worker::spawn(state.clone(), cancel.clone(), config.rotation_tick);

    join("capture", capture).await;
    if let Some(handle) = bandwidth {
        join("bandwidth", handle).await;
    }
    // Capture may end on its own (process exit); the remaining workers still run to the deadline.
    join("rotation", rotation).await;
    cancel.cancel();
    join("deadline", deadline).await;

    let snapshot = state.finalize_and_snapshot(Instant::now());
    info!(
        buckets = snapshot.buckets.len(),
        packets = snapshot.total_packets(),
        elapsed_secs = snapshot.elapsed.as_secs_f64(),
        "monitoring finished"
    );
    Report::from_snapshot(&snapshot, config.bucket_width)
}
