// Rotation worker: closes buckets on boundary crossings independent of traffic.

use crate::state::AggregationState;
use std::sync::Arc;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

pub fn spawn(
    state: Arc<AggregationState>,
    cancel: CancellationToken,
    tick_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(state, cancel, tick_interval).await;
    })
}

#[instrument(name = "rotation_worker", skip(state, cancel))]
pub async fn run(state: Arc<AggregationState>, cancel: CancellationToken, tick_interval: Duration) {
    let mut tick = interval(tick_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tick.tick() => {
                let rotated = state.maybe_rotate(Instant::now());
                if rotated > 0 {
                    debug!(rotated, closed = state.closed_len(), "bucket boundary crossed");
                }
            }
        }
    }
    debug!("rotation worker exiting");
}
