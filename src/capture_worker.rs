// Capture worker: one packet per line of the capture stream.

use crate::source::PacketSource;
use crate::state::AggregationState;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy)]
pub struct CaptureWorkerConfig {
    /// Print each captured line to stdout.
    pub echo: bool,
}

pub fn spawn(
    source: Box<dyn PacketSource>,
    state: Arc<AggregationState>,
    cancel: CancellationToken,
    config: CaptureWorkerConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(source, state, cancel, config).await;
    })
}

/// Drains the stream until it ends, fails, or `cancel` fires. Returns the packets recorded.
#[instrument(name = "capture_worker", skip_all)]
pub async fn run(
    source: Box<dyn PacketSource>,
    state: Arc<AggregationState>,
    cancel: CancellationToken,
    config: CaptureWorkerConfig,
) -> u64 {
    let mut stream = match source.open() {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, operation = "open_capture", "packet capture unavailable");
            return 0;
        }
    };

    let mut recorded: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("capture cancelled");
                break;
            }
            line = stream.next_line() => match line {
                Ok(Some(line)) => {
                    // A line that has been read is always counted.
                    state.record_packet();
                    recorded += 1;
                    if config.echo {
                        println!("{}", line);
                    }
                }
                Ok(None) => {
                    debug!("capture stream ended");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, operation = "read_capture", "capture stream read failed");
                    break;
                }
            },
        }
    }

    stream.shutdown().await;
    debug!(packets = recorded, "capture worker exiting");
    recorded
}
