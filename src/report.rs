// Final report: per-bucket lines and totals from a finalized snapshot.

use crate::models::{BucketLabel, BucketLine, Report, Snapshot};
use std::fmt;
use std::time::Duration;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;
const RULE_WIDTH: usize = 60;

pub fn to_mib(bytes: f64) -> f64 {
    bytes / BYTES_PER_MIB
}

impl Report {
    /// Builds the report for `snapshot` with buckets of `width`.
    ///
    /// The last bucket is labelled as a remainder when the time left after the
    /// full buckets before it is shorter than `width`.
    pub fn from_snapshot(snapshot: &Snapshot, width: Duration) -> Self {
        let elapsed_secs = snapshot.elapsed.as_secs();
        let width_secs = width.as_secs();
        let last = snapshot.buckets.len().saturating_sub(1);

        let mut total_packets: u64 = 0;
        let mut total_bandwidth = 0.0;
        let buckets = snapshot
            .buckets
            .iter()
            .enumerate()
            .map(|(i, bucket)| {
                total_packets += bucket.packets;
                total_bandwidth += bucket.bandwidth;
                let remainder = elapsed_secs.saturating_sub(i as u64 * width_secs);
                let label = if i == last && remainder < width_secs {
                    BucketLabel::Remainder { seconds: remainder }
                } else {
                    BucketLabel::Minute { number: i + 1 }
                };
                BucketLine {
                    label,
                    packets: bucket.packets,
                    bandwidth_bytes: bucket.bandwidth,
                    bandwidth_mib: to_mib(bucket.bandwidth),
                }
            })
            .collect();

        let avg_bytes_per_packet =
            (total_packets > 0).then(|| total_bandwidth / total_packets as f64);

        Report {
            elapsed_secs,
            buckets,
            total_packets,
            total_bandwidth_bytes: total_bandwidth,
            total_bandwidth_mib: to_mib(total_bandwidth),
            avg_bytes_per_packet,
        }
    }
}

impl fmt::Display for BucketLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketLabel::Minute { number } => write!(f, "minute {}", number),
            BucketLabel::Remainder { seconds } => write!(f, "last {} seconds", seconds),
        }
    }
}

impl fmt::Display for BucketLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} packets | {:.2} MB",
            self.label, self.packets, self.bandwidth_mib
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        writeln!(f)?;
        writeln!(f, "{}", heavy)?;
        writeln!(f, "MONITORING REPORT")?;
        writeln!(f, "{}", heavy)?;
        for line in &self.buckets {
            writeln!(f, "{}", line)?;
        }
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(
            f,
            "TOTAL: {} packets | {:.2} MB",
            self.total_packets, self.total_bandwidth_mib
        )?;
        if let Some(avg) = self.avg_bytes_per_packet {
            writeln!(f, "Average bytes per packet: {:.2}", avg)?;
        }
        writeln!(f, "{}", heavy)
    }
}
