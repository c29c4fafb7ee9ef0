// Report wire format (JSON via --json; text via Display in crate::report)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BucketLabel {
    /// Full-width bucket, 1-based.
    Minute { number: usize },
    /// Trailing partial bucket.
    Remainder { seconds: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketLine {
    pub label: BucketLabel,
    pub packets: u64,
    pub bandwidth_bytes: f64,
    pub bandwidth_mib: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub elapsed_secs: u64,
    pub buckets: Vec<BucketLine>,
    pub total_packets: u64,
    pub total_bandwidth_bytes: f64,
    pub total_bandwidth_mib: f64,
    /// Absent when no packets were captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_bytes_per_packet: Option<f64>,
}
