// Closed time buckets and the finalized snapshot handed to the report.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One closed window: packets seen and summed byte-rate samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub packets: u64,
    pub bandwidth: f64,
}

/// Immutable copy of every closed bucket plus the run's wall-clock length.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub buckets: Vec<Bucket>,
    pub elapsed: Duration,
}

impl Snapshot {
    pub fn total_packets(&self) -> u64 {
        self.buckets.iter().map(|b| b.packets).sum()
    }

    pub fn total_bandwidth(&self) -> f64 {
        self.buckets.iter().map(|b| b.bandwidth).sum()
    }
}
