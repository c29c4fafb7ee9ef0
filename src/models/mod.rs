// Domain models: closed buckets and the final report

mod bucket;
mod report;

pub use bucket::{Bucket, Snapshot};
pub use report::{BucketLabel, BucketLine, Report};
