// Report labels, totals and text/JSON rendering

use netwatch::models::{Bucket, BucketLabel, Report, Snapshot};
use std::time::Duration;

const WIDTH: Duration = Duration::from_secs(60);

fn snapshot(buckets: &[(u64, f64)], elapsed_secs: u64) -> Snapshot {
    Snapshot {
        buckets: buckets
            .iter()
            .map(|&(packets, bandwidth)| Bucket { packets, bandwidth })
            .collect(),
        elapsed: Duration::from_secs(elapsed_secs),
    }
}

#[test]
fn partial_last_bucket_is_labelled_as_remainder() {
    let report = Report::from_snapshot(&snapshot(&[(5, 0.0), (3, 0.0)], 95), WIDTH);
    assert_eq!(report.buckets[0].label, BucketLabel::Minute { number: 1 });
    assert_eq!(report.buckets[1].label, BucketLabel::Remainder { seconds: 35 });

    let text = report.to_string();
    assert!(text.contains("minute 1: 5 packets | 0.00 MB"));
    assert!(text.contains("last 35 seconds: 3 packets | 0.00 MB"));
}

#[test]
fn short_run_single_bucket_is_remainder() {
    let report = Report::from_snapshot(&snapshot(&[(7, 0.0)], 10), WIDTH);
    assert_eq!(report.buckets[0].label, BucketLabel::Remainder { seconds: 10 });
}

#[test]
fn elapsed_exactly_on_boundary_gives_zero_second_remainder() {
    let report = Report::from_snapshot(&snapshot(&[(1, 0.0), (2, 0.0), (0, 0.0)], 120), WIDTH);
    assert_eq!(report.buckets[1].label, BucketLabel::Minute { number: 2 });
    assert_eq!(report.buckets[2].label, BucketLabel::Remainder { seconds: 0 });
}

#[test]
fn average_bytes_per_packet() {
    let report = Report::from_snapshot(&snapshot(&[(60, 102_400.0), (40, 102_400.0)], 95), WIDTH);
    assert_eq!(report.total_packets, 100);
    assert_eq!(report.total_bandwidth_bytes, 204_800.0);
    assert_eq!(report.avg_bytes_per_packet, Some(2048.0));
    assert!(report.to_string().contains("Average bytes per packet: 2048.00"));
}

#[test]
fn no_average_line_without_packets() {
    let report = Report::from_snapshot(&snapshot(&[(0, 5_000.0)], 10), WIDTH);
    assert_eq!(report.avg_bytes_per_packet, None);
    assert!(!report.to_string().contains("Average bytes per packet"));
}

#[test]
fn bandwidth_is_reported_in_mib() {
    let report = Report::from_snapshot(&snapshot(&[(1, 3.0 * 1_048_576.0)], 30), WIDTH);
    assert_eq!(report.total_bandwidth_mib, 3.0);
    assert!(report.to_string().contains("TOTAL: 1 packets | 3.00 MB"));
}

#[test]
fn text_layout() {
    let report = Report::from_snapshot(&snapshot(&[(5, 0.0), (3, 0.0)], 95), WIDTH);
    let rule = "=".repeat(60);
    let expected = format!(
        "\n{rule}\nMONITORING REPORT\n{rule}\nminute 1: 5 packets | 0.00 MB\n\
         last 35 seconds: 3 packets | 0.00 MB\n{}\nTOTAL: 8 packets | 0.00 MB\n\
         Average bytes per packet: 0.00\n{rule}\n",
        "-".repeat(60)
    );
    assert_eq!(report.to_string(), expected);
}

#[test]
fn json_omits_missing_average_and_tags_labels() {
    let report = Report::from_snapshot(&snapshot(&[(0, 0.0)], 3), WIDTH);
    let value = serde_json::to_value(&report).unwrap();
    assert!(value.get("avgBytesPerPacket").is_none());
    assert_eq!(value["buckets"][0]["label"]["kind"], "remainder");
    assert_eq!(value["buckets"][0]["label"]["seconds"], 3);
}
