// Aggregation state: packet conservation, rotation catch-up, finalization

use netwatch::models::Bucket;
use netwatch::state::AggregationState;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

const WIDTH: Duration = Duration::from_secs(60);

fn state() -> (AggregationState, Instant) {
    let start = Instant::now();
    (AggregationState::starting_at(start, WIDTH), start)
}

#[test]
fn new_state_first_boundary_is_one_width_after_start() {
    let (state, start) = state();
    assert_eq!(state.next_boundary(), start + WIDTH);
    assert_eq!(state.current(), Bucket::default());
    assert_eq!(state.closed_len(), 0);
}

#[test]
fn rotate_before_boundary_closes_nothing() {
    let (state, start) = state();
    state.record_packet();
    assert_eq!(state.maybe_rotate(start + Duration::from_secs(59)), 0);
    assert_eq!(state.current().packets, 1);
}

#[test]
fn rotate_at_boundary_instant_closes_bucket() {
    let (state, start) = state();
    state.record_packet();
    state.record_bandwidth(10.0);
    assert_eq!(state.maybe_rotate(start + WIDTH), 1);
    assert_eq!(state.current(), Bucket::default());
    assert_eq!(state.next_boundary(), start + WIDTH * 2);
}

#[test]
fn rotate_catches_up_k_widths_with_empty_buckets() {
    let (state, start) = state();
    state.record_packet();
    state.record_packet();
    let now = start + WIDTH * 4;
    assert_eq!(state.maybe_rotate(now), 4);
    assert_eq!(state.next_boundary(), now + WIDTH);

    let snapshot = state.finalize_and_snapshot(now);
    let packets: Vec<u64> = snapshot.buckets.iter().map(|b| b.packets).collect();
    assert_eq!(packets, vec![2, 0, 0, 0, 0]);
}

#[test]
fn finalize_appends_exactly_one_zero_bucket() {
    let (state, start) = state();
    let now = start + WIDTH;
    assert_eq!(state.maybe_rotate(now), 1);
    let snapshot = state.finalize_and_snapshot(now);
    assert_eq!(snapshot.buckets.len(), 2);
    assert_eq!(snapshot.buckets[1], Bucket::default());
    assert_eq!(snapshot.elapsed, WIDTH);
}

#[test]
fn finalize_without_rotation_yields_single_bucket() {
    let (state, start) = state();
    state.record_packet();
    let snapshot = state.finalize_and_snapshot(start + Duration::from_secs(5));
    assert_eq!(snapshot.buckets, vec![Bucket { packets: 1, bandwidth: 0.0 }]);
    assert_eq!(snapshot.elapsed, Duration::from_secs(5));
}

#[test]
fn second_finalize_returns_same_snapshot_and_ignores_late_records() {
    let (state, start) = state();
    state.record_packet();
    let first = state.finalize_and_snapshot(start + Duration::from_secs(5));
    state.record_packet();
    state.record_bandwidth(100.0);
    assert_eq!(state.maybe_rotate(start + WIDTH * 3), 0);
    let second = state.finalize_and_snapshot(start + Duration::from_secs(50));
    assert_eq!(first, second);
}

#[test]
fn invalid_bandwidth_samples_are_discarded() {
    let (state, _) = state();
    state.record_bandwidth(-5.0);
    state.record_bandwidth(f64::NAN);
    state.record_bandwidth(f64::INFINITY);
    state.record_bandwidth(0.0);
    state.record_bandwidth(1.5);
    assert_eq!(state.current().bandwidth, 1.5);
}

#[test]
fn concurrent_packets_and_rotations_conserve_total() {
    let (state, start) = state();
    let state = Arc::new(state);
    let threads = 8;
    let per_thread = 5_000;

    let mut handles = Vec::new();
    for _ in 0..threads {
        let state = state.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..per_thread {
                state.record_packet();
            }
        }));
    }
    let rotator = {
        let state = state.clone();
        std::thread::spawn(move || {
            for k in 1..=20u32 {
                state.maybe_rotate(start + WIDTH * k);
                std::thread::yield_now();
            }
        })
    };
    for h in handles {
        h.join().unwrap();
    }
    rotator.join().unwrap();

    let snapshot = state.finalize_and_snapshot(start + WIDTH * 20);
    assert_eq!(snapshot.buckets.len(), 21);
    assert_eq!(snapshot.total_packets(), (threads * per_thread) as u64);
}

#[test]
#[should_panic(expected = "bucket width must be non-zero")]
fn zero_bucket_width_panics() {
    let _ = AggregationState::starting_at(Instant::now(), Duration::ZERO);
}
