// sysinfo backend against the host's real interfaces

use netwatch::error::{SampleError, SetupError};
use netwatch::source::{CounterBackend, CounterKind, SysinfoBackend};
use std::time::Duration;

#[test]
fn open_counter_rejects_unknown_adapter() {
    let mut backend = SysinfoBackend::new();
    let err = backend
        .open_counter("no-such-adapter-0", CounterKind::BytesSent)
        .unwrap_err();
    assert!(matches!(err, SetupError::UnknownAdapter(name) if name == "no-such-adapter-0"));
}

#[test]
fn adapters_are_sorted_and_skip_loopback() {
    let mut backend = SysinfoBackend::new();
    let adapters = backend.adapters().unwrap();
    let mut sorted = adapters.clone();
    sorted.sort();
    assert_eq!(adapters, sorted);
    assert!(!adapters.iter().any(|a| a == "lo"));
}

#[test]
fn read_needs_two_collections() {
    let mut backend = SysinfoBackend::new();
    let Some(adapter) = backend.adapters().unwrap().into_iter().next() else {
        eprintln!("no non-loopback adapter on this host, skipping");
        return;
    };
    let rx = backend.open_counter(&adapter, CounterKind::BytesReceived).unwrap();
    let tx = backend.open_counter(&adapter, CounterKind::BytesSent).unwrap();
    assert!(matches!(backend.read(rx), Err(SampleError::NoData)));

    backend.collect().unwrap();
    assert!(matches!(backend.read(rx), Err(SampleError::NoData)));

    std::thread::sleep(Duration::from_millis(50));
    backend.collect().unwrap();
    let received = backend.read(rx).unwrap();
    let sent = backend.read(tx).unwrap();
    assert!(received.is_finite() && received >= 0.0);
    assert!(sent.is_finite() && sent >= 0.0);
}
