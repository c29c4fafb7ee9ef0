// Shared test helpers
#![allow(dead_code)]

use netwatch::error::{SampleError, SetupError};
use netwatch::source::{CounterBackend, CounterId, CounterKind};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;

/// Scripted counter session: each `collect` pops the next outcome.
/// `Some((sent, received))` succeeds, `None` fails the collection.
/// An exhausted script keeps failing.
pub struct FakeCounters {
    pub adapters: Vec<String>,
    pub script: VecDeque<Option<(f64, f64)>>,
    pub current: Option<(f64, f64)>,
    pub opened: Arc<Mutex<Vec<(String, CounterKind)>>>,
    pub collects: Arc<Mutex<usize>>,
    /// Thread of every `adapters`/`collect` call.
    pub threads: Arc<Mutex<Vec<ThreadId>>>,
}

impl FakeCounters {
    pub fn new(script: Vec<Option<(f64, f64)>>) -> Self {
        Self {
            adapters: vec!["eth0".into(), "wlan0".into()],
            script: script.into(),
            current: None,
            opened: Arc::new(Mutex::new(Vec::new())),
            collects: Arc::new(Mutex::new(0)),
            threads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn without_adapters() -> Self {
        let mut fake = Self::new(vec![]);
        fake.adapters.clear();
        fake
    }
}

impl CounterBackend for FakeCounters {
    fn adapters(&mut self) -> Result<Vec<String>, SetupError> {
        self.threads.lock().unwrap().push(std::thread::current().id());
        Ok(self.adapters.clone())
    }

    fn open_counter(&mut self, adapter: &str, kind: CounterKind) -> Result<CounterId, SetupError> {
        if !self.adapters.iter().any(|a| a == adapter) {
            return Err(SetupError::UnknownAdapter(adapter.to_string()));
        }
        let mut opened = self.opened.lock().unwrap();
        opened.push((adapter.to_string(), kind));
        Ok(CounterId(opened.len() - 1))
    }

    fn collect(&mut self) -> Result<(), SampleError> {
        *self.collects.lock().unwrap() += 1;
        self.threads.lock().unwrap().push(std::thread::current().id());
        match self.script.pop_front().flatten() {
            Some(values) => {
                self.current = Some(values);
                Ok(())
            }
            None => {
                self.current = None;
                Err(SampleError::NoData)
            }
        }
    }

    fn read(&mut self, counter: CounterId) -> Result<f64, SampleError> {
        let (sent, received) = self.current.ok_or(SampleError::NoData)?;
        let kind = self.opened.lock().unwrap()[counter.0].1;
        Ok(match kind {
            CounterKind::BytesSent => sent,
            CounterKind::BytesReceived => received,
        })
    }
}

/// Minimal /proc/net/dev body with the given (name, rx_bytes, tx_bytes) rows.
pub fn net_dev(rows: &[(&str, u64, u64)]) -> String {
    let mut s = String::from(
        "Inter-|   Receive                                                |  Transmit\n \
         face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n",
    );
    for (name, rx, tx) in rows {
        s.push_str(&format!(
            "{:>6}: {} 10 0 0 0 0 0 0 {} 20 0 0 0 0 0 0\n",
            name, rx, tx
        ));
    }
    s
}
