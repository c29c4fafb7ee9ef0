// Native OS byte counters via sysinfo (Windows and other non-Linux targets).

use super::{CounterBackend, CounterId, CounterKind, byte_rate};
use crate::error::{SampleError, SetupError};
use std::collections::HashMap;
use sysinfo::Networks;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Totals {
    rx: u64,
    tx: u64,
}

pub struct SysinfoBackend {
    networks: Networks,
    counters: Vec<(String, CounterKind)>,
    previous: Option<(Instant, HashMap<String, Totals>)>,
    current: Option<(Instant, HashMap<String, Totals>)>,
}

impl Default for SysinfoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoBackend {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
            counters: Vec::new(),
            previous: None,
            current: None,
        }
    }

    fn totals(&self) -> HashMap<String, Totals> {
        self.networks
            .list()
            .iter()
            .map(|(name, data)| {
                (
                    name.clone(),
                    Totals {
                        rx: data.total_received(),
                        tx: data.total_transmitted(),
                    },
                )
            })
            .collect()
    }
}

impl CounterBackend for SysinfoBackend {
    fn adapters(&mut self) -> Result<Vec<String>, SetupError> {
        self.networks.refresh(true);
        let mut names: Vec<String> = self
            .networks
            .list()
            .keys()
            .filter(|name| !is_loopback(name))
            .cloned()
            .collect();
        // HashMap order is random; keep "first adapter" stable across calls.
        names.sort();
        Ok(names)
    }

    fn open_counter(&mut self, adapter: &str, kind: CounterKind) -> Result<CounterId, SetupError> {
        if !self.networks.list().contains_key(adapter) {
            return Err(SetupError::UnknownAdapter(adapter.to_string()));
        }
        self.counters.push((adapter.to_string(), kind));
        Ok(CounterId(self.counters.len() - 1))
    }

    fn collect(&mut self) -> Result<(), SampleError> {
        self.networks.refresh(true);
        let now = Instant::now();
        let totals = self.totals();
        self.previous = self.current.replace((now, totals));
        Ok(())
    }

    fn read(&mut self, counter: CounterId) -> Result<f64, SampleError> {
        let (adapter, kind) = self
            .counters
            .get(counter.0)
            .ok_or(SampleError::NoData)?;
        let (Some((prev_at, prev)), Some((cur_at, cur))) = (&self.previous, &self.current) else {
            return Err(SampleError::NoData);
        };
        let missing = || SampleError::MissingInterface(adapter.clone());
        let before = prev.get(adapter).ok_or_else(missing)?;
        let after = cur.get(adapter).ok_or_else(missing)?;
        match kind {
            CounterKind::BytesReceived => byte_rate(before.rx, *prev_at, after.rx, *cur_at),
            CounterKind::BytesSent => byte_rate(before.tx, *prev_at, after.tx, *cur_at),
        }
    }
}

fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0") || name.to_ascii_lowercase().contains("loopback")
}
