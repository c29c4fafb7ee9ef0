// Linux byte counters from /proc/net/dev, diffed between successive collections.

use super::{CounterBackend, CounterId, CounterKind, byte_rate};
use crate::error::{SampleError, SetupError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::time::Instant;

pub const PROC_NET_DEV: &str = "/proc/net/dev";

/// Cumulative receive/transmit byte counters for one interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceBytes {
    pub rx: u64,
    pub tx: u64,
}

/// One interface row; `bytes` is `None` when its counters are not numeric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetDevRow {
    pub name: String,
    pub bytes: Option<InterfaceBytes>,
}

/// Parses the body of /proc/net/dev: two header lines, then
/// `name: rx_bytes rx_packets ... (8 receive fields) tx_bytes ...`.
/// A bad row only affects its own interface.
pub fn parse_net_dev(content: &str) -> Vec<NetDevRow> {
    let mut out = Vec::new();
    for line in content.lines().skip(2) {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if name.is_empty() || fields.len() < 16 {
            continue;
        }
        let bytes = match (fields[0].parse::<u64>(), fields[8].parse::<u64>()) {
            (Ok(rx), Ok(tx)) => Some(InterfaceBytes { rx, tx }),
            _ => None,
        };
        out.push(NetDevRow {
            name: name.to_string(),
            bytes,
        });
    }
    out
}

#[derive(Debug)]
struct Sample {
    at: Instant,
    interfaces: HashMap<String, Option<InterfaceBytes>>,
}

#[derive(Debug)]
pub struct ProcNetDevBackend {
    path: PathBuf,
    counters: Vec<(String, CounterKind)>,
    previous: Option<Sample>,
    current: Option<Sample>,
}

impl ProcNetDevBackend {
    pub fn open() -> Result<Self, SetupError> {
        Self::with_path(PROC_NET_DEV)
    }

    pub fn with_path(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SetupError::Unavailable(format!(
                "{} not found - Linux network stats unavailable",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            counters: Vec::new(),
            previous: None,
            current: None,
        })
    }

    fn read_rows(&self) -> std::io::Result<Vec<NetDevRow>> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(parse_net_dev(&content))
    }

    /// `collect` with an explicit timestamp.
    pub fn collect_at(&mut self, at: Instant) -> Result<(), SampleError> {
        let interfaces = self
            .read_rows()?
            .into_iter()
            .map(|row| (row.name, row.bytes))
            .collect();
        self.previous = self.current.replace(Sample { at, interfaces });
        Ok(())
    }
}

impl CounterBackend for ProcNetDevBackend {
    fn adapters(&mut self) -> Result<Vec<String>, SetupError> {
        Ok(self
            .read_rows()?
            .into_iter()
            .map(|row| row.name)
            .filter(|name| name != "lo")
            .collect())
    }

    fn open_counter(&mut self, adapter: &str, kind: CounterKind) -> Result<CounterId, SetupError> {
        if !self.adapters()?.iter().any(|a| a == adapter) {
            return Err(SetupError::UnknownAdapter(adapter.to_string()));
        }
        self.counters.push((adapter.to_string(), kind));
        Ok(CounterId(self.counters.len() - 1))
    }

    fn collect(&mut self) -> Result<(), SampleError> {
        self.collect_at(Instant::now())
    }

    fn read(&mut self, counter: CounterId) -> Result<f64, SampleError> {
        let (adapter, kind) = self
            .counters
            .get(counter.0)
            .ok_or(SampleError::NoData)?;
        let (Some(prev), Some(cur)) = (&self.previous, &self.current) else {
            return Err(SampleError::NoData);
        };
        let lookup = |sample: &Sample| match sample.interfaces.get(adapter) {
            None => Err(SampleError::MissingInterface(adapter.clone())),
            Some(None) => Err(SampleError::Malformed(adapter.clone())),
            Some(Some(bytes)) => Ok(*bytes),
        };
        let before = lookup(prev)?;
        let after = lookup(cur)?;
        match kind {
            CounterKind::BytesReceived => byte_rate(before.rx, prev.at, after.rx, cur.at),
            CounterKind::BytesSent => byte_rate(before.tx, prev.at, after.tx, cur.at),
        }
    }
}
