// Sample sources: the packet line stream and the byte-rate counter backends.

mod procfs;
mod sysinfo_backend;
mod tshark;

pub use procfs::{InterfaceBytes, NetDevRow, PROC_NET_DEV, ProcNetDevBackend, parse_net_dev};
pub use sysinfo_backend::SysinfoBackend;
pub use tshark::{TsharkSource, capture_args, list_interfaces};

use crate::error::{SampleError, SetupError};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::process::Child;
use tokio::time::Instant;

/// Lazy, non-restartable sequence of captured lines, optionally backed by a child process.
pub struct PacketStream {
    lines: Lines<Box<dyn AsyncBufRead + Send + Unpin>>,
    child: Option<Child>,
}

impl PacketStream {
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(BufReader::new(reader));
        Self {
            lines: reader.lines(),
            child: None,
        }
    }

    pub(crate) fn with_child<R>(reader: R, child: Child) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut stream = Self::from_reader(reader);
        stream.child = Some(child);
        stream
    }

    /// Next line, `Ok(None)` once the producer has closed its end. Cancel-safe.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }

    /// Terminates and reaps the producing process, if any.
    pub async fn shutdown(mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Err(e) = child.start_kill() {
            // InvalidInput means the process already exited.
            if e.kind() != std::io::ErrorKind::InvalidInput {
                tracing::warn!(error = %e, operation = "kill_capture", "failed to stop capture process");
            }
        }
        match child.wait().await {
            Ok(status) => tracing::debug!(%status, "capture process exited"),
            Err(e) => tracing::warn!(error = %e, operation = "wait_capture", "failed to reap capture process"),
        }
    }
}

/// Something that can start producing packet lines.
pub trait PacketSource: Send {
    fn open(self: Box<Self>) -> Result<PacketStream, SetupError>;
}

impl PacketSource for PacketStream {
    fn open(self: Box<Self>) -> Result<PacketStream, SetupError> {
        Ok(*self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    BytesSent,
    BytesReceived,
}

impl CounterKind {
    pub fn name(self) -> &'static str {
        match self {
            CounterKind::BytesSent => "Bytes Sent/sec",
            CounterKind::BytesReceived => "Bytes Received/sec",
        }
    }
}

/// Handle to a counter opened on a [`CounterBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterId(pub usize);

/// One counter query session: every counter opened on it is refreshed by a single `collect`.
pub trait CounterBackend: Send {
    /// Adapter names in the backend's preferred order.
    fn adapters(&mut self) -> Result<Vec<String>, SetupError>;

    fn open_counter(&mut self, adapter: &str, kind: CounterKind) -> Result<CounterId, SetupError>;

    /// Refreshes every opened counter.
    fn collect(&mut self) -> Result<(), SampleError>;

    /// Rate in bytes/sec between the last two collections.
    fn read(&mut self, counter: CounterId) -> Result<f64, SampleError>;
}

/// Bytes/sec between two cumulative counter readings. A counter that went
/// backwards (interface re-created) yields zero.
pub fn byte_rate(
    before: u64,
    before_at: Instant,
    after: u64,
    after_at: Instant,
) -> Result<f64, SampleError> {
    let secs = after_at.saturating_duration_since(before_at).as_secs_f64();
    if secs <= 0.0 {
        return Err(SampleError::NoData);
    }
    Ok(after.saturating_sub(before) as f64 / secs)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Auto,
    Procfs,
    Sysinfo,
}

impl BackendKind {
    /// Resolves `Auto` for the running platform.
    pub fn resolve(self) -> BackendKind {
        match self {
            BackendKind::Auto if cfg!(target_os = "linux") => BackendKind::Procfs,
            BackendKind::Auto => BackendKind::Sysinfo,
            other => other,
        }
    }

    pub fn open(self) -> Result<Box<dyn CounterBackend>, SetupError> {
        match self.resolve() {
            BackendKind::Procfs => Ok(Box::new(ProcNetDevBackend::open()?)),
            _ => Ok(Box::new(SysinfoBackend::new())),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendKind::Auto),
            "procfs" => Ok(BackendKind::Procfs),
            "sysinfo" => Ok(BackendKind::Sysinfo),
            other => Err(format!("unknown counter backend '{}'", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::Auto => "auto",
            BackendKind::Procfs => "procfs",
            BackendKind::Sysinfo => "sysinfo",
        };
        f.write_str(s)
    }
}
