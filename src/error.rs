// Error kinds for the monitoring engine.
// SetupError ends the owning worker; SampleError only skips one tick.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to start capture program `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("capture program `{0}` has no stdout pipe")]
    NoStdout(String),
    #[error("no network adapters available")]
    NoAdapters,
    #[error("network adapter '{0}' not found")]
    UnknownAdapter(String),
    #[error("counter source unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SampleError {
    /// Counter opened but fewer than two collections taken.
    #[error("no data yet")]
    NoData,
    #[error("interface '{0}' missing from counter snapshot")]
    MissingInterface(String),
    #[error("malformed counter line: {0}")]
    Malformed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
