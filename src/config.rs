use crate::source::BackendKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "netwatch.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub bandwidth: BandwidthConfig,
    pub buckets: BucketsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture program (must support `-i`, `-l`, `-f` and `-D` like tshark).
    pub program: String,
    pub duration_secs: u64,
    /// Capture filter; empty means none.
    pub filter: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            program: "tshark".into(),
            duration_secs: 10,
            filter: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BandwidthConfig {
    pub enabled: bool,
    /// Adapter name; empty auto-selects the first one.
    pub adapter: String,
    pub backend: BackendKind,
    pub poll_interval_ms: u64,
    /// Pause after the discarded first reading.
    pub settle_delay_ms: u64,
}

impl Default for BandwidthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            adapter: String::new(),
            backend: BackendKind::Auto,
            poll_interval_ms: 1000,
            settle_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BucketsConfig {
    pub rotation_tick_ms: u64,
}

impl Default for BucketsConfig {
    fn default() -> Self {
        Self {
            rotation_tick_ms: 1000,
        }
    }
}

impl AppConfig {
    /// Loads `path`, else `CONFIG_FILE`, else `netwatch.toml` if present, else defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("CONFIG_FILE").map(PathBuf::from));
        let path = match explicit {
            Some(p) => p,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::load_from_str(&s).with_context(|| format!("loading config {}", path.display()))
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.capture.program.trim().is_empty(),
            "capture.program must be non-empty"
        );
        anyhow::ensure!(
            self.capture.duration_secs > 0,
            "capture.duration_secs must be > 0, got {}",
            self.capture.duration_secs
        );
        anyhow::ensure!(
            self.bandwidth.poll_interval_ms > 0,
            "bandwidth.poll_interval_ms must be > 0, got {}",
            self.bandwidth.poll_interval_ms
        );
        anyhow::ensure!(
            self.buckets.rotation_tick_ms > 0,
            "buckets.rotation_tick_ms must be > 0, got {}",
            self.buckets.rotation_tick_ms
        );
        Ok(())
    }

    pub fn filter(&self) -> Option<&str> {
        Some(self.capture.filter.as_str()).filter(|f| !f.is_empty())
    }

    pub fn adapter(&self) -> Option<&str> {
        Some(self.bandwidth.adapter.as_str()).filter(|a| !a.is_empty())
    }
}
