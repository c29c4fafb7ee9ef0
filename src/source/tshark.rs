// Packet lines from a tshark subprocess.

use super::{PacketSource, PacketStream};
use crate::error::SetupError;
use std::process::Stdio;
use tokio::process::Command;

/// Arguments for a line-buffered capture on `interface`.
pub fn capture_args(interface: &str, filter: Option<&str>) -> Vec<String> {
    let mut args = vec!["-i".to_string(), interface.to_string(), "-l".to_string()];
    if let Some(filter) = filter.filter(|f| !f.is_empty()) {
        args.push("-f".to_string());
        args.push(filter.to_string());
    }
    args
}

#[derive(Debug, Clone)]
pub struct TsharkSource {
    pub program: String,
    pub interface: String,
    pub filter: Option<String>,
}

impl PacketSource for TsharkSource {
    fn open(self: Box<Self>) -> Result<PacketStream, SetupError> {
        let mut child = Command::new(&self.program)
            .args(capture_args(&self.interface, self.filter.as_deref()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SetupError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let Some(stdout) = child.stdout.take() else {
            return Err(SetupError::NoStdout(self.program));
        };
        tracing::debug!(program = %self.program, pid = ?child.id(), "capture process started");
        Ok(PacketStream::with_child(stdout, child))
    }
}

/// Output of `<program> -D`: the capture interfaces, one per line.
pub async fn list_interfaces(program: &str) -> Result<String, SetupError> {
    let output = Command::new(program)
        .arg("-D")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| SetupError::Spawn {
            program: program.to_string(),
            source,
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SetupError::Unavailable(format!(
            "{} -D exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
