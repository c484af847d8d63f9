use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PidFileError, Result};
use crate::signal::{is_alive, send_signal, ControlSignal};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalInfo {
    /// Interval as the user typed it, e.g. "30m".
    pub raw: String,
    pub milliseconds: u64,
}

/// Launcher-side record of a running daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: i32,
    pub interval: IntervalInfo,
    pub pattern: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl ProcessInfo {
    pub fn new(pid: i32, raw_interval: &str, interval: Duration, pattern: &str) -> Self {
        Self {
            pid,
            interval: IntervalInfo {
                raw: raw_interval.to_string(),
                milliseconds: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            },
            pattern: pattern.to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    pub fn save(&self, pid_file: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = pid_file.parent() {
            fs::create_dir_all(parent).map_err(|e| PidFileError::FileWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| PidFileError::Corrupted {
            message: e.to_string(),
        })?;

        fs::write(pid_file, json).map_err(|e| PidFileError::FileWrite {
            path: pid_file.to_path_buf(),
            source: e,
        })?;

        log::debug!("PID file saved to {:?}", pid_file);
        Ok(())
    }

    /// `Ok(None)` when no PID file exists.
    pub fn load(pid_file: &Path) -> Result<Option<Self>> {
        if !pid_file.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(pid_file).map_err(|e| PidFileError::FileRead {
            path: pid_file.to_path_buf(),
            source: e,
        })?;

        let info = serde_json::from_str(&json).map_err(|e| PidFileError::Corrupted {
            message: e.to_string(),
        })?;

        Ok(Some(info))
    }

    /// Load the record of a daemon that is still alive.
    ///
    /// A PID file left behind by a dead process is removed.
    pub fn load_running(pid_file: &Path) -> Result<Self> {
        let info = Self::load(pid_file)?.ok_or(PidFileError::NotRunning)?;

        if !info.is_alive() {
            log::info!("Removing stale PID file for dead process {}", info.pid);
            Self::remove(pid_file)?;
            return Err(PidFileError::NotRunning.into());
        }

        Ok(info)
    }

    pub fn remove(pid_file: &Path) -> Result<()> {
        match fs::remove_file(pid_file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PidFileError::FileWrite {
                path: pid_file.to_path_buf(),
                source: e,
            }
            .into()),
        }
    }

    pub fn is_alive(&self) -> bool {
        is_alive(self.pid)
    }

    pub fn signal(&self, signal: ControlSignal) -> Result<()> {
        send_signal(self.pid, signal)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::runtime_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("wallshuf.json")
    }
}
