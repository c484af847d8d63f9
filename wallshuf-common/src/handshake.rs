//! Start handshake between the launcher and a freshly spawned daemon.
//!
//! The launcher writes one [`StartMessage`] JSON line to the daemon's stdin;
//! the daemon answers with one [`StatusMessage`] line on stdout once its
//! first rotation has finished (or failed).

use std::io::{BufRead, Write};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::candidates::validate_pattern;
use crate::error::{ConfigError, HandshakeError};
use crate::history::{DEFAULT_HISTORY_SIZE, MAX_HISTORY_SIZE};
use crate::selector::ExhaustionPolicy;
use crate::wallpaper::Backend;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMessage {
    pub pattern: String,
    /// Signed so that a non-positive interval reaches validation instead of
    /// failing as malformed JSON.
    pub interval_millis: i64,
    #[serde(default)]
    pub notify: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_exhausted: Option<ExhaustionPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
}

impl StartMessage {
    pub fn new(pattern: impl Into<String>, interval: Duration, notify: bool) -> Self {
        Self {
            pattern: pattern.into(),
            interval_millis: i64::try_from(interval.as_millis()).unwrap_or(i64::MAX),
            notify,
            history_size: None,
            on_exhausted: None,
            backend: None,
        }
    }
}

/// Daemon reply. `{"running": true}` is the ready message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusMessage {
    pub fn ready() -> Self {
        Self {
            running: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            running: false,
            error: Some(message.into()),
        }
    }
}

/// Settings fixed for the whole lifetime of a daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    pub pattern: String,
    pub interval: Duration,
    pub notify: bool,
    pub history_size: usize,
    pub on_exhausted: ExhaustionPolicy,
    pub backend: Backend,
}

impl RotationConfig {
    pub fn new(pattern: impl Into<String>, interval: Duration, notify: bool) -> Self {
        Self {
            pattern: pattern.into(),
            interval,
            notify,
            history_size: DEFAULT_HISTORY_SIZE,
            on_exhausted: ExhaustionPolicy::default(),
            backend: Backend::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::InvalidStartParameters {
                message: "interval must be positive".to_string(),
            });
        }
        if !(1..=MAX_HISTORY_SIZE).contains(&self.history_size) {
            return Err(ConfigError::InvalidStartParameters {
                message: format!(
                    "history size must be between 1 and {}, got {}",
                    MAX_HISTORY_SIZE, self.history_size
                ),
            });
        }
        validate_pattern(&self.pattern)
    }
}

impl TryFrom<StartMessage> for RotationConfig {
    type Error = ConfigError;

    fn try_from(message: StartMessage) -> Result<Self, Self::Error> {
        let millis = u64::try_from(message.interval_millis)
            .ok()
            .filter(|millis| *millis > 0)
            .ok_or_else(|| ConfigError::InvalidStartParameters {
                message: format!(
                    "intervalMillis must be positive, got {}",
                    message.interval_millis
                ),
            })?;

        let config = Self {
            pattern: message.pattern,
            interval: Duration::from_millis(millis),
            notify: message.notify,
            history_size: message.history_size.unwrap_or(DEFAULT_HISTORY_SIZE),
            on_exhausted: message.on_exhausted.unwrap_or_default(),
            backend: message.backend.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Read one JSON line.
pub fn read_message<T, R>(reader: &mut R) -> Result<T, HandshakeError>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let mut line = String::new();
    let read = reader.read_line(&mut line).map_err(HandshakeError::Read)?;
    if read == 0 {
        return Err(HandshakeError::Closed);
    }

    serde_json::from_str(line.trim()).map_err(|e| HandshakeError::Malformed {
        message: e.to_string(),
    })
}

/// Write one JSON line and flush it.
pub fn write_message<T, W>(writer: &mut W, message: &T) -> Result<(), HandshakeError>
where
    T: Serialize,
    W: Write,
{
    let json = serde_json::to_string(message).map_err(|e| HandshakeError::Malformed {
        message: e.to_string(),
    })?;
    writeln!(writer, "{}", json).map_err(HandshakeError::Write)?;
    writer.flush().map_err(HandshakeError::Write)
}
