use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for wallshuf operations
#[derive(Error, Debug)]
pub enum WallshufError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rotation error: {0}")]
    Rotation(#[from] RotationError),

    #[error("Start handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("PID file error: {0}")]
    PidFile(#[from] PidFileError),

    #[error("Process execution error: {0}")]
    Process(#[from] ProcessError),
}

/// Configuration-related errors, including rejected start parameters
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path:?}")]
    FileRead { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse TOML configuration: {message}")]
    TomlParse { message: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Invalid start parameters: {message}")]
    InvalidStartParameters { message: String },

    #[error("Invalid file pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Failures of a single rotation. None of these stop the timer.
#[derive(Error, Debug)]
pub enum RotationError {
    #[error("No images match pattern {pattern:?}")]
    EmptyCandidateSet { pattern: String },

    #[error("All {candidates} candidate images were shown recently")]
    SelectionExhausted { candidates: usize },

    #[error("Failed to set wallpaper to {path:?}: {message}")]
    WallpaperApply { path: PathBuf, message: String },

    #[error("Invalid file pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },
}

/// Launcher <-> daemon start handshake errors
#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("Failed to read handshake message")]
    Read(#[source] std::io::Error),

    #[error("Failed to write handshake message")]
    Write(#[source] std::io::Error),

    #[error("Handshake channel closed before a message arrived")]
    Closed,

    #[error("Malformed handshake message: {message}")]
    Malformed { message: String },

    #[error("Daemon failed to start: {message}")]
    StartFailed { message: String },
}

/// PID file bookkeeping errors
#[derive(Error, Debug)]
pub enum PidFileError {
    #[error("Failed to read PID file: {path:?}")]
    FileRead { path: PathBuf, source: std::io::Error },

    #[error("Failed to write PID file: {path:?}")]
    FileWrite { path: PathBuf, source: std::io::Error },

    #[error("PID file is corrupted: {message}")]
    Corrupted { message: String },

    #[error("Daemon is not running")]
    NotRunning,

    #[error("Daemon is already running with pid {pid}")]
    AlreadyRunning { pid: i32 },
}

/// Process execution errors
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Command execution failed: {command:?}")]
    Execution { command: String, source: std::io::Error },

    #[error("Binary not found in PATH: {binary}")]
    NotFound { binary: String },

    #[error("Failed to signal process {pid}")]
    Signal { pid: i32, source: std::io::Error },
}

/// Image file validation errors
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to access image file: {path:?}")]
    FileAccess { path: PathBuf, source: std::io::Error },

    #[error("Unsupported image format: {path:?}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Image file is corrupted or invalid: {path:?}")]
    CorruptedImage { path: PathBuf },
}

// Helper traits for error conversion
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<WallshufError>,
{
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| {
            let err = e.into();
            log::debug!("{}: {}", context, err);
            err
        })
    }
}

// Convenience type alias
pub type Result<T> = std::result::Result<T, WallshufError>;

impl WallshufError {
    /// Whether the error comes from bad start parameters rather than the environment.
    pub fn is_invalid_start(&self) -> bool {
        matches!(
            self,
            WallshufError::Config(ConfigError::InvalidStartParameters { .. })
                | WallshufError::Config(ConfigError::Pattern { .. })
        )
    }
}

// Error reporting utilities
pub trait ErrorReporting {
    fn log_error(&self, context: &str);
    fn user_friendly_message(&self) -> String;
}

impl ErrorReporting for WallshufError {
    fn log_error(&self, context: &str) {
        log::error!("{}: {:?}", context, self);
    }

    fn user_friendly_message(&self) -> String {
        match self {
            WallshufError::Config(ConfigError::FileRead { path, .. }) => {
                format!("Configuration file not readable: {:?}", path)
            }
            WallshufError::Config(ConfigError::TomlParse { message }) => {
                format!("Invalid configuration format: {}", message)
            }
            WallshufError::Rotation(RotationError::EmptyCandidateSet { .. }) => {
                "No wallpapers found!".to_string()
            }
            WallshufError::PidFile(PidFileError::NotRunning) => "not running".to_string(),
            WallshufError::PidFile(PidFileError::AlreadyRunning { .. }) => {
                "Already running!".to_string()
            }
            WallshufError::Handshake(HandshakeError::StartFailed { message }) => {
                format!("error starting daemon: {}", message)
            }
            WallshufError::Process(ProcessError::NotFound { binary }) => {
                format!("{} not found. Is it installed and in PATH?", binary)
            }
            _ => self.to_string(),
        }
    }
}

impl ErrorReporting for RotationError {
    fn log_error(&self, context: &str) {
        match self {
            RotationError::WallpaperApply { .. } => log::error!("{}: {}", context, self),
            _ => log::warn!("{}: {}", context, self),
        }
    }

    fn user_friendly_message(&self) -> String {
        self.to_string()
    }
}
