use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wallshuf_common::error::ConfigError;
use wallshuf_common::{
    image_pattern, Backend, ExhaustionPolicy, ProcessInfo, Result, StartMessage, WallshufError,
    DEFAULT_GLOB, DEFAULT_HISTORY_SIZE, MAX_HISTORY_SIZE,
};

// Accepts the same interval strings as the command line, including "5 minutes"
fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let duration_str = String::deserialize(deserializer)?;
    wallshuf_common::parse_duration(&duration_str).map_err(serde::de::Error::custom)
}

/// Persistent defaults read from `$XDG_CONFIG_HOME/wallshuf/config.toml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_glob")]
    pub glob: String,
    #[serde(
        default = "default_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "humantime_serde::serialize"
    )]
    pub interval: Duration,
    #[serde(default)]
    pub notify: bool,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default)]
    pub on_exhausted: ExhaustionPolicy,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub pid_file: Option<PathBuf>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line. Anything set here wins over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub directory: Option<PathBuf>,
    pub glob: Option<String>,
    pub interval: Option<Duration>,
    pub notify: bool,
    pub pid_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

fn default_glob() -> String {
    DEFAULT_GLOB.to_string()
}

fn default_interval() -> Duration {
    Duration::from_secs(300) // 5 minutes
}

fn default_history_size() -> usize {
    DEFAULT_HISTORY_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: None,
            glob: default_glob(),
            interval: default_interval(),
            notify: false,
            history_size: default_history_size(),
            on_exhausted: ExhaustionPolicy::default(),
            backend: Backend::default(),
            pid_file: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load the user config, falling back to defaults when there is none.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            log::debug!("No config file at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WallshufError::Config(ConfigError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            WallshufError::Config(ConfigError::TomlParse {
                message: e.to_string(),
            })
        })?;

        config.validate()?;
        log::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(WallshufError::Config(ConfigError::NoConfigDir))?
            .join("wallshuf");

        Ok(config_dir.join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval < Duration::from_secs(1) {
            return Err(WallshufError::Config(ConfigError::InvalidValue {
                field: "interval".to_string(),
                value: format!("{:?}", self.interval),
            }));
        }

        if !(1..=MAX_HISTORY_SIZE).contains(&self.history_size) {
            return Err(WallshufError::Config(ConfigError::InvalidValue {
                field: "history_size".to_string(),
                value: self.history_size.to_string(),
            }));
        }

        if self.glob.trim().is_empty() {
            return Err(WallshufError::Config(ConfigError::InvalidValue {
                field: "glob".to_string(),
                value: format!("{:?}", self.glob),
            }));
        }

        Ok(())
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(directory) = overrides.directory {
            self.directory = Some(directory);
        }
        if let Some(glob) = overrides.glob {
            self.glob = glob;
        }
        if let Some(interval) = overrides.interval {
            self.interval = interval;
        }
        // A flag can only switch notifications on
        self.notify |= overrides.notify;
        if let Some(pid_file) = overrides.pid_file {
            self.pid_file = Some(pid_file);
        }
        if let Some(log_file) = overrides.log_file {
            self.log_file = Some(log_file);
        }

        self.validate()?;
        Ok(self)
    }

    /// Image directory as an absolute path; the current directory when unset.
    pub fn directory(&self) -> PathBuf {
        let directory = self
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        std::path::absolute(&directory).unwrap_or(directory)
    }

    pub fn pattern(&self) -> String {
        image_pattern(&self.directory(), &self.glob)
    }

    pub fn pid_file(&self) -> PathBuf {
        self.pid_file
            .clone()
            .unwrap_or_else(ProcessInfo::default_path)
    }

    pub fn start_message(&self) -> StartMessage {
        let mut message = StartMessage::new(self.pattern(), self.interval, self.notify);
        message.history_size = Some(self.history_size);
        message.on_exhausted = Some(self.on_exhausted);
        message.backend = Some(self.backend);
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.glob, "*.{png,jpg,jpeg}");
        assert_eq!(config.interval, Duration::from_secs(300));
        assert!(!config.notify);
        assert_eq!(config.history_size, 3);
        assert_eq!(config.on_exhausted, ExhaustionPolicy::Skip);
        assert_eq!(config.backend, Backend::Native);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_interval_deserialization() {
        let config: Config = toml::from_str(r#"interval = "90s""#).unwrap();
        assert_eq!(config.interval, Duration::from_secs(90));

        let config: Config = toml::from_str(r#"interval = "30 minutes""#).unwrap();
        assert_eq!(config.interval, Duration::from_secs(1800));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.interval = Duration::from_millis(500);
        assert!(matches!(
            config.validate(),
            Err(WallshufError::Config(ConfigError::InvalidValue { ref field, .. }))
                if field == "interval"
        ));

        config.interval = Duration::from_secs(60);
        config.history_size = 0;
        assert!(config.validate().is_err());

        config.history_size = 1 << 60;
        assert!(matches!(
            config.validate(),
            Err(WallshufError::Config(ConfigError::InvalidValue { ref field, .. }))
                if field == "history_size"
        ));

        config.history_size = 3;
        config.glob = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config_content = r#"
            directory = "/home/user/wallpapers"
            glob = "*.png"
            interval = "15m"
            notify = true
            history_size = 5
            on_exhausted = "repeat"
            backend = "swww"
            log_file = "/tmp/wallshuf.log"
        "#;
        fs::write(&config_path, config_content).unwrap();

        let config = Config::load_from_path(&config_path).unwrap();
        assert_eq!(config.directory, Some(PathBuf::from("/home/user/wallpapers")));
        assert_eq!(config.interval, Duration::from_secs(900));
        assert!(config.notify);
        assert_eq!(config.history_size, 5);
        assert_eq!(config.on_exhausted, ExhaustionPolicy::Repeat);
        assert_eq!(config.backend, Backend::Swww);
        assert_eq!(config.pattern(), "/home/user/wallpapers/*.png");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/wallshuf.log")));
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        match Config::load_from_path(&config_path).unwrap_err() {
            WallshufError::Config(ConfigError::FileRead { .. }) => {}
            other => panic!("Expected ConfigError::FileRead, got {:?}", other),
        }
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        fs::write(&config_path, r#"interval = "whenever""#).unwrap();

        match Config::load_from_path(&config_path).unwrap_err() {
            WallshufError::Config(ConfigError::TomlParse { .. }) => {}
            other => panic!("Expected ConfigError::TomlParse, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides_win_over_file() {
        let config: Config = toml::from_str(
            r#"
            directory = "/srv/walls"
            interval = "1h"
            notify = true
        "#,
        )
        .unwrap();

        let config = config
            .with_overrides(Overrides {
                glob: Some("*.jpg".to_string()),
                interval: Some(Duration::from_secs(30)),
                pid_file: Some(PathBuf::from("/tmp/ws.json")),
                ..Overrides::default()
            })
            .unwrap();

        assert_eq!(config.pattern(), "/srv/walls/*.jpg");
        assert_eq!(config.interval, Duration::from_secs(30));
        assert!(config.notify);
        assert_eq!(config.pid_file(), PathBuf::from("/tmp/ws.json"));
    }

    #[test]
    fn test_overrides_are_validated() {
        let result = Config::default().with_overrides(Overrides {
            interval: Some(Duration::from_millis(10)),
            ..Overrides::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_start_message_carries_settings() {
        let config = Config {
            directory: Some(PathBuf::from("/srv/walls")),
            history_size: 4,
            on_exhausted: ExhaustionPolicy::Repeat,
            ..Config::default()
        };

        let message = config.start_message();
        assert_eq!(message.pattern, "/srv/walls/*.{png,jpg,jpeg}");
        assert_eq!(message.interval_millis, 300_000);
        assert_eq!(message.history_size, Some(4));
        assert_eq!(message.on_exhausted, Some(ExhaustionPolicy::Repeat));
        assert_eq!(message.backend, Some(Backend::Native));
    }

    #[test]
    fn test_relative_directory_is_made_absolute() {
        let config = Config {
            directory: Some(PathBuf::from("walls")),
            ..Config::default()
        };
        assert!(config.directory().is_absolute());
        assert!(config.directory().ends_with("walls"));
    }
}
