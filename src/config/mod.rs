use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Countdown preset shown at launch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,

    /// Desktop notification when a run finishes
    pub notify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    /// Spin time before a drawn name is revealed
    pub draw_delay_ms: u64,

    /// Group loaded into the pool at launch
    pub names: Vec<String>,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            draw_delay_ms: 1000,
            names: Vec::new(),
        }
    }
}

impl LotteryConfig {
    pub fn draw_delay(&self) -> Duration {
        Duration::from_millis(self.draw_delay_ms)
    }
}

/// Startup settings. Read-only: the app never writes this file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub timer: TimerConfig,

    #[serde(default)]
    pub lottery: LotteryConfig,
}

impl AppConfig {
    /// Default location, `<config dir>/timedraw/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("timedraw").join("config.toml"))
    }

    /// Load from `explicit` if given (errors are returned), otherwise from the
    /// default location (problems are logged and defaults used)
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let Some(path) = Self::default_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        match Self::from_file(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
