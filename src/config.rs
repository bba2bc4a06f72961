use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::layout::Size;
use crate::session::GameConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not a whole number: {0:?}")]
    NotANumber(String),
    #[error("{field} must be a non-negative number of seconds, got {value}")]
    InvalidDuration { field: &'static str, value: f64 },
}

/// User preferences. Game state is never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub target_count: i64,
    pub countdown_secs: f64,
    pub win_grace_secs: f64,
    pub autoplay_delay_secs: f64,
    pub autoplay: bool,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_count: 5,
            countdown_secs: 3.0,
            win_grace_secs: 3.0,
            autoplay_delay_secs: 1.0,
            autoplay: false,
            seed: None,
        }
    }
}

impl Config {
    /// Engine timings for a play area measured in `target_size` units
    pub fn game_config(&self, target_size: Size, margin: f64) -> Result<GameConfig, ConfigError> {
        Ok(GameConfig {
            countdown: to_duration("countdown_secs", self.countdown_secs)?,
            win_grace: to_duration("win_grace_secs", self.win_grace_secs)?,
            autoplay_delay: to_duration("autoplay_delay_secs", self.autoplay_delay_secs)?,
            target_size,
            margin,
            ..GameConfig::default()
        })
    }
}

fn to_duration(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { field, value })
}

/// Parses the contents of the points field. Blank input counts as zero,
/// which `Game::start` then refuses.
pub fn parse_target_count(input: &str) -> Result<i64, ConfigError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| ConfigError::NotANumber(input.to_string()))
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), "ignoring unreadable config: {err}");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
