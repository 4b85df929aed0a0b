//! Configuration loading
//!
//! Settings live in `~/.hourtrack/config.json`. Every field is optional in
//! the file; environment variables and CLI flags override it.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::Deserialize;
use tracing::debug;

use crate::types::{HourtrackError, Result};

/// Environment variable overriding the session log path
pub const ENV_SESSIONS_FILE: &str = "HOURTRACK_FILE";

/// Environment variables checked (in order) for a YouTube Data API key
pub const ENV_API_KEYS: [&str; 2] = ["YT_API_KEY", "YOUTUBE_API_KEY"];

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Path to the CSV session log
    pub sessions_file: PathBuf,
    /// Size of the recent sessions view
    pub recent_count: usize,
    /// Yearly target shown next to the total
    pub goal_hours: f64,
    pub youtube_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sessions_file: PathBuf::from("public").join("streaming_sessions.csv"),
            recent_count: 5,
            goal_hours: 1000.0,
            youtube_api_key: None,
        }
    }
}

impl Config {
    /// Default config path (`~/.hourtrack/config.json`)
    pub fn default_path() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| HourtrackError::Config("Cannot determine home directory".into()))?;
        Ok(base_dirs.home_dir().join(".hourtrack").join("config.json"))
    }

    /// Load from `path`. A missing file yields defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            HourtrackError::Config(format!("Invalid config {}: {}", path.display(), e))
        })
    }

    /// Load from an explicit path, or the default location when none is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => match Self::default_path() {
                Ok(p) => Self::load_from(&p)?,
                Err(_) => Self::default(),
            },
        };
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (injectable for tests)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(file) = lookup(ENV_SESSIONS_FILE).filter(|v| !v.trim().is_empty()) {
            debug!(%file, "session log path from environment");
            self.sessions_file = PathBuf::from(file);
        }

        if let Some(key) = ENV_API_KEYS
            .iter()
            .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
        {
            self.youtube_api_key = Some(key);
        }
    }
}
