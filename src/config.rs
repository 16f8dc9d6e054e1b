use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const HEVY_BASE_URL: &str = "https://api.hevyapp.com/v1";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: PathBuf,
    /// Hevy API key (required for sync)
    pub hevy_api_key: Option<String>,
    /// Hevy API base URL
    pub hevy_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self {
            database_path: PathBuf::from(&home).join(".periodiq").join("periodiq.db"),
            hevy_api_key: None,
            hevy_base_url: HEVY_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        if let Ok(db_path) = std::env::var("PERIODIQ_DATABASE_PATH") {
            config.database_path = PathBuf::from(db_path);
        }
        if let Ok(api_key) = std::env::var("HEVY_API_KEY") {
            config.hevy_api_key = Some(api_key);
        }
        if let Ok(base_url) = std::env::var("HEVY_BASE_URL") {
            config.hevy_base_url = base_url;
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/periodiq/config.yaml
    pub fn default_config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".config")
            .join("periodiq")
            .join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
