//! Configuration management for newsdesk.
//!
//! Configuration is read from `~/.config/newsdesk/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! `NEWS_API_KEY` and `NEWS_API_URL` override the file.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_ENV: &str = "NEWS_API_KEY";
pub const API_URL_ENV: &str = "NEWS_API_URL";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub language: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".into(),
            api_key: String::new(),
            timeout_secs: 120,
            page_size: 20,
            language: "en".into(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Staleness windows for the query cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub headlines_stale_secs: u64,
    pub article_stale_secs: u64,
    pub favorites_stale_secs: u64,
    pub article_retries: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            headlines_stale_secs: 5 * 60,
            article_stale_secs: 30 * 60,
            favorites_stale_secs: 2 * 60,
            article_retries: 1,
        }
    }
}

impl CacheConfig {
    pub fn headlines_stale(&self) -> Duration {
        Duration::from_secs(self.headlines_stale_secs)
    }

    pub fn article_stale(&self) -> Duration {
        Duration::from_secs(self.article_stale_secs)
    }

    pub fn favorites_stale(&self) -> Duration {
        Duration::from_secs(self.favorites_stale_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database path. Defaults to `<data_dir>/newsdesk/newsdesk.db`.
    pub database: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`, or from the default path when `None`.
    ///
    /// A missing file is created with commented defaults. Missing fields use
    /// default values. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            Self::create_default_config(&config_path)?;
            Self::default()
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var(API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.api.api_key = key;
        }
        if let Some(url) = var(API_URL_ENV).filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
    }

    /// Get the default config file path: `~/.config/newsdesk/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("newsdesk").join("config.toml"))
    }

    /// Get the database path, falling back to `<data_dir>/newsdesk/newsdesk.db`.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.storage.database {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        let dir = data_dir.join("newsdesk");
        fs::create_dir_all(&dir).map_err(|e| ConfigError::Io {
            path: dir.clone(),
            source: e,
        })?;
        Ok(dir.join("newsdesk.db"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        tracing::info!(path = %path.display(), "created default config");
        Ok(())
    }

    fn default_config_content() -> String {
        r##"# newsdesk configuration

[api]
# NewsAPI-compatible endpoint. Overridden by NEWS_API_URL.
base_url = "https://newsapi.org/v2"

# API key sent as the apiKey query parameter. Overridden by NEWS_API_KEY.
api_key = ""

# Request timeout in seconds
timeout_secs = 120

# Headlines per page
page_size = 20

# Language used for article lookups
language = "en"

[cache]
# How long fetched data is served without re-fetching (seconds)
headlines_stale_secs = 300
article_stale_secs = 1800
favorites_stale_secs = 120

# Extra attempts for a failed single-article lookup
article_retries = 1

[storage]
# Uncomment to move the database
# database = "/path/to/newsdesk.db"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
