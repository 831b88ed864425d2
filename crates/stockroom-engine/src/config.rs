//! # Engine Configuration
//!
//! Settings for the processor and its database, loaded from a TOML file
//! with environment overrides.
//!
//! ## Config Sources (in priority order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Hierarchy                              │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKROOM_DATABASE_PATH=/srv/stockroom.db                          │
//! │     STOCKROOM_MAX_CONNECTIONS=16                                       │
//! │     STOCKROOM_REQUEST_TIMEOUT_MS=5000                                  │
//! │     STOCKROOM_MAX_LINES=200                                            │
//! │     STOCKROOM_LOG=info,stockroom=trace                                 │
//! │                              │                                          │
//! │                              ▼                                          │
//! │  2. Config File                                                        │
//! │     ~/.config/stockroom/engine.toml (Linux)                            │
//! │     ~/Library/Application Support/com.stockroom.engine/engine.toml     │
//! │                              │                                          │
//! │                              ▼                                          │
//! │  3. Default Values (lowest priority)                                   │
//! │     Database in the platform data directory, 8 connections, 30s        │
//! │     request timeout, 500 lines per request                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! # engine.toml
//! [database]
//! path = "/srv/stockroom/stockroom.db"
//! max_connections = 16
//! busy_timeout_ms = 5000
//!
//! [processing]
//! max_lines = 200
//! request_timeout_ms = 10000
//!
//! [logging]
//! filter = "info,stockroom=debug,sqlx=warn"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stockroom_core::MAX_LINES_LIMIT;
use stockroom_db::DbConfig;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DATABASE_PATH_ENV: &str = "STOCKROOM_DATABASE_PATH";
pub const MAX_CONNECTIONS_ENV: &str = "STOCKROOM_MAX_CONNECTIONS";
pub const REQUEST_TIMEOUT_ENV: &str = "STOCKROOM_REQUEST_TIMEOUT_MS";
pub const MAX_LINES_ENV: &str = "STOCKROOM_MAX_LINES";
pub const LOG_ENV: &str = "STOCKROOM_LOG";

const CONFIG_FILE_NAME: &str = "engine.toml";
const DATABASE_FILE_NAME: &str = "stockroom.db";

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Could not determine a default {0} directory")]
    NoDefaultDirectory(&'static str),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file; `None` means the platform data directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_ms: u64,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: 8,
            min_connections: 1,
            connect_timeout_ms: 30_000,
            busy_timeout_ms: 5_000,
        }
    }
}

/// `[processing]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    /// Upper bound on lines in one request.
    pub max_lines: usize,
    /// Deadline for one request, from receipt to commit.
    pub request_timeout_ms: u64,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        ProcessingSettings {
            max_lines: stockroom_core::DEFAULT_MAX_LINES,
            request_timeout_ms: 30_000,
        }
    }
}

impl ProcessingSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives. `RUST_LOG` still wins when set.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: crate::telemetry::DEFAULT_FILTER.to_string(),
        }
    }
}

// =============================================================================
// Engine Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub processing: ProcessingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (engine.toml), if it exists
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Applies overrides from `lookup` (the process environment in `load`).
    ///
    /// Unparseable numbers are errors, not silently ignored: a typo in a
    /// deployment variable should stop the engine from starting.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATABASE_PATH_ENV) {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(raw) = lookup(MAX_CONNECTIONS_ENV) {
            self.database.max_connections = parse_env(MAX_CONNECTIONS_ENV, &raw)?;
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            self.processing.request_timeout_ms = parse_env(REQUEST_TIMEOUT_ENV, &raw)?;
        }

        if let Some(raw) = lookup(MAX_LINES_ENV) {
            self.processing.max_lines = parse_env(MAX_LINES_ENV, &raw)?;
        }

        if let Some(filter) = lookup(LOG_ENV) {
            self.logging.filter = filter;
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::InvalidValue(
                "database.min_connections must not exceed max_connections".into(),
            ));
        }
        if self.processing.max_lines == 0 || self.processing.max_lines > MAX_LINES_LIMIT {
            return Err(ConfigError::InvalidValue(format!(
                "processing.max_lines must be between 1 and {}",
                MAX_LINES_LIMIT
            )));
        }
        if self.processing.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "processing.request_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Database file to open: the configured path or the platform default.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = directories::ProjectDirs::from("com", "stockroom", "engine")
            .ok_or(ConfigError::NoDefaultDirectory("data"))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    /// Maps `[database]` onto the storage layer's pool settings.
    pub fn to_db_config(&self) -> ConfigResult<DbConfig> {
        let db = &self.database;
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(db.max_connections)
            .min_connections(db.min_connections)
            .connect_timeout(Duration::from_millis(db.connect_timeout_ms))
            .busy_timeout(Duration::from_millis(db.busy_timeout_ms)))
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockroom", "engine")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> ConfigResult<T> {
    raw.trim().parse().map_err(|_| {
        warn!(key, value = raw, "Unparseable configuration override");
        ConfigError::InvalidValue(key.to_string())
    })
}
