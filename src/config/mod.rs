//! Configuration management for mongoport
//!
//! Configuration is read from a TOML file (default `~/.mongoport/config.toml`)
//! and then overridden by command-line arguments. Every key is optional;
//! missing keys fall back to the defaults below.
//!
//! ```toml
//! [connection]
//! default_uri = "mongodb://localhost:27017/app"
//!
//! [export]
//! sql_batch_size = 500
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Export tuning
    #[serde(default)]
    pub export: ExportConfig,

    /// Import tuning
    #[serde(default)]
    pub import: ImportConfig,

    /// Schema scan tuning
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Background job settings
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Query history configuration
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Default MongoDB connection URI
    #[serde(default = "default_uri")]
    pub default_uri: String,

    /// Server selection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Database used by imports when the URI names none
    #[serde(default = "default_fallback_database")]
    pub fallback_database: String,

    /// Application name reported to the server
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Export batch and sample sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Documents sampled for SQL type inference and CSV headers
    #[serde(default = "default_export_sample_size")]
    pub sample_size: usize,

    /// Rows per SQL row group
    #[serde(default = "default_sql_batch_size")]
    pub sql_batch_size: usize,

    /// Cursor batch size for JSON, CSV and BSON exports
    #[serde(default = "default_stream_batch_size")]
    pub stream_batch_size: usize,
}

/// Import batch sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Documents per insert for JSON, JSON lines and CSV files
    #[serde(default = "default_json_batch_size")]
    pub json_batch_size: usize,

    /// Documents per insert for BSON files
    #[serde(default = "default_bson_batch_size")]
    pub bson_batch_size: usize,
}

/// Schema scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Documents sampled per collection
    #[serde(default = "default_schema_sample_size")]
    pub sample_size: usize,
}

/// Background job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Progress channel polling interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Progress channel capacity
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Query history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Path to the history/bookmark file
    #[serde(default = "default_history_file")]
    pub file_path: PathBuf,

    /// Maximum number of history entries
    #[serde(default = "default_max_history_entries")]
    pub max_entries: usize,
}

// Default value functions
fn default_uri() -> String {
    "mongodb://localhost:27017/test".to_string()
}

fn default_timeout() -> u64 {
    5
}

fn default_fallback_database() -> String {
    "test".to_string()
}

fn default_app_name() -> String {
    "mongoport".to_string()
}

fn default_export_sample_size() -> usize {
    100
}

fn default_sql_batch_size() -> usize {
    500
}

fn default_stream_batch_size() -> usize {
    2000
}

fn default_json_batch_size() -> usize {
    1000
}

fn default_bson_batch_size() -> usize {
    5000
}

fn default_schema_sample_size() -> usize {
    20
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_channel_capacity() -> usize {
    256
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    false
}

fn default_history_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mongoport")
        .join("query_history.json")
}

fn default_max_history_entries() -> usize {
    50
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            default_uri: default_uri(),
            timeout: default_timeout(),
            fallback_database: default_fallback_database(),
            app_name: default_app_name(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sample_size: default_export_sample_size(),
            sql_batch_size: default_sql_batch_size(),
            stream_batch_size: default_stream_batch_size(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            json_batch_size: default_json_batch_size(),
            bson_batch_size: default_bson_batch_size(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            sample_size: default_schema_sample_size(),
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file_path: default_history_file(),
            max_entries: default_max_history_entries(),
        }
    }
}

impl Config {
    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mongoport")
            .join("config.toml")
    }

    /// Load configuration from a file
    ///
    /// With `None` the default path is used; a missing default file yields
    /// the default configuration. An explicitly named file must exist.
    ///
    /// # Arguments
    /// * `path` - Optional path to a TOML configuration file
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.connection.default_uri.trim().is_empty() {
            return Err(invalid("connection.default_uri", "").into());
        }

        let sizes = [
            ("export.sample_size", self.export.sample_size),
            ("export.sql_batch_size", self.export.sql_batch_size),
            ("export.stream_batch_size", self.export.stream_batch_size),
            ("import.json_batch_size", self.import.json_batch_size),
            ("import.bson_batch_size", self.import.bson_batch_size),
            ("schema.sample_size", self.schema.sample_size),
            ("jobs.channel_capacity", self.jobs.channel_capacity),
            ("history.max_entries", self.history.max_entries),
        ];
        for (field, value) in sizes {
            if value == 0 {
                return Err(invalid(field, "0").into());
            }
        }

        if self.jobs.poll_interval_ms == 0 {
            return Err(invalid("jobs.poll_interval_ms", "0").into());
        }

        Ok(())
    }
}

impl ConnectionConfig {
    /// Get the server selection and connect timeout as Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl JobsConfig {
    /// Get the progress polling interval as Duration (never zero)
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

fn invalid(field: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.export.sql_batch_size, 500);
        assert_eq!(config.export.stream_batch_size, 2000);
        assert_eq!(config.import.json_batch_size, 1000);
        assert_eq!(config.import.bson_batch_size, 5000);
        assert_eq!(config.schema.sample_size, 20);
        assert_eq!(config.history.max_entries, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [connection]
            default_uri = "mongodb://db.internal:27017/shop"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.connection.default_uri, "mongodb://db.internal:27017/shop");
        assert_eq!(config.connection.fallback_database, "test");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.export.sample_size, 100);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_toml("[export\nsql_batch_size = ");
        assert!(matches!(
            result,
            Err(crate::error::MongoportError::Config(ConfigError::InvalidFormat(_)))
        ));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = Config::default();
        config.import.bson_batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("import.bson_batch_size"));
    }

    #[test]
    fn test_explicit_missing_file() {
        let result = Config::load_from_file(Some(Path::new("/nonexistent/mongoport.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_durations() {
        let mut config = Config::default();
        assert_eq!(config.jobs.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.connection.connection_timeout(), Duration::from_secs(5));

        config.jobs.poll_interval_ms = 0;
        assert_eq!(config.jobs.poll_interval(), Duration::from_millis(1));
    }
}
