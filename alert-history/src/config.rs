//! Configuration for the alert history client
//!
//! Settings are read from a TOML file; every section is optional and falls
//! back to the defaults the dashboard ships with.

use alert_history_common::{DurationTable, Error};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::logging::LoggingConfig;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertHistoryConfig {
    /// HTTP client settings
    pub http: HttpConfig,
    /// Alert query settings
    pub query: QueryConfig,
    /// Relative durations offered by the time picker
    pub time_ranges: DurationTable,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Bearer token sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Alert query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Database the alerting engine writes events to
    pub database: String,
    /// Retention policy, server default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_policy: Option<String>,
    /// Measurement holding alert events
    pub measurement: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            token: None,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            database: "chronograf".to_string(),
            retention_policy: None,
            measurement: "alerts".to_string(),
        }
    }
}

impl AlertHistoryConfig {
    /// Load configuration from a TOML file, or defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))?;

        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check values the client cannot work with
    pub fn validate(&self) -> alert_history_common::Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(Error::InvalidConfig("http.timeout_secs must be greater than zero".to_string()));
        }
        if self.query.database.trim().is_empty() {
            return Err(Error::InvalidConfig("query.database cannot be empty".to_string()));
        }
        if self.query.measurement.trim().is_empty() {
            return Err(Error::InvalidConfig("query.measurement cannot be empty".to_string()));
        }
        self.time_ranges.validate()
    }
}
