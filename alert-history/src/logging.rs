//! Logging configuration module
//! Structured logging with a console layer and an optional rolling JSON file

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "alert-history.log";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String, // trace, debug, info, warn, error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>, // log directory
    pub rotation: LogRotation,
    pub json_format: bool, // JSON on the console as well
}

/// Log rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            rotation: LogRotation::Daily,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Build the filter; `RUST_LOG` wins over the configured level
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Initialize the global subscriber.
    ///
    /// The returned guard flushes the file writer when dropped and must be
    /// kept alive for as long as file logging is wanted.
    pub fn init(&self) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
        let (file_layer, guard) = match self.file_path {
            Some(ref path) => {
                let file_appender = match self.rotation {
                    LogRotation::Hourly => rolling::hourly(path, LOG_FILE_NAME),
                    LogRotation::Daily => rolling::daily(path, LOG_FILE_NAME),
                    LogRotation::Never => rolling::never(path, LOG_FILE_NAME),
                };
                let (writer, guard) = non_blocking(file_appender);

                let layer = fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_ansi(false)
                    .json()
                    .with_writer(writer);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        let (console_plain, console_json) = if self.json_format {
            let layer = fmt::layer().with_target(true).json().with_writer(io::stdout);
            (None, Some(layer))
        } else {
            let layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_ansi(true)
                .with_writer(io::stdout);
            (Some(layer), None)
        };

        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(console_plain)
            .with(console_json)
            .with(file_layer)
            .try_init()?;

        tracing::info!("Logging initialized - level: {}", self.level);

        Ok(guard)
    }

    /// Initialize with environment variables
    pub fn init_from_env() -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
        Self::from_env().init()
    }

    /// Read `RUST_LOG` and `ALERT_HISTORY_LOG_PATH` over the defaults
    pub fn from_env() -> Self {
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let file_path = std::env::var("ALERT_HISTORY_LOG_PATH").ok().map(PathBuf::from);

        Self {
            level,
            file_path,
            ..Default::default()
        }
    }
}
