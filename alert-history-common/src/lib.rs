//! Common types shared between the alert history core and its consumers

pub mod durations;
pub mod series;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use durations::{DurationTable, TimeRangeOption};
pub use series::{KapacitorSummary, KapacitorsResponse, QueryResponse, RawSeriesResult, StatementResult};

/// Links a source exposes for the requests the alert history needs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceLinks {
    pub proxy: String,
    pub kapacitors: String,
}

/// Data source the alert history is bound to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>, // "influx-enterprise"
    pub links: SourceLinks,
}

/// Absolute `{lower, upper}` pair of ISO-8601 instants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub lower: String,
    pub upper: String,
}

impl TimeWindow {
    pub fn new(lower: impl Into<String>, upper: impl Into<String>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    /// Build a window from two instants, formatted as RFC 3339 in UTC
    pub fn between(lower: DateTime<Utc>, upper: DateTime<Utc>) -> Self {
        Self {
            lower: lower.to_rfc3339_opts(SecondsFormat::Secs, true),
            upper: upper.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Parse both bounds back into instants
    pub fn bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let parse = |raw: &str| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::InvalidWindow(format!("{}: {}", raw, e)))
        };

        Ok((parse(&self.lower)?, parse(&self.upper)?))
    }

    /// Check that both bounds parse and that `lower` comes before `upper`
    pub fn validate(&self) -> Result<()> {
        let (lower, upper) = self.bounds()?;
        if lower >= upper {
            return Err(Error::InvalidWindow(format!(
                "lower bound {} is not before upper bound {}",
                self.lower, self.upper
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {}", self.lower, self.upper)
    }
}

/// One alert event as displayed by the history table.
///
/// `time`, `value` and `name` are always the string rendering of whatever the
/// backend returned; `host` and `level` keep their native JSON type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRecord {
    pub time: String,
    pub host: Value,
    pub value: String,
    pub level: Value,
    pub name: String,
}

/// Alert history error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown duration label: {0}")]
    UnknownDurationLabel(String),

    #[error("Missing column in query result: {0}")]
    MissingColumn(String),

    #[error("Row {row} has {len} values, expected at least {expected}")]
    RowTooShort { row: usize, len: usize, expected: usize },

    #[error("Invalid time window: {0}")]
    InvalidWindow(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
