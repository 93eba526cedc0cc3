//! Relative duration table used to turn picker labels into seconds

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{Error, Result};

/// Prefix the dashboard uses when a relative duration is passed as a lower bound
const RELATIVE_PREFIX: &str = "now() - ";

/// One selectable relative duration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRangeOption {
    pub label: String, // "1h"
    pub seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_option: Option<String>, // "Past 1 hour"
}

impl TimeRangeOption {
    pub fn new(label: &str, seconds: u64, menu_option: &str) -> Self {
        Self {
            label: label.to_string(),
            seconds,
            menu_option: Some(menu_option.to_string()),
        }
    }

    /// The lower-bound expression for this duration, e.g. `now() - 1h`
    pub fn lower_expression(&self) -> String {
        format!("{}{}", RELATIVE_PREFIX, self.label)
    }
}

/// Read-only lookup from duration label to seconds, kept in menu order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DurationTable {
    entries: Vec<TimeRangeOption>,
}

impl DurationTable {
    pub fn new(entries: Vec<TimeRangeOption>) -> Self {
        Self { entries }
    }

    /// Seconds for a label; accepts both `1h` and `now() - 1h`
    pub fn seconds_for(&self, label: &str) -> Option<u64> {
        let label = normalize_label(label);
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.seconds)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeRangeOption> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject zero durations and duplicate labels
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if entry.label.trim().is_empty() {
                return Err(Error::InvalidConfig("duration label cannot be empty".to_string()));
            }
            if entry.seconds == 0 {
                return Err(Error::InvalidConfig(format!(
                    "duration {} must be longer than zero seconds",
                    entry.label
                )));
            }
            if !seen.insert(entry.label.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate duration label {}",
                    entry.label
                )));
            }
        }
        Ok(())
    }
}

impl Default for DurationTable {
    fn default() -> Self {
        Self::new(vec![
            TimeRangeOption::new("5m", 300, "Past 5 minutes"),
            TimeRangeOption::new("15m", 900, "Past 15 minutes"),
            TimeRangeOption::new("1h", 3600, "Past 1 hour"),
            TimeRangeOption::new("6h", 21600, "Past 6 hours"),
            TimeRangeOption::new("12h", 43200, "Past 12 hours"),
            TimeRangeOption::new("24h", 86400, "Past 24 hours"),
            TimeRangeOption::new("2d", 172800, "Past 2 days"),
            TimeRangeOption::new("7d", 604800, "Past 7 days"),
            TimeRangeOption::new("30d", 2592000, "Past 30 days"),
        ])
    }
}

fn normalize_label(label: &str) -> &str {
    let label = label.trim();
    label.strip_prefix(RELATIVE_PREFIX).unwrap_or(label).trim()
}
