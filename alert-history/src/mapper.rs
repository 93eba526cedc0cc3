//! Conversion of raw query series into typed alert records
//!
//! Column positions are resolved by name once per series. Any required column
//! that is absent fails the whole series with `MissingColumn`; no record is
//! built from a partial layout.

use alert_history_common::{AlertRecord, Error, RawSeriesResult, Result};
use serde_json::Value;

pub const TIME_COLUMN: &str = "time";
pub const HOST_COLUMN: &str = "host";
pub const VALUE_COLUMN: &str = "value";
pub const LEVEL_COLUMN: &str = "level";
pub const NAME_COLUMN: &str = "alertName";

/// Resolved positions of the alert columns within a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub time: usize,
    pub host: usize,
    pub value: usize,
    pub level: usize,
    pub name: usize,
}

impl ColumnLayout {
    pub fn resolve(columns: &[String]) -> Result<Self> {
        let position = |wanted: &str| {
            columns
                .iter()
                .position(|column| column == wanted)
                .ok_or_else(|| Error::MissingColumn(wanted.to_string()))
        };

        Ok(Self {
            time: position(TIME_COLUMN)?,
            host: position(HOST_COLUMN)?,
            value: position(VALUE_COLUMN)?,
            level: position(LEVEL_COLUMN)?,
            name: position(NAME_COLUMN)?,
        })
    }

    /// Number of values a row needs to cover every column
    pub fn width(&self) -> usize {
        [self.time, self.host, self.value, self.level, self.name]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }

    fn record(&self, index: usize, row: &[Value]) -> Result<AlertRecord> {
        if row.len() < self.width() {
            return Err(Error::RowTooShort {
                row: index,
                len: row.len(),
                expected: self.width(),
            });
        }

        Ok(AlertRecord {
            time: display_string(&row[self.time]),
            host: row[self.host].clone(),
            value: display_string(&row[self.value]),
            level: row[self.level].clone(),
            name: display_string(&row[self.name]),
        })
    }
}

/// Build one record per row, in row order
pub fn map(raw: &RawSeriesResult) -> Result<Vec<AlertRecord>> {
    let layout = ColumnLayout::resolve(&raw.columns)?;

    raw.values
        .iter()
        .enumerate()
        .map(|(index, row)| layout.record(index, row))
        .collect()
}

/// Render a value the way the history table displays it
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() => float_string(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

// Shortest round-trip digits, so 42.0 shows as "42". Magnitudes at or above
// 1e21 or below 1e-6 switch to exponent notation with a signed exponent
// ("1e+21", "1.5e-7").
fn float_string(f: f64) -> String {
    if f == 0.0 {
        "0".to_string()
    } else if f.is_finite() && (f.abs() >= 1e21 || f.abs() < 1e-6) {
        let formatted = format!("{:e}", f);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    } else {
        f.to_string()
    }
}
