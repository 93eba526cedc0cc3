//! Resolution of the initial alert history window

use alert_history_common::{DurationTable, Error, Result, TimeWindow};
use chrono::{DateTime, Duration, Utc};

/// Window length used when no hint is given
pub const DEFAULT_WINDOW_SECS: u64 = 86400;

/// Turn an optional relative-duration hint into an absolute window ending at `now`.
///
/// The hint may be a bare label (`1h`) or the dashboard's lower-bound
/// expression (`now() - 1h`); either must exist in `durations`.
pub fn resolve(hint: Option<&str>, durations: &DurationTable, now: DateTime<Utc>) -> Result<TimeWindow> {
    let seconds = match hint {
        Some(label) => durations
            .seconds_for(label)
            .ok_or_else(|| Error::UnknownDurationLabel(label.to_string()))?,
        None => DEFAULT_WINDOW_SECS,
    };

    let span = i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| Error::InvalidWindow(format!("duration of {} seconds is out of range", seconds)))?;
    let lower = now
        .checked_sub_signed(span)
        .ok_or_else(|| Error::InvalidWindow(format!("{} seconds before {} is out of range", seconds, now)))?;

    Ok(TimeWindow::between(lower, now))
}
