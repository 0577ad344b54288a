//! Timestamp helpers.
//!
//! Dispatch logs carry wall-clock plant time without a zone, so every
//! timestamp in the workspace is a [`chrono::NaiveDateTime`]. Ramp durations
//! are fractional seconds and are rounded to whole microseconds when they are
//! added to a timestamp.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike};

pub type Timestamp = NaiveDateTime;

/// Formats accepted by [`parse_timestamp`], tried in order after RFC 3339.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%H:%M %d/%m/%y",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// The Unix epoch; frequency grids are aligned relative to it.
pub fn epoch() -> Timestamp {
    NaiveDateTime::default()
}

pub fn duration_seconds(d: Duration) -> f64 {
    match d.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => d.num_milliseconds() as f64 / 1e3,
    }
}

/// Signed seconds from `from` to `to`.
pub fn seconds_between(from: Timestamp, to: Timestamp) -> f64 {
    duration_seconds(to - from)
}

/// `t + secs`, rounded to the microsecond and saturating at the calendar range.
pub fn add_seconds(t: Timestamp, secs: f64) -> Timestamp {
    let micros = (secs * 1e6).round();
    let delta = if micros.is_finite() && micros.abs() < i64::MAX as f64 {
        Duration::microseconds(micros as i64)
    } else if micros > 0.0 {
        return NaiveDateTime::MAX;
    } else {
        return NaiveDateTime::MIN;
    };
    t.checked_add_signed(delta).unwrap_or(if secs >= 0.0 {
        NaiveDateTime::MAX
    } else {
        NaiveDateTime::MIN
    })
}

/// Nanoseconds since the Unix epoch (saturating).
pub fn epoch_nanos(t: Timestamp) -> i64 {
    let since = t - epoch();
    since.num_nanoseconds().unwrap_or(if since > Duration::zero() {
        i64::MAX
    } else {
        i64::MIN
    })
}

pub fn from_epoch_nanos(nanos: i64) -> Timestamp {
    epoch() + Duration::nanoseconds(nanos)
}

/// Drop seconds and sub-second parts.
pub fn truncate_to_minute(t: Timestamp) -> Timestamp {
    t.with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(t)
}

/// Parse a timestamp cell; `None` for anything unrecognised.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(parsed);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Canonical text form used in every output table.
pub fn format_timestamp(t: Timestamp) -> String {
    t.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}
