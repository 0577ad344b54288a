//! Sampling frequencies and grid alignment.
//!
//! Grids are aligned to the Unix epoch, so a `"T"` grid lands on whole
//! minutes and a `"5T"` grid on minutes divisible by five.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use ramptrace_core::time::{epoch_nanos, from_epoch_nanos};
use ramptrace_core::{RampError, RampResult, Timestamp};
use serde::{Deserialize, Serialize};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency {
    seconds: i64,
}

impl Default for Frequency {
    fn default() -> Self {
        Self::MINUTE
    }
}

impl Frequency {
    pub const MINUTE: Self = Self { seconds: 60 };
    pub const HOUR: Self = Self { seconds: 3600 };

    pub fn from_seconds(seconds: i64) -> RampResult<Self> {
        if seconds <= 0 {
            return Err(RampError::InvalidFrequency(format!("{seconds}s")));
        }
        Ok(Self { seconds })
    }

    /// Parse `"T"`, `"5T"`, `"30S"`, `"1min"`, `"1h"` and bare seconds.
    pub fn parse(rule: &str) -> RampResult<Self> {
        let trimmed = rule.trim();
        let invalid = || RampError::InvalidFrequency(rule.to_string());
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (count, unit) = trimmed.split_at(split);
        let count = if count.is_empty() {
            1
        } else {
            count.parse::<i64>().map_err(|_| invalid())?
        };
        let multiplier = match unit.trim() {
            "" | "s" | "S" | "sec" => 1,
            "T" | "min" | "m" => 60,
            "H" | "h" => 3600,
            _ => return Err(invalid()),
        };

        count
            .checked_mul(multiplier)
            .filter(|secs| *secs > 0)
            .map(|seconds| Self { seconds })
            .ok_or_else(invalid)
    }

    pub fn seconds(self) -> i64 {
        self.seconds
    }

    pub fn duration(self) -> Duration {
        Duration::seconds(self.seconds)
    }

    fn step_nanos(self) -> i64 {
        self.seconds.saturating_mul(NANOS_PER_SECOND)
    }

    pub fn floor(self, t: Timestamp) -> Timestamp {
        let nanos = epoch_nanos(t);
        from_epoch_nanos(floor_bucket(nanos, self.step_nanos()))
    }

    pub fn ceil(self, t: Timestamp) -> Timestamp {
        let floored = self.floor(t);
        if floored == t {
            t
        } else {
            floored + self.duration()
        }
    }

    pub fn is_aligned(self, t: Timestamp) -> bool {
        self.floor(t) == t
    }

    /// Grid ticks in `[ceil(from), floor(to)]`.
    pub fn ticks(self, from: Timestamp, to: Timestamp) -> Vec<Timestamp> {
        self.ticks_between(self.ceil(from), self.floor(to))
    }

    /// Ticks from `first` to `last` inclusive; both must already be aligned.
    pub(crate) fn ticks_between(self, first: Timestamp, last: Timestamp) -> Vec<Timestamp> {
        let mut out = Vec::new();
        let mut tick = first;
        while tick <= last {
            out.push(tick);
            tick += self.duration();
        }
        out
    }

    /// Samples expected in a closed one-hour window, both ends included.
    pub fn expected_per_hour(self) -> usize {
        (3600 / self.seconds) as usize + 1
    }
}

impl FromStr for Frequency {
    type Err = RampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Frequency {
    type Error = RampError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Frequency> for String {
    fn from(freq: Frequency) -> Self {
        freq.to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seconds {
            s if s % 3600 == 0 => write!(f, "{}H", s / 3600),
            s if s % 60 == 0 => write!(f, "{}T", s / 60),
            s => write!(f, "{s}S"),
        }
    }
}

fn floor_bucket(ts: i64, period: i64) -> i64 {
    ts - ts.rem_euclid(period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramptrace_core::time::parse_timestamp;

    fn t(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(Frequency::parse("T").unwrap().seconds(), 60);
        assert_eq!(Frequency::parse("5T").unwrap().seconds(), 300);
        assert_eq!(Frequency::parse("30S").unwrap().seconds(), 30);
        assert_eq!(Frequency::parse("1min").unwrap().seconds(), 60);
        assert_eq!(Frequency::parse("2h").unwrap().seconds(), 7200);
        assert_eq!(Frequency::parse("15").unwrap().seconds(), 15);
        assert_eq!(Frequency::parse(" 10sec ").unwrap().seconds(), 10);
    }

    #[test]
    fn test_parse_rejects_non_positive_and_unknown() {
        for bad in ["", "0T", "-5T", "5x", "T5", "1.5T", "0"] {
            assert!(
                matches!(Frequency::parse(bad), Err(RampError::InvalidFrequency(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_alignment() {
        let freq = Frequency::parse("5T").unwrap();
        assert_eq!(freq.floor(t("2024-01-01 10:07:30")), t("2024-01-01 10:05:00"));
        assert_eq!(freq.ceil(t("2024-01-01 10:07:30")), t("2024-01-01 10:10:00"));
        assert_eq!(freq.ceil(t("2024-01-01 10:10:00")), t("2024-01-01 10:10:00"));
        assert!(freq.is_aligned(t("2024-01-01 10:15:00")));
        assert!(!freq.is_aligned(t("2024-01-01 10:15:01")));
    }

    #[test]
    fn test_alignment_before_epoch() {
        let freq = Frequency::MINUTE;
        assert_eq!(freq.floor(t("1969-12-31 23:59:30")), t("1969-12-31 23:59:00"));
    }

    #[test]
    fn test_ticks_inclusive() {
        let ticks = Frequency::MINUTE.ticks(t("2024-01-01 00:00:10"), t("2024-01-01 00:03:00"));
        assert_eq!(
            ticks,
            vec![
                t("2024-01-01 00:01:00"),
                t("2024-01-01 00:02:00"),
                t("2024-01-01 00:03:00"),
            ]
        );
        assert!(Frequency::MINUTE
            .ticks(t("2024-01-01 00:00:10"), t("2024-01-01 00:00:50"))
            .is_empty());
    }

    #[test]
    fn test_display_and_expected_count() {
        assert_eq!(Frequency::MINUTE.to_string(), "1T");
        assert_eq!(Frequency::parse("90").unwrap().to_string(), "90S");
        assert_eq!(Frequency::MINUTE.expected_per_hour(), 61);
        assert_eq!(Frequency::parse("7T").unwrap().expected_per_hour(), 9);
    }
}
