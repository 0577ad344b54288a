//! Hourly aggregation of a fixed-frequency series.
//!
//! Every hour bucket averages the samples in a closed window that includes
//! both boundary ticks, so a complete one-minute bucket holds 61 samples.
//!
//! | Label   | Anchor `HH` covers | Window            |
//! |---------|--------------------|-------------------|
//! | `left`  | `[HH, HH+1)`       | `[HH, HH+1]`      |
//! | `right` | `(HH-1, HH]`       | `[HH-1, HH]`      |

use std::fmt;
use std::str::FromStr;

use ramptrace_core::time::seconds_between;
use ramptrace_core::{
    HourlyPoint, MegawattHours, Megawatts, RampError, RampResult, ResampledPoint, Timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frequency::Frequency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HourLabel {
    Left,
    #[default]
    Right,
}

impl HourLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            HourLabel::Left => "left",
            HourLabel::Right => "right",
        }
    }

    /// Bucket anchor a sample at `t` is grouped under.
    pub fn anchor(self, t: Timestamp) -> Timestamp {
        match self {
            HourLabel::Left => Frequency::HOUR.floor(t),
            HourLabel::Right => Frequency::HOUR.ceil(t),
        }
    }

    /// Closed sample window for a bucket anchor.
    pub fn window(self, anchor: Timestamp) -> (Timestamp, Timestamp) {
        let hour = Frequency::HOUR.duration();
        match self {
            HourLabel::Left => (anchor, anchor + hour),
            HourLabel::Right => (anchor - hour, anchor),
        }
    }
}

impl fmt::Display for HourLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HourLabel {
    type Err = RampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(HourLabel::Left),
            "right" => Ok(HourLabel::Right),
            _ => Err(RampError::InvalidLabel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourlyAverage {
    /// Time-weighted trapezoidal mean
    #[default]
    Trapezoid,
    /// Plain arithmetic mean of the samples
    SampleMean,
}

impl FromStr for HourlyAverage {
    type Err = RampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "trapezoid" => Ok(HourlyAverage::Trapezoid),
            "sample_mean" | "mean" => Ok(HourlyAverage::SampleMean),
            other => Err(RampError::Config(format!(
                "unknown hourly average '{other}' (expected trapezoid or sample_mean)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourlyOptions {
    /// Step of the input series, used for the completeness check
    pub frequency: Frequency,
    pub label: HourLabel,
    pub drop_incomplete: bool,
    pub average: HourlyAverage,
    /// Report MWh instead of average MW
    pub energy: bool,
}

impl Default for HourlyOptions {
    fn default() -> Self {
        Self {
            frequency: Frequency::MINUTE,
            label: HourLabel::Right,
            drop_incomplete: true,
            average: HourlyAverage::Trapezoid,
            energy: false,
        }
    }
}

pub fn hourly_average(
    series: &[ResampledPoint],
    options: &HourlyOptions,
) -> RampResult<Vec<HourlyPoint>> {
    let mut samples: Vec<(Timestamp, f64)> = series
        .iter()
        .filter_map(|p| p.mw.filter(|v| v.is_finite()).map(|v| (p.time, v)))
        .collect();
    samples.sort_by_key(|&(t, _)| t);

    let (Some(&(first, _)), Some(&(last, _))) = (samples.first(), samples.last()) else {
        return Ok(Vec::new());
    };

    let expected = options.frequency.expected_per_hour();
    let label = options.label;
    let mut out = Vec::new();
    let mut skipped = 0usize;

    let mut anchor = label.anchor(first);
    let last_anchor = label.anchor(last);
    while anchor <= last_anchor {
        let (lo, hi) = label.window(anchor);
        let start = samples.partition_point(|&(t, _)| t < lo);
        let end = samples.partition_point(|&(t, _)| t <= hi);
        let window = &samples[start..end];

        if window.is_empty() || (options.drop_incomplete && window.len() < expected) {
            skipped += 1;
        } else {
            let value = if options.energy {
                trapezoid_mwh(window).value()
            } else {
                match options.average {
                    HourlyAverage::Trapezoid => trapezoid_mean(window),
                    HourlyAverage::SampleMean => sample_mean(window),
                }
            };
            out.push(HourlyPoint {
                hour: anchor,
                value,
                samples: window.len(),
            });
        }
        anchor += Frequency::HOUR.duration();
    }

    debug!(
        samples = samples.len(),
        hours = out.len(),
        skipped,
        label = %label,
        "hourly aggregation"
    );
    Ok(out)
}

fn trapezoid_mwh(window: &[(Timestamp, f64)]) -> MegawattHours {
    window
        .windows(2)
        .map(|w| {
            let hours = seconds_between(w[0].0, w[1].0) / 3600.0;
            Megawatts((w[0].1 + w[1].1) * 0.5).over_hours(hours)
        })
        .sum()
}

fn trapezoid_mean(window: &[(Timestamp, f64)]) -> f64 {
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return f64::NAN;
    };
    let span_hours = seconds_between(first.0, last.0) / 3600.0;
    if span_hours <= 0.0 {
        return sample_mean(window);
    }
    trapezoid_mwh(window).average_over(span_hours).value()
}

fn sample_mean(window: &[(Timestamp, f64)]) -> f64 {
    window.iter().map(|&(_, v)| v).sum::<f64>() / window.len() as f64
}
