//! Fixed-frequency resampling of event paths.
//!
//! Each path is sampled on its own: grid ticks inside the path's span are
//! interpolated between the bracketing events, flat stretches are held
//! exactly. Nothing is produced between two paths that do not touch unless
//! a [`GapPolicy`] asks for it.

use std::fmt;
use std::str::FromStr;

use ramptrace_core::time::seconds_between;
use ramptrace_core::{
    EventPath, PairIndex, RampError, RampResult, ResampledPoint, TimePoint, Timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frequency::Frequency;

/// What to emit on grid ticks that fall between two paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// No ticks in the gap.
    #[default]
    None,
    /// Ticks with no value.
    Nan,
    /// Ticks holding the previous path's last value.
    Ffill,
    /// Ticks on the straight line from the previous path's last point to
    /// the next path's first point.
    BridgeLinear,
}

impl GapPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            GapPolicy::None => "none",
            GapPolicy::Nan => "nan",
            GapPolicy::Ffill => "ffill",
            GapPolicy::BridgeLinear => "bridge_linear",
        }
    }
}

impl fmt::Display for GapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GapPolicy {
    type Err = RampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Ok(GapPolicy::None),
            "nan" => Ok(GapPolicy::Nan),
            "ffill" => Ok(GapPolicy::Ffill),
            "bridge_linear" => Ok(GapPolicy::BridgeLinear),
            _ => Err(RampError::InvalidGapPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleOptions {
    pub frequency: Frequency,
    /// Also sample event times that sit exactly on the grid
    pub include_edge_ticks: bool,
    pub gap_policy: GapPolicy,
    /// Steps smaller than this are treated as flat
    pub epsilon: f64,
    /// Report the originating segment (`3` or `3_gap`) next to each tick
    pub track_pair_index: bool,
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self {
            frequency: Frequency::MINUTE,
            include_edge_ticks: true,
            gap_policy: GapPolicy::None,
            epsilon: 1e-6,
            track_pair_index: false,
        }
    }
}

impl ResampleOptions {
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_gap_policy(mut self, policy: GapPolicy) -> Self {
        self.gap_policy = policy;
        self
    }

    pub fn validate(&self) -> RampResult<()> {
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(RampError::Config(format!(
                "epsilon must be zero or positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// A path reduced to at least two finite, time-sorted points.
struct Normalized {
    index: PairIndex,
    points: Vec<TimePoint>,
}

impl Normalized {
    fn from_path<P: EventPath>(ordinal: usize, path: &P) -> Option<Self> {
        let mut points: Vec<TimePoint> = path
            .path_points()
            .into_iter()
            .filter(|p| p.mw.is_finite())
            .collect();
        if points.len() < 2 {
            return None;
        }
        points.sort_by_key(|p| p.time);
        Some(Self {
            index: path.path_index().unwrap_or(PairIndex::Pair(ordinal)),
            points,
        })
    }

    fn first(&self) -> TimePoint {
        self.points[0]
    }

    fn last(&self) -> TimePoint {
        self.points[self.points.len() - 1]
    }
}

/// Resample every path onto one merged grid.
///
/// The result is sorted by time (by pair, then time, when pair tracking is
/// on) with one point per key; where two contributors produce the same tick
/// the later one wins.
pub fn resample<P: EventPath>(
    paths: &[P],
    options: &ResampleOptions,
) -> RampResult<Vec<ResampledPoint>> {
    options.validate()?;
    let freq = options.frequency;

    let normalized: Vec<Normalized> = paths
        .iter()
        .enumerate()
        .filter_map(|(i, path)| Normalized::from_path(i, path))
        .collect();
    if normalized.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows: Vec<(PairIndex, Timestamp, Option<f64>)> = Vec::new();

    for seg in &normalized {
        let mut ticks = freq.ticks(seg.first().time, seg.last().time);
        if options.include_edge_ticks {
            ticks.extend(
                seg.points
                    .iter()
                    .map(|p| p.time)
                    .filter(|&t| freq.is_aligned(t)),
            );
            ticks.sort();
            ticks.dedup();
        }
        rows.extend(
            interpolate(&seg.points, &ticks, options.epsilon)
                .into_iter()
                .map(|(t, mw)| (seg.index, t, Some(mw))),
        );
    }

    if options.gap_policy != GapPolicy::None {
        for pair in normalized.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let (left, right) = (prev.last(), next.first());
            if left.time >= right.time {
                continue;
            }
            for tick in gap_ticks(freq, left.time, right.time) {
                let value = match options.gap_policy {
                    GapPolicy::None => continue,
                    GapPolicy::Nan => None,
                    GapPolicy::Ffill => Some(left.mw),
                    GapPolicy::BridgeLinear => Some(linear(left, right, tick)),
                };
                rows.push((PairIndex::Gap(prev.index.pair()), tick, value));
            }
        }
    }

    let points = merge(rows, options.track_pair_index);
    debug!(
        paths = paths.len(),
        sampled = normalized.len(),
        points = points.len(),
        freq = %freq,
        gap_policy = %options.gap_policy,
        "resampled paths"
    );
    Ok(points)
}

/// Values at `ticks` from one sorted point list; both inputs ascend, so a
/// single cursor walks the events.
fn interpolate(points: &[TimePoint], ticks: &[Timestamp], eps: f64) -> Vec<(Timestamp, f64)> {
    let mut out = Vec::with_capacity(ticks.len());
    let mut k = 0;
    for &tick in ticks {
        while k + 1 < points.len() && tick > points[k + 1].time {
            k += 1;
        }
        if k + 1 >= points.len() {
            break;
        }
        let (p0, p1) = (points[k], points[k + 1]);
        let value = if tick < p0.time {
            p0.mw
        } else if seconds_between(p0.time, p1.time) <= 0.0 {
            p1.mw
        } else if (p1.mw - p0.mw).abs() <= eps {
            if tick < p1.time {
                p0.mw
            } else {
                p1.mw
            }
        } else {
            linear(p0, p1, tick)
        };
        out.push((tick, value));
    }
    out
}

fn linear(p0: TimePoint, p1: TimePoint, t: Timestamp) -> f64 {
    let span = seconds_between(p0.time, p1.time);
    if span <= 0.0 {
        return p0.mw;
    }
    let frac = (seconds_between(p0.time, t) / span).clamp(0.0, 1.0);
    p0.mw + (p1.mw - p0.mw) * frac
}

/// Grid ticks strictly inside `(end, next_start)`.
fn gap_ticks(freq: Frequency, end: Timestamp, next_start: Timestamp) -> Vec<Timestamp> {
    let first = if freq.is_aligned(end) {
        end + freq.duration()
    } else {
        freq.ceil(end)
    };
    let last = if freq.is_aligned(next_start) {
        next_start - freq.duration()
    } else {
        freq.floor(next_start)
    };
    freq.ticks_between(first, last)
}

fn merge(
    mut rows: Vec<(PairIndex, Timestamp, Option<f64>)>,
    by_pair: bool,
) -> Vec<ResampledPoint> {
    if by_pair {
        // a gap sorts after the pair it follows
        rows.sort_by_key(|&(pair, t, _)| (pair.pair(), pair.is_gap(), t));
    } else {
        rows.sort_by_key(|&(_, t, _)| t);
    }

    let mut out: Vec<ResampledPoint> = Vec::with_capacity(rows.len());
    for (pair, time, mw) in rows {
        let point = ResampledPoint {
            time,
            mw,
            pair: by_pair.then_some(pair),
        };
        match out.last_mut() {
            Some(prev) if prev.time == time && prev.pair == point.pair => *prev = point,
            _ => out.push(point),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramptrace_core::time::parse_timestamp;

    fn t(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    fn path(points: &[(&str, f64)]) -> Vec<TimePoint> {
        points.iter().map(|&(s, mw)| TimePoint::new(t(s), mw)).collect()
    }

    #[test]
    fn test_gap_policy_parse() {
        assert_eq!("ffill".parse::<GapPolicy>().unwrap(), GapPolicy::Ffill);
        assert_eq!(
            "bridge-linear".parse::<GapPolicy>().unwrap(),
            GapPolicy::BridgeLinear
        );
        assert!(matches!(
            "zero".parse::<GapPolicy>(),
            Err(RampError::InvalidGapPolicy(_))
        ));
    }

    #[test]
    fn test_flat_step_holds_until_next_event() {
        // step change at 00:02:00 without a ramp between
        let points = path(&[
            ("2024-01-01 00:00:00", 5.0),
            ("2024-01-01 00:02:00", 5.0),
            ("2024-01-01 00:02:00", 9.0),
            ("2024-01-01 00:04:00", 9.0),
        ]);
        let ticks = Frequency::MINUTE.ticks(points[0].time, points[3].time);
        let values: Vec<f64> = interpolate(&points, &ticks, 1e-6)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(values, vec![5.0, 5.0, 5.0, 9.0, 9.0]);
    }

    #[test]
    fn test_gap_ticks_exclude_boundaries() {
        let freq = Frequency::MINUTE;
        let ticks = gap_ticks(freq, t("2024-01-01 00:02:00"), t("2024-01-01 00:05:00"));
        assert_eq!(ticks, vec![t("2024-01-01 00:03:00"), t("2024-01-01 00:04:00")]);

        let ticks = gap_ticks(freq, t("2024-01-01 00:02:30"), t("2024-01-01 00:04:30"));
        assert_eq!(ticks, vec![t("2024-01-01 00:03:00"), t("2024-01-01 00:04:00")]);

        assert!(gap_ticks(freq, t("2024-01-01 00:02:00"), t("2024-01-01 00:03:00")).is_empty());
    }

    #[test]
    fn test_short_paths_are_skipped() {
        let paths = vec![path(&[("2024-01-01 00:00:00", 1.0)]), Vec::new()];
        assert!(resample(&paths, &ResampleOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_filled_ticks_tagged_as_gap() {
        let paths = vec![
            path(&[("2024-01-01 00:00:00", 10.0), ("2024-01-01 00:01:00", 10.0)]),
            path(&[("2024-01-01 00:04:00", 40.0), ("2024-01-01 00:05:00", 40.0)]),
        ];
        let options = ResampleOptions {
            track_pair_index: true,
            ..ResampleOptions::default().with_gap_policy(GapPolicy::Ffill)
        };
        let series = resample(&paths, &options).unwrap();

        let tags: Vec<Option<PairIndex>> = series.iter().map(|p| p.pair).collect();
        assert_eq!(
            tags,
            vec![
                Some(PairIndex::Pair(0)),
                Some(PairIndex::Pair(0)),
                Some(PairIndex::Gap(0)),
                Some(PairIndex::Gap(0)),
                Some(PairIndex::Pair(1)),
                Some(PairIndex::Pair(1)),
            ]
        );
        assert_eq!(series[2].time, t("2024-01-01 00:02:00"));
        assert_eq!(series[3].mw, Some(10.0));
    }

    #[test]
    fn test_bad_epsilon_rejected() {
        let options = ResampleOptions {
            epsilon: -1.0,
            ..ResampleOptions::default()
        };
        let paths: Vec<Vec<TimePoint>> = Vec::new();
        assert!(resample(&paths, &options).is_err());
    }
}
