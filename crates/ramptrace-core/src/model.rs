//! Dispatch commands, trajectory segments and the series derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RampError, RampResult};
use crate::time::{seconds_between, Timestamp};
use crate::units::Megawatts;

/// One dispatch instruction: reach `target_mw`, issued at `time`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub time: Timestamp,
    pub target_mw: Megawatts,
    /// Historical "stop command" flag. Carried for compatibility with the
    /// source logs; it does not influence trajectory building.
    #[serde(default)]
    pub stop_flag: bool,
}

impl Command {
    pub fn new(time: Timestamp, target_mw: f64) -> Self {
        Self {
            time,
            target_mw: Megawatts(target_mw),
            stop_flag: false,
        }
    }

    pub fn with_stop_flag(mut self, flag: bool) -> Self {
        self.stop_flag = flag;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Start,
    HoldStart,
    HoldEnd,
    Finish,
    CutByOverwrite,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::HoldStart => "hold_start",
            EventKind::HoldEnd => "hold_end",
            EventKind::Finish => "finish",
            EventKind::CutByOverwrite => "cut_by_overwrite",
        }
    }

    pub fn is_hold(self) -> bool {
        matches!(self, EventKind::HoldStart | EventKind::HoldEnd)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = RampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "start" => Ok(EventKind::Start),
            "hold_start" => Ok(EventKind::HoldStart),
            "hold_end" => Ok(EventKind::HoldEnd),
            "finish" => Ok(EventKind::Finish),
            "cut_by_overwrite" => Ok(EventKind::CutByOverwrite),
            other => Err(RampError::Parse(format!("unknown event kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub time: Timestamp,
    pub mw: Megawatts,
}

impl Event {
    pub fn new(kind: EventKind, time: Timestamp, mw: Megawatts) -> Self {
        Self { kind, time, mw }
    }
}

/// A bare (time, MW) sample used as resampler input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub time: Timestamp,
    pub mw: f64,
}

impl TimePoint {
    pub fn new(time: Timestamp, mw: f64) -> Self {
        Self { time, mw }
    }
}

/// Anything that can be flattened into an ordered list of (time, MW) points.
///
/// Trajectory segments, fixed start-up/shutdown timelines and plain point
/// vectors all go through the same resampler via this trait.
pub trait EventPath {
    fn path_points(&self) -> Vec<TimePoint>;

    /// Segment identity reported next to resampled ticks, when tracked.
    fn path_index(&self) -> Option<PairIndex> {
        None
    }
}

impl EventPath for Vec<TimePoint> {
    fn path_points(&self) -> Vec<TimePoint> {
        self.clone()
    }
}

impl EventPath for [TimePoint] {
    fn path_points(&self) -> Vec<TimePoint> {
        self.to_vec()
    }
}

impl<T: EventPath + ?Sized> EventPath for &T {
    fn path_points(&self) -> Vec<TimePoint> {
        (**self).path_points()
    }

    fn path_index(&self) -> Option<PairIndex> {
        (**self).path_index()
    }
}

/// Plateau at a regulatory threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldWindow {
    pub level: Megawatts,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl HoldWindow {
    pub fn contains(&self, t: Timestamp) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn duration_seconds(&self) -> f64 {
        seconds_between(self.start, self.end)
    }
}

/// Identifies a segment within one build: the command pair it came from, or
/// the flat gap inserted after that pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PairIndex {
    Pair(usize),
    Gap(usize),
}

impl PairIndex {
    /// Index of the originating command pair.
    pub fn pair(self) -> usize {
        match self {
            PairIndex::Pair(i) | PairIndex::Gap(i) => i,
        }
    }

    pub fn is_gap(self) -> bool {
        matches!(self, PairIndex::Gap(_))
    }
}

impl fmt::Display for PairIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairIndex::Pair(i) => write!(f, "{i}"),
            PairIndex::Gap(i) => write!(f, "{i}_gap"),
        }
    }
}

/// The realizable path between two consecutive commands.
///
/// Invariants (checked by [`TrajectorySegment::new`]): the first event is
/// `start`, the last is `finish`, every event lies within
/// `[start.time, finish.time]`, and at most one ordered
/// `hold_start <= hold_end <= finish` pair is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectorySegment {
    index: PairIndex,
    events: Vec<Event>,
}

impl TrajectorySegment {
    pub fn new(index: PairIndex, events: Vec<Event>) -> RampResult<Self> {
        let (first, last) = match (events.first(), events.last()) {
            (Some(first), Some(last)) if events.len() >= 2 => (*first, *last),
            _ => {
                return Err(RampError::Validation(format!(
                    "segment {index} needs at least a start and a finish event"
                )))
            }
        };
        if first.kind != EventKind::Start || last.kind != EventKind::Finish {
            return Err(RampError::Validation(format!(
                "segment {index} must run from start to finish, got {} .. {}",
                first.kind, last.kind
            )));
        }
        if last.time < first.time {
            return Err(RampError::Validation(format!(
                "segment {index} finishes before it starts"
            )));
        }
        if let Some(ev) = events
            .iter()
            .find(|ev| ev.time < first.time || ev.time > last.time)
        {
            return Err(RampError::Validation(format!(
                "segment {index}: {} event lies outside the segment span",
                ev.kind
            )));
        }
        let count = |kind| events.iter().filter(|ev| ev.kind == kind).count();
        let (starts, ends) = (count(EventKind::HoldStart), count(EventKind::HoldEnd));
        if starts > 1 || ends > 1 || starts != ends {
            return Err(RampError::Validation(format!(
                "segment {index} must carry at most one hold_start/hold_end pair"
            )));
        }
        let segment = Self { index, events };
        if let Some(hold) = segment.hold_window() {
            if hold.start > hold.end {
                return Err(RampError::Validation(format!(
                    "segment {index}: hold ends before it starts"
                )));
            }
        }
        Ok(segment)
    }

    pub fn index(&self) -> PairIndex {
        self.index
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn start(&self) -> &Event {
        &self.events[0]
    }

    pub fn finish(&self) -> &Event {
        &self.events[self.events.len() - 1]
    }

    pub fn event(&self, kind: EventKind) -> Option<&Event> {
        self.events.iter().find(|ev| ev.kind == kind)
    }

    pub fn hold_window(&self) -> Option<HoldWindow> {
        let start = self.event(EventKind::HoldStart)?;
        let end = self.event(EventKind::HoldEnd)?;
        Some(HoldWindow {
            level: start.mw,
            start: start.time,
            end: end.time,
        })
    }

    pub fn is_cut(&self) -> bool {
        self.event(EventKind::CutByOverwrite).is_some()
    }

    pub fn is_gap(&self) -> bool {
        self.index.is_gap()
    }

    pub fn span(&self) -> (Timestamp, Timestamp) {
        (self.start().time, self.finish().time)
    }
}

impl EventPath for TrajectorySegment {
    fn path_points(&self) -> Vec<TimePoint> {
        self.events
            .iter()
            .map(|ev| TimePoint::new(ev.time, ev.mw.value()))
            .collect()
    }

    fn path_index(&self) -> Option<PairIndex> {
        Some(self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    ReachTarget,
    CutByOverwrite,
    FlatGap,
}

impl EndReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::ReachTarget => "reach_target",
            EndReason::CutByOverwrite => "cut_by_overwrite",
            EndReason::FlatGap => "flat_gap",
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One summary row per segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSummary {
    pub pair_index: PairIndex,
    pub start_mw: Megawatts,
    pub start_time: Timestamp,
    pub hold_mw: Option<Megawatts>,
    pub hold_start: Option<Timestamp>,
    pub hold_end: Option<Timestamp>,
    pub finish_mw: Megawatts,
    pub finish_time: Timestamp,
    pub end_reason: EndReason,
    pub inside_hold: bool,
    pub is_gap: bool,
    /// Whole seconds covered by a gap segment
    pub gap_seconds: Option<i64>,
}

impl PairSummary {
    /// Summarize a segment. MW values are rounded to 3 decimals.
    pub fn from_segment(segment: &TrajectorySegment) -> Self {
        let start = segment.start();
        let finish = segment.finish();
        let hold = segment.hold_window();
        let end_reason = if segment.is_gap() {
            EndReason::FlatGap
        } else if segment.is_cut() {
            EndReason::CutByOverwrite
        } else {
            EndReason::ReachTarget
        };
        let gap_seconds = segment
            .is_gap()
            .then(|| seconds_between(start.time, finish.time).trunc() as i64);

        Self {
            pair_index: segment.index(),
            start_mw: start.mw.rounded(3),
            start_time: start.time,
            hold_mw: hold.map(|h| h.level.rounded(3)),
            hold_start: hold.map(|h| h.start),
            hold_end: hold.map(|h| h.end),
            finish_mw: finish.mw.rounded(3),
            finish_time: finish.time,
            end_reason,
            inside_hold: hold.is_some_and(|h| h.contains(finish.time)),
            is_gap: segment.is_gap(),
            gap_seconds,
        }
    }
}

/// Segments plus their summary rows, in build order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildOutput {
    pub segments: Vec<TrajectorySegment>,
    pub summary: Vec<PairSummary>,
}

impl BuildOutput {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn push(&mut self, segment: TrajectorySegment) {
        self.summary.push(PairSummary::from_segment(&segment));
        self.segments.push(segment);
    }

    pub fn cut_count(&self) -> usize {
        self.summary
            .iter()
            .filter(|row| row.end_reason == EndReason::CutByOverwrite)
            .count()
    }

    pub fn gap_count(&self) -> usize {
        self.summary.iter().filter(|row| row.is_gap).count()
    }
}

/// One tick of a fixed-frequency series. `mw` is `None` for gap ticks under
/// the `nan` gap policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResampledPoint {
    pub time: Timestamp,
    pub mw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<PairIndex>,
}

impl ResampledPoint {
    pub fn new(time: Timestamp, mw: Option<f64>) -> Self {
        Self {
            time,
            mw,
            pair: None,
        }
    }
}

/// One hour bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub hour: Timestamp,
    /// Average MW, or MWh when energy output was requested
    pub value: f64,
    /// Samples inside the closed bucket window
    pub samples: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(secs: i64) -> Timestamp {
        NaiveDateTime::default() + chrono::Duration::seconds(secs)
    }

    fn ev(kind: EventKind, secs: i64, mw: f64) -> Event {
        Event::new(kind, at(secs), Megawatts(mw))
    }

    #[test]
    fn test_segment_requires_start_and_finish() {
        let err = TrajectorySegment::new(PairIndex::Pair(0), vec![ev(EventKind::Start, 0, 0.0)]);
        assert!(err.is_err());

        let err = TrajectorySegment::new(
            PairIndex::Pair(0),
            vec![ev(EventKind::Finish, 0, 0.0), ev(EventKind::Start, 10, 1.0)],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_segment_rejects_events_past_finish() {
        let err = TrajectorySegment::new(
            PairIndex::Pair(0),
            vec![
                ev(EventKind::Start, 0, 0.0),
                ev(EventKind::HoldStart, 50, 330.0),
                ev(EventKind::HoldEnd, 200, 330.0),
                ev(EventKind::Finish, 100, 330.0),
            ],
        );
        assert!(matches!(err, Err(RampError::Validation(_))));
    }

    #[test]
    fn test_summary_from_cut_segment() {
        let segment = TrajectorySegment::new(
            PairIndex::Pair(2),
            vec![
                ev(EventKind::Start, 0, 0.0),
                ev(EventKind::HoldStart, 3000, 330.0),
                ev(EventKind::HoldEnd, 3600, 330.0),
                ev(EventKind::CutByOverwrite, 3600, 330.0),
                ev(EventKind::Finish, 3600, 330.0),
            ],
        )
        .unwrap();

        let row = PairSummary::from_segment(&segment);
        assert_eq!(row.end_reason, EndReason::CutByOverwrite);
        assert!(row.inside_hold);
        assert_eq!(row.hold_mw, Some(Megawatts(330.0)));
        assert_eq!(row.hold_end, Some(at(3600)));
        assert!(!row.is_gap);
        assert_eq!(row.gap_seconds, None);
    }

    #[test]
    fn test_summary_from_gap_segment() {
        let segment = TrajectorySegment::new(
            PairIndex::Gap(4),
            vec![ev(EventKind::Start, 100, 250.5), ev(EventKind::Finish, 700, 250.5)],
        )
        .unwrap();

        let row = PairSummary::from_segment(&segment);
        assert_eq!(row.end_reason, EndReason::FlatGap);
        assert_eq!(row.gap_seconds, Some(600));
        assert_eq!(row.pair_index.to_string(), "4_gap");
    }

    #[test]
    fn test_event_kind_round_trip() {
        for kind in [
            EventKind::Start,
            EventKind::HoldStart,
            EventKind::HoldEnd,
            EventKind::Finish,
            EventKind::CutByOverwrite,
        ] {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert!("ramp".parse::<EventKind>().is_err());
    }
}
