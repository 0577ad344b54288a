//! Pair segment builder.
//!
//! Every consecutive pair of commands `(i, i + 1)` becomes one
//! [`TrajectorySegment`]. The segment follows the ramp/hold model from
//! command `i` toward the target of command `i + 1`:
//!
//! 1. The transition is planned and its hold window (if any) recorded.
//! 2. If the natural finish lies after the next command's time, the move is
//!    cut there: the finish becomes `(t_next, mw_at(t_next))` and a
//!    `cut_by_overwrite` marker is added. This applies to every command
//!    regardless of the historical stop flag.
//! 3. The hold window is sanitized against the final finish: dropped when
//!    the threshold was never reached, shortened when the hold was
//!    interrupted.
//! 4. With gap pairs enabled, a flat segment fills any wait longer than
//!    `gap_min_seconds` between the finish and the next command.

use ramptrace_core::time::seconds_between;
use ramptrace_core::{
    BuildOutput, Command, Event, EventKind, HoldWindow, PairIndex, RampResult, Timestamp,
    TrajectorySegment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::prepare_commands;
use crate::rules::RampRules;
use crate::trajectory::Transition;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairBuildOptions {
    pub rules: RampRules,
    pub make_gap_pairs: bool,
    pub gap_min_seconds: f64,
}

impl Default for PairBuildOptions {
    fn default() -> Self {
        Self::new(RampRules::ppa())
    }
}

impl PairBuildOptions {
    pub fn new(rules: RampRules) -> Self {
        Self {
            rules,
            make_gap_pairs: true,
            gap_min_seconds: 1.0,
        }
    }

    pub fn with_gap_pairs(mut self, enabled: bool) -> Self {
        self.make_gap_pairs = enabled;
        self
    }

    pub fn with_gap_min_seconds(mut self, seconds: f64) -> Self {
        self.gap_min_seconds = seconds;
        self
    }
}

/// Build segments and summary rows for a command stream.
///
/// Fewer than two usable commands yield an empty output. Errors only come
/// from invalid rules.
pub fn build_pairs(commands: &[Command], options: &PairBuildOptions) -> RampResult<BuildOutput> {
    options.rules.validate()?;

    let commands = prepare_commands(commands);
    let mut out = BuildOutput::default();
    if commands.len() < 2 {
        debug!(commands = commands.len(), "not enough commands to build pairs");
        return Ok(out);
    }

    for (i, pair) in commands.windows(2).enumerate() {
        let (current, next) = (&pair[0], &pair[1]);
        let segment = build_segment(i, current, next, &options.rules)?;
        let finish = *segment.finish();
        out.push(segment);

        if options.make_gap_pairs {
            if let Some(gap) = gap_segment(i, finish.time, next, options.gap_min_seconds)? {
                out.push(gap);
            }
        }
    }

    debug!(
        rules = %options.rules.rate_selection,
        pairs = commands.len() - 1,
        segments = out.len(),
        cuts = out.cut_count(),
        gaps = out.gap_count(),
        "built trajectory pairs"
    );
    Ok(out)
}

fn build_segment(
    index: usize,
    current: &Command,
    next: &Command,
    rules: &RampRules,
) -> RampResult<TrajectorySegment> {
    let transition = Transition::plan(rules, current.time, current.target_mw, next.target_mw);

    let natural = transition.natural_finish().unwrap_or(next.time);
    let cut = natural > next.time;
    let (finish_time, finish_mw) = if cut {
        (next.time, transition.mw_at(next.time))
    } else {
        (natural, next.target_mw)
    };

    let mut events = vec![Event::new(EventKind::Start, current.time, current.target_mw)];
    if let Some(hold) = transition
        .hold_window()
        .and_then(|hold| sanitize_hold(hold, finish_time))
    {
        events.push(Event::new(EventKind::HoldStart, hold.start, hold.level));
        events.push(Event::new(EventKind::HoldEnd, hold.end, hold.level));
    }
    events.retain(|ev| ev.time <= finish_time);
    if cut {
        events.push(Event::new(EventKind::CutByOverwrite, finish_time, finish_mw));
    }
    events.push(Event::new(EventKind::Finish, finish_time, finish_mw));

    debug!(
        pair = index,
        start = %current.time,
        finish = %finish_time,
        finish_mw = finish_mw.value(),
        cut,
        "pair segment"
    );
    TrajectorySegment::new(PairIndex::Pair(index), events)
}

/// Trim a hold window to a finish time; `None` if the threshold was never
/// reached before the finish.
fn sanitize_hold(hold: HoldWindow, finish: Timestamp) -> Option<HoldWindow> {
    if finish <= hold.start {
        None
    } else if finish < hold.end {
        Some(HoldWindow {
            end: finish,
            ..hold
        })
    } else {
        Some(hold)
    }
}

fn gap_segment(
    index: usize,
    finish: Timestamp,
    next: &Command,
    gap_min_seconds: f64,
) -> RampResult<Option<TrajectorySegment>> {
    let gap = seconds_between(finish, next.time);
    if gap <= gap_min_seconds.max(0.0) {
        return Ok(None);
    }
    let events = vec![
        Event::new(EventKind::Start, finish, next.target_mw),
        Event::new(EventKind::Finish, next.time, next.target_mw),
    ];
    TrajectorySegment::new(PairIndex::Gap(index), events).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use ramptrace_core::time::add_seconds;
    use ramptrace_core::{EndReason, Megawatts};

    fn at(secs: f64) -> Timestamp {
        add_seconds(NaiveDateTime::default(), secs)
    }

    fn commands(points: &[(f64, f64)]) -> Vec<Command> {
        points.iter().map(|&(t, mw)| Command::new(at(t), mw)).collect()
    }

    fn kinds(segment: &TrajectorySegment) -> Vec<EventKind> {
        segment.events().iter().map(|ev| ev.kind).collect()
    }

    #[test]
    fn test_sanitize_hold() {
        let hold = HoldWindow {
            level: Megawatts(330.0),
            start: at(100.0),
            end: at(200.0),
        };
        assert_eq!(sanitize_hold(hold, at(100.0)), None);
        assert_eq!(sanitize_hold(hold, at(150.0)).unwrap().end, at(150.0));
        assert_eq!(sanitize_hold(hold, at(200.0)), Some(hold));
        assert_eq!(sanitize_hold(hold, at(900.0)), Some(hold));
    }

    #[test]
    fn test_cut_before_hold_removes_it() {
        let cmds = commands(&[(0.0, 0.0), (1200.0, 330.0)]);
        let out = build_pairs(&cmds, &PairBuildOptions::default()).unwrap();
        let seg = &out.segments[0];
        assert_eq!(
            kinds(seg),
            vec![EventKind::Start, EventKind::CutByOverwrite, EventKind::Finish]
        );
        assert!((seg.finish().mw.value() - 132.0).abs() < 1e-9);
        assert!(!out.summary[0].inside_hold);
    }

    #[test]
    fn test_natural_finish_then_gap() {
        let cmds = commands(&[(0.0, 400.0), (3600.0, 334.0)]);
        let out = build_pairs(&cmds, &PairBuildOptions::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.segments[0].finish().time, at(300.0));
        assert_eq!(out.summary[0].end_reason, EndReason::ReachTarget);

        let gap = &out.segments[1];
        assert_eq!(gap.index(), PairIndex::Gap(0));
        assert_eq!(gap.span(), (at(300.0), at(3600.0)));
        assert_eq!(out.summary[1].gap_seconds, Some(3300));
    }

    #[test]
    fn test_gap_threshold_and_toggle() {
        let cmds = commands(&[(0.0, 400.0), (300.5, 334.0)]);
        let out = build_pairs(&cmds, &PairBuildOptions::default()).unwrap();
        assert_eq!(out.gap_count(), 0);

        let cmds = commands(&[(0.0, 400.0), (3600.0, 334.0)]);
        let options = PairBuildOptions::default().with_gap_pairs(false);
        let out = build_pairs(&cmds, &options).unwrap();
        assert_eq!(out.gap_count(), 0);
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let mut options = PairBuildOptions::default();
        options.rules.slow_rate = ramptrace_core::MegawattsPerSecond(-0.1);
        assert!(build_pairs(&commands(&[(0.0, 0.0), (60.0, 10.0)]), &options).is_err());
    }

    #[test]
    fn test_single_command_is_empty() {
        let out = build_pairs(&commands(&[(0.0, 100.0)]), &PairBuildOptions::default()).unwrap();
        assert!(out.is_empty());
        assert!(out.summary.is_empty());
    }
}
