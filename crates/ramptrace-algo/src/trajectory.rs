//! Ramp/hold model for a single transition.
//!
//! A [`Transition`] is planned once from `(t0, mw0)` toward a target and can
//! then be queried for its natural finish time, its hold window and the MW
//! value at any instant. The pair builder uses the first two to lay out
//! events and [`Transition::mw_at`] to find where a preempted ramp stopped.

use ramptrace_core::time::{add_seconds, seconds_between};
use ramptrace_core::{HoldWindow, Megawatts, MegawattsPerSecond, Timestamp};
use serde::Serialize;

use crate::rules::{Direction, RampRules};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    /// Start equals target.
    Flat,
    /// One linear leg, no threshold in between.
    Direct { rate: MegawattsPerSecond },
    /// Approach the threshold, optionally hold there, then continue.
    Threshold {
        level: Megawatts,
        approach_rate: MegawattsPerSecond,
        reach_at: Timestamp,
        hold_until: Option<Timestamp>,
        tail_rate: MegawattsPerSecond,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    pub t0: Timestamp,
    pub mw0: Megawatts,
    pub target: Megawatts,
    pub direction: Option<Direction>,
    pub shape: Shape,
}

impl Transition {
    pub fn plan(rules: &RampRules, t0: Timestamp, mw0: Megawatts, target: Megawatts) -> Self {
        let direction = Direction::of(mw0, target);
        let shape = match direction {
            None => Shape::Flat,
            Some(dir) if rules.crosses(dir, mw0, target) => {
                let policy = rules.policy();
                let level = rules.threshold(dir);
                let approach_rate = policy.approach_rate(rules, dir, mw0);
                let reach_at = add_seconds(t0, (level - mw0).ramp_seconds(approach_rate));
                let hold = rules.hold_seconds(dir);
                let hold_until = (hold > 0.0).then(|| add_seconds(reach_at, hold));
                Shape::Threshold {
                    level,
                    approach_rate,
                    reach_at,
                    hold_until,
                    tail_rate: policy.tail_rate(rules, dir),
                }
            }
            Some(dir) => Shape::Direct {
                rate: rules.policy().direct_rate(rules, dir, mw0, target),
            },
        };

        Self {
            t0,
            mw0,
            target,
            direction,
            shape,
        }
    }

    /// When the target would be reached if nothing interrupted the move.
    /// A flat transition has no finish of its own.
    pub fn natural_finish(&self) -> Option<Timestamp> {
        match self.shape {
            Shape::Flat => None,
            Shape::Direct { rate } => Some(add_seconds(
                self.t0,
                (self.target - self.mw0).ramp_seconds(rate),
            )),
            Shape::Threshold {
                level,
                reach_at,
                hold_until,
                tail_rate,
                ..
            } => Some(add_seconds(
                hold_until.unwrap_or(reach_at),
                (self.target - level).ramp_seconds(tail_rate),
            )),
        }
    }

    pub fn hold_window(&self) -> Option<HoldWindow> {
        match self.shape {
            Shape::Threshold {
                level,
                reach_at,
                hold_until: Some(end),
                ..
            } => Some(HoldWindow {
                level,
                start: reach_at,
                end,
            }),
            _ => None,
        }
    }

    /// Output at `t`. Before `t0` the start level is returned; every leg is
    /// clamped so a rising move never overshoots and a falling one never
    /// undershoots.
    pub fn mw_at(&self, t: Timestamp) -> Megawatts {
        let Some(direction) = self.direction else {
            return self.mw0;
        };
        if t <= self.t0 {
            return self.mw0;
        }

        match self.shape {
            Shape::Flat => self.mw0,
            Shape::Direct { rate } => {
                let moved = self.mw0 + rate.over(seconds_between(self.t0, t)) * direction.sign();
                clamp_toward(moved, self.target, direction)
            }
            Shape::Threshold {
                level,
                approach_rate,
                reach_at,
                hold_until,
                tail_rate,
            } => {
                if t <= reach_at {
                    let moved = self.mw0
                        + approach_rate.over(seconds_between(self.t0, t)) * direction.sign();
                    return clamp_toward(moved, level, direction);
                }
                let tail_start = match hold_until {
                    Some(end) if t <= end => return level,
                    Some(end) => end,
                    None => reach_at,
                };
                let moved = level + tail_rate.over(seconds_between(tail_start, t)) * direction.sign();
                clamp_toward(moved, self.target, direction)
            }
        }
    }
}

fn clamp_toward(value: Megawatts, bound: Megawatts, direction: Direction) -> Megawatts {
    match direction {
        Direction::Rising => value.min(bound),
        Direction::Falling => value.max(bound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(secs: f64) -> Timestamp {
        add_seconds(NaiveDateTime::default(), secs)
    }

    fn plan(rules: &RampRules, mw0: f64, target: f64) -> Transition {
        Transition::plan(rules, at(0.0), Megawatts(mw0), Megawatts(target))
    }

    #[test]
    fn test_flat_has_no_finish() {
        let tr = plan(&RampRules::ppa(), 100.0, 100.0);
        assert_eq!(tr.shape, Shape::Flat);
        assert_eq!(tr.natural_finish(), None);
        assert_eq!(tr.mw_at(at(500.0)), Megawatts(100.0));
    }

    #[test]
    fn test_rising_to_threshold_holds() {
        let tr = plan(&RampRules::ppa(), 0.0, 330.0);
        let hold = tr.hold_window().unwrap();
        assert_eq!(hold.start, at(3000.0));
        assert_eq!(hold.end, at(4800.0));
        assert_eq!(tr.natural_finish(), Some(at(4800.0)));
        assert!((tr.mw_at(at(1500.0)).value() - 165.0).abs() < 1e-9);
        assert_eq!(tr.mw_at(at(3600.0)), Megawatts(330.0));
    }

    #[test]
    fn test_rising_through_threshold_continues_fast() {
        let tr = plan(&RampRules::ppa(), 300.0, 374.0);
        // 30 MW slow, 1800 s hold, 44 MW fast
        let finish = tr.natural_finish().unwrap();
        let expected = 30.0 / 0.11 + 1800.0 + 44.0 / 0.22;
        assert!((seconds_between(at(0.0), finish) - expected).abs() < 1e-5);

        let after_hold = tr.hold_window().unwrap().end;
        let mid_tail = add_seconds(after_hold, 100.0);
        assert!((tr.mw_at(mid_tail).value() - 352.0).abs() < 1e-6);
        assert_eq!(tr.mw_at(add_seconds(finish, 600.0)), Megawatts(374.0));
    }

    #[test]
    fn test_zero_hold_skips_window() {
        let rules = RampRules::ppa().with_hold_durations(0.0, 0.0);
        let tr = plan(&rules, 0.0, 352.0);
        assert_eq!(tr.hold_window(), None);
        let finish = tr.natural_finish().unwrap();
        assert!((seconds_between(at(0.0), finish) - (3000.0 + 100.0)).abs() < 1e-5);
    }

    #[test]
    fn test_direct_falling_clamps_at_target() {
        let tr = plan(&RampRules::ppa(), 400.0, 334.0);
        assert!(matches!(tr.shape, Shape::Direct { .. }));
        assert_eq!(tr.natural_finish(), Some(at(300.0)));
        assert!((tr.mw_at(at(150.0)).value() - 367.0).abs() < 1e-9);
        assert_eq!(tr.mw_at(at(10_000.0)), Megawatts(334.0));
    }

    #[test]
    fn test_before_start_returns_start_level() {
        let tr = Transition::plan(&RampRules::epc(), at(100.0), Megawatts(200.0), Megawatts(300.0));
        assert_eq!(tr.mw_at(at(0.0)), Megawatts(200.0));
    }

    #[test]
    fn test_monotonic_and_bounded() {
        for rules in [RampRules::ppa(), RampRules::epc()] {
            for (mw0, target) in [(0.0, 500.0), (500.0, 0.0), (320.0, 440.0), (470.0, 420.0)] {
                let tr = plan(&rules, mw0, target);
                let dir = tr.direction.unwrap();
                let mut prev = tr.mw_at(at(0.0));
                for step in 1..=200 {
                    let mw = tr.mw_at(at(step as f64 * 60.0));
                    match dir {
                        Direction::Rising => {
                            assert!(mw >= prev && mw <= Megawatts(target));
                        }
                        Direction::Falling => {
                            assert!(mw <= prev && mw >= Megawatts(target));
                        }
                    }
                    prev = mw;
                }
            }
        }
    }
}
