use ramptrace_core::time::{add_seconds, seconds_between};
use ramptrace_core::{
    Command, Megawatts, MegawattsPerSecond, RampError, RampResult, Timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{round_to, ProfilePhase, ProfilePoint, ProfileTimeline};
use crate::commands::prepare_commands;

/// Start-up class, chosen from how long the unit was down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupType {
    Hot,
    Warm,
    Cold,
    InitialCold,
}

/// Ramp after the 40% point; tables quote the rates in MW/min.
struct After40 {
    rate_to_50: MegawattsPerSecond,
    hold_minutes: f64,
    rate_to_target: MegawattsPerSecond,
}

impl StartupType {
    /// `> 72 h` initial cold, `56..=72 h` cold, `8..56 h` warm, else hot.
    pub fn classify(downtime_hours: f64) -> Self {
        if downtime_hours > 72.0 {
            StartupType::InitialCold
        } else if (56.0..=72.0).contains(&downtime_hours) {
            StartupType::Cold
        } else if (8.0..56.0).contains(&downtime_hours) {
            StartupType::Warm
        } else {
            StartupType::Hot
        }
    }

    /// Expected light-off to synchronise time.
    pub fn sync_minutes(self) -> f64 {
        match self {
            StartupType::Hot => 75.0,
            StartupType::Warm => 190.0,
            StartupType::Cold => 310.0,
            StartupType::InitialCold => 385.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StartupType::Hot => "Hot Start-up",
            StartupType::Warm => "Warm Start-up",
            StartupType::Cold => "Cold Start-up",
            StartupType::InitialCold => "Initial Cold Start-up",
        }
    }

    /// Synchronise to 40% load as (minutes after sync, net MW).
    fn syn_to_40(self) -> &'static [(f64, f64)] {
        match self {
            StartupType::Hot => &[(0.0, 0.0), (5.0, 0.0), (15.0, 71.0), (55.0, 71.0), (82.0, 264.0)],
            StartupType::Warm => &[
                (0.0, 0.0),
                (10.0, 0.0),
                (14.0, 14.0),
                (19.0, 14.0),
                (35.0, 71.0),
                (75.0, 71.0),
                (129.0, 264.0),
            ],
            StartupType::Cold => &[
                (0.0, 0.0),
                (10.0, 0.0),
                (14.0, 14.0),
                (24.0, 14.0),
                (40.0, 71.0),
                (100.0, 71.0),
                (154.0, 264.0),
            ],
            StartupType::InitialCold => &[
                (0.0, 0.0),
                (10.0, 0.0),
                (14.0, 14.0),
                (74.0, 14.0),
                (90.0, 71.0),
                (150.0, 71.0),
                (204.0, 264.0),
            ],
        }
    }

    fn after_40(self) -> After40 {
        match self {
            StartupType::Hot => After40 {
                rate_to_50: MegawattsPerSecond::from_per_minute(6.6),
                hold_minutes: 30.0,
                rate_to_target: MegawattsPerSecond::from_per_minute(13.2),
            },
            StartupType::Warm => After40 {
                rate_to_50: MegawattsPerSecond::from_per_minute(3.3),
                hold_minutes: 30.0,
                rate_to_target: MegawattsPerSecond::from_per_minute(6.6),
            },
            StartupType::Cold | StartupType::InitialCold => After40 {
                rate_to_50: MegawattsPerSecond::from_per_minute(3.3),
                hold_minutes: 60.0,
                rate_to_target: MegawattsPerSecond::from_per_minute(6.6),
            },
        }
    }
}

/// Where the synchronise point comes from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Use the logged synchronise time.
    Observed,
    /// Use the tabulated time for the start-up class.
    #[default]
    Expected,
    /// Fixed minutes after light-off.
    Override(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartupInputs {
    /// When the unit was last taken off line
    pub previous_stop: Timestamp,
    pub light_off: Timestamp,
    pub observed_sync: Option<Timestamp>,
    pub observed_40pct: Option<Timestamp>,
    /// Dispatch commands issued around the start-up
    pub commands: Vec<Command>,
}

impl StartupInputs {
    pub fn new(previous_stop: Timestamp, light_off: Timestamp) -> Self {
        Self {
            previous_stop,
            light_off,
            observed_sync: None,
            observed_40pct: None,
            commands: Vec::new(),
        }
    }

    pub fn downtime_hours(&self) -> f64 {
        round_to(seconds_between(self.previous_stop, self.light_off) / 3600.0, 4)
    }

    pub fn startup_type(&self) -> StartupType {
        StartupType::classify(self.downtime_hours())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupOptions {
    /// Replaces the tabulated 40% level; the whole climb is scaled with it
    pub mw40_override: Option<f64>,
    /// Rated output; also becomes the ramp target when set
    pub mw100_override: Option<f64>,
    pub sync_mode: SyncMode,
}

impl StartupOptions {
    fn validate(&self) -> RampResult<()> {
        for (name, value) in [
            ("mw40_override", self.mw40_override),
            ("mw100_override", self.mw100_override),
        ] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(RampError::Config(format!(
                        "{name} must be a positive MW value, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn after_minutes(origin: Timestamp, minutes: f64) -> Timestamp {
    add_seconds(origin, minutes * 60.0)
}

fn ramp_minutes(from: f64, to: f64, rate: MegawattsPerSecond) -> f64 {
    (Megawatts(to) - Megawatts(from)).ramp_seconds(rate) / 60.0
}

fn point(phase: ProfilePhase, origin: Timestamp, minutes: f64, mw: f64) -> ProfilePoint {
    ProfilePoint {
        phase,
        offset_minutes: round_to(minutes, 2),
        time: after_minutes(origin, minutes),
        mw: round_to(mw, 3),
    }
}

/// Light-off to first dispatched target.
///
/// Profile offsets are absolute minutes from light-off: the tabulated climb
/// is shifted by the synchronise offset. An observed 40% time moves the 40%
/// point (never before the preceding profile points) and drops the tabulated
/// points after it. The first command after the 40% point sets when the
/// final ramp starts and where it ends, unless a rated output override is
/// given.
pub fn build_startup_timeline(
    inputs: &StartupInputs,
    options: &StartupOptions,
) -> RampResult<ProfileTimeline> {
    options.validate()?;

    let origin = inputs.light_off;
    let stype = inputs.startup_type();

    let (sync_offset, sync_marker) = match options.sync_mode {
        SyncMode::Observed => {
            let observed = inputs
                .observed_sync
                .map(|t| (t, seconds_between(origin, t) / 60.0))
                .filter(|&(_, minutes)| minutes > 0.0);
            match observed {
                Some((t, minutes)) => (minutes, Some(t)),
                None => (0.0, None),
            }
        }
        SyncMode::Expected => {
            let minutes = stype.sync_minutes();
            (minutes, Some(after_minutes(origin, minutes)))
        }
        SyncMode::Override(minutes) if minutes.is_finite() && minutes >= 0.0 => {
            (minutes, Some(after_minutes(origin, minutes)))
        }
        SyncMode::Override(_) => (0.0, None),
    };

    let profile = stype.syn_to_40();
    let profile_mw40 = profile.iter().map(|&(_, mw)| mw).fold(0.0, f64::max);
    let scale = match options.mw40_override {
        Some(mw40) if profile_mw40 > 0.0 => mw40 / profile_mw40,
        _ => 1.0,
    };

    let mut climb: Vec<ProfilePoint> = profile
        .iter()
        .filter(|&&(minutes, _)| minutes > 0.0)
        .map(|&(minutes, mw)| point(ProfilePhase::SynTo40, origin, minutes + sync_offset, mw * scale))
        .collect();

    if let Some(t40) = inputs.observed_40pct.filter(|t| *t >= origin) {
        pin_40pct(&mut climb, origin, t40);
    }

    let Some(at40) = climb
        .iter()
        .copied()
        .reduce(|best, p| if p.offset_minutes > best.offset_minutes { p } else { best })
    else {
        return Ok(ProfileTimeline::default());
    };
    let t40_minutes = at40.offset_minutes;
    let mw40 = at40.mw;

    let rated = options.mw100_override.unwrap_or(mw40 / 0.4);
    let mw50 = 0.5 * rated;

    let commands = prepare_commands(&inputs.commands);
    let next_command = commands.iter().find(|c| c.time > at40.time);
    let ramp_start = next_command
        .map(|c| (seconds_between(origin, c.time) / 60.0).max(t40_minutes))
        .unwrap_or(t40_minutes);
    let target = options
        .mw100_override
        .or(next_command.map(|c| c.target_mw.value()))
        .unwrap_or(rated);

    let mut points = vec![point(ProfilePhase::LightOff, origin, 0.0, 0.0)];
    if let Some(t) = sync_marker {
        points.push(ProfilePoint {
            phase: ProfilePhase::Synchronise,
            offset_minutes: round_to(sync_offset, 2),
            time: t,
            mw: 0.0,
        });
    }
    points.extend(climb);

    if ramp_start > t40_minutes {
        points.push(point(ProfilePhase::RampStart, origin, ramp_start, mw40));
    }

    let after = stype.after_40();
    let mut minutes = ramp_start;
    let mut mw = mw40;

    let end_first = mw50.min(target);
    if after.rate_to_50.value() > 0.0 && end_first > mw {
        minutes += ramp_minutes(mw, end_first, after.rate_to_50);
        mw = end_first;
        points.push(point(ProfilePhase::RampTo50, origin, minutes, mw));
    }
    if target > mw50 && after.hold_minutes > 0.0 {
        minutes += after.hold_minutes;
        points.push(point(ProfilePhase::HoldAt50, origin, minutes, mw));
    }
    if after.rate_to_target.value() > 0.0 && target > mw {
        minutes += ramp_minutes(mw, target, after.rate_to_target);
        mw = target;
        points.push(point(ProfilePhase::RampToTarget, origin, minutes, mw));
    }

    debug!(
        startup = stype.label(),
        downtime_hours = inputs.downtime_hours(),
        sync_minutes = sync_offset,
        t40_minutes,
        target,
        "start-up timeline"
    );
    Ok(ProfileTimeline::from_points(origin, points))
}

/// Move the 40% point to the observed time and drop tabulated points at or
/// after it.
fn pin_40pct(climb: &mut Vec<ProfilePoint>, origin: Timestamp, observed: Timestamp) {
    let Some(row40) = climb
        .iter()
        .copied()
        .reduce(|best, p| if p.mw > best.mw { p } else { best })
    else {
        return;
    };
    let before_last = climb.len().saturating_sub(1);
    let prev_max = climb[..before_last]
        .iter()
        .map(|p| p.offset_minutes)
        .fold(0.0, f64::max);
    let minutes = (seconds_between(origin, observed) / 60.0).max(prev_max);

    climb.retain(|p| p.offset_minutes < minutes);
    climb.push(ProfilePoint {
        offset_minutes: round_to(minutes, 2),
        time: after_minutes(origin, minutes),
        ..row40
    });
}
