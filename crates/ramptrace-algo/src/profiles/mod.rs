//! Fixed start-up and shutdown timelines.
//!
//! Unlike dispatch pairs these are table-driven: a unit lights off, follows a
//! tabulated climb to 40% load, then ramps to its first dispatched target; on
//! shutdown it follows a tabulated descent from 40% to zero. Both produce a
//! [`ProfileTimeline`] that the resampler consumes through [`EventPath`].

mod shutdown;
mod startup;

pub use shutdown::{build_shutdown_timeline, ShutdownProfile, DEFAULT_MW40};
pub use startup::{
    build_startup_timeline, StartupInputs, StartupOptions, StartupType, SyncMode,
};

use std::fmt;

use ramptrace_core::time::seconds_between;
use ramptrace_core::{EventPath, TimePoint, Timestamp};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfilePhase {
    LightOff,
    Synchronise,
    SynTo40,
    RampStart,
    RampTo50,
    HoldAt50,
    RampToTarget,
    Shutdown,
}

impl ProfilePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfilePhase::LightOff => "light_off",
            ProfilePhase::Synchronise => "synchronise",
            ProfilePhase::SynTo40 => "syn_to_40",
            ProfilePhase::RampStart => "ramp_start",
            ProfilePhase::RampTo50 => "ramp_to_50",
            ProfilePhase::HoldAt50 => "hold_at_50",
            ProfilePhase::RampToTarget => "ramp_to_target",
            ProfilePhase::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for ProfilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfilePoint {
    pub phase: ProfilePhase,
    /// Minutes from the timeline origin, rounded to 2 decimals
    pub offset_minutes: f64,
    pub time: Timestamp,
    pub mw: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileTimeline {
    /// Light-off for start-ups, the 40% point for shutdowns
    pub origin: Option<Timestamp>,
    pub points: Vec<ProfilePoint>,
}

impl ProfileTimeline {
    pub(crate) fn from_points(origin: Timestamp, mut points: Vec<ProfilePoint>) -> Self {
        for point in &mut points {
            point.offset_minutes = round_to(seconds_between(origin, point.time) / 60.0, 2).max(0.0);
        }
        points.sort_by(|a, b| {
            a.offset_minutes
                .total_cmp(&b.offset_minutes)
                .then(a.time.cmp(&b.time))
        });
        Self {
            origin: Some(origin),
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn last(&self) -> Option<&ProfilePoint> {
        self.points.last()
    }

    pub fn phase(&self, phase: ProfilePhase) -> impl Iterator<Item = &ProfilePoint> {
        self.points.iter().filter(move |p| p.phase == phase)
    }
}

impl EventPath for ProfileTimeline {
    fn path_points(&self) -> Vec<TimePoint> {
        self.points
            .iter()
            .map(|p| TimePoint::new(p.time, p.mw))
            .collect()
    }
}

pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}
