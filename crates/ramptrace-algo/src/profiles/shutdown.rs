use ramptrace_core::time::add_seconds;
use ramptrace_core::Timestamp;
use serde::{Deserialize, Serialize};

use super::{round_to, ProfilePhase, ProfilePoint, ProfileTimeline};

/// Net output at the 40% load point.
pub const DEFAULT_MW40: f64 = 264.0;

/// Descent from 40% load as (minutes after the 40% point, fraction of MW40).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShutdownProfile(pub Vec<(f64, f64)>);

impl Default for ShutdownProfile {
    /// Hold 40 min, down to 75% in 10 min, hold 55 min, down to zero in 30 min.
    fn default() -> Self {
        Self(vec![
            (0.0, 1.0),
            (40.0, 1.0),
            (50.0, 0.75),
            (105.0, 0.75),
            (135.0, 0.0),
        ])
    }
}

pub fn build_shutdown_timeline(t40: Timestamp, mw40: f64, profile: &ShutdownProfile) -> ProfileTimeline {
    let points = profile
        .0
        .iter()
        .map(|&(minutes, fraction)| ProfilePoint {
            phase: ProfilePhase::Shutdown,
            offset_minutes: round_to(minutes, 2),
            time: add_seconds(t40, minutes * 60.0),
            mw: round_to(mw40 * fraction, 3),
        })
        .collect();
    ProfileTimeline::from_points(t40, points)
}
