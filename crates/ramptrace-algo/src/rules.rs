//! Ramp rules and rate-selection strategies.
//!
//! Both regulatory regimes share one trajectory model. What differs is
//! captured in [`RampRules`]: the threshold levels, the hold durations and a
//! [`RatePolicy`] deciding which of the two ramp rates applies to each leg of
//! a move.
//!
//! | Regime | Up threshold | Down threshold | Falling rate |
//! |--------|--------------|----------------|--------------|
//! | PPA    | 330 MW       | 462 MW         | always fast  |
//! | EPC    | 429 MW       | 429 MW         | slow below 330 MW |

use std::fmt;
use std::str::FromStr;

use ramptrace_core::{Megawatts, MegawattsPerSecond, RampError, RampResult};
use serde::{Deserialize, Serialize};

pub const SLOW_RATE: MegawattsPerSecond = MegawattsPerSecond(0.11);
pub const FAST_RATE: MegawattsPerSecond = MegawattsPerSecond(0.22);
/// Level at or above which the unit may ramp at the fast rate.
pub const SECONDARY_THRESHOLD: Megawatts = Megawatts(330.0);
pub const DEFAULT_HOLD_SECONDS: f64 = 1800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Rising,
    Falling,
}

impl Direction {
    /// `None` for a flat move.
    pub fn of(start: Megawatts, target: Megawatts) -> Option<Self> {
        if target > start {
            Some(Direction::Rising)
        } else if target < start {
            Some(Direction::Falling)
        } else {
            None
        }
    }

    /// +1 for rising, -1 for falling.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Rising => 1.0,
            Direction::Falling => -1.0,
        }
    }
}

/// Chooses the ramp rate for each leg of a move.
///
/// A move either crosses the regime's threshold (approach leg, optional hold,
/// tail leg) or it does not (one direct leg).
pub trait RatePolicy: Send + Sync {
    fn id(&self) -> &'static str;

    /// Rate for a move that crosses no threshold.
    fn direct_rate(
        &self,
        rules: &RampRules,
        direction: Direction,
        start: Megawatts,
        target: Megawatts,
    ) -> MegawattsPerSecond;

    /// Rate from the start level up (or down) to the threshold.
    fn approach_rate(
        &self,
        rules: &RampRules,
        direction: Direction,
        start: Megawatts,
    ) -> MegawattsPerSecond;

    /// Rate from the threshold on to the target.
    fn tail_rate(&self, rules: &RampRules, _direction: Direction) -> MegawattsPerSecond {
        rules.fast_rate
    }
}

fn rising_direct(rules: &RampRules, start: Megawatts, target: Megawatts) -> MegawattsPerSecond {
    if start >= rules.secondary_threshold && target >= rules.secondary_threshold {
        rules.fast_rate
    } else {
        rules.slow_rate
    }
}

fn rising_approach(rules: &RampRules, start: Megawatts) -> MegawattsPerSecond {
    if start < rules.secondary_threshold {
        rules.slow_rate
    } else {
        rules.fast_rate
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PpaRatePolicy;

impl RatePolicy for PpaRatePolicy {
    fn id(&self) -> &'static str {
        "ppa"
    }

    fn direct_rate(
        &self,
        rules: &RampRules,
        direction: Direction,
        start: Megawatts,
        target: Megawatts,
    ) -> MegawattsPerSecond {
        match direction {
            Direction::Rising => rising_direct(rules, start, target),
            Direction::Falling => rules.fast_rate,
        }
    }

    fn approach_rate(
        &self,
        rules: &RampRules,
        direction: Direction,
        start: Megawatts,
    ) -> MegawattsPerSecond {
        match direction {
            Direction::Rising => rising_approach(rules, start),
            Direction::Falling => rules.fast_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EpcRatePolicy;

impl RatePolicy for EpcRatePolicy {
    fn id(&self) -> &'static str {
        "epc"
    }

    fn direct_rate(
        &self,
        rules: &RampRules,
        direction: Direction,
        start: Megawatts,
        target: Megawatts,
    ) -> MegawattsPerSecond {
        match direction {
            Direction::Rising => rising_direct(rules, start, target),
            Direction::Falling => {
                if start >= rules.secondary_threshold || target >= rules.secondary_threshold {
                    rules.fast_rate
                } else {
                    rules.slow_rate
                }
            }
        }
    }

    fn approach_rate(
        &self,
        rules: &RampRules,
        direction: Direction,
        start: Megawatts,
    ) -> MegawattsPerSecond {
        match direction {
            Direction::Rising => rising_approach(rules, start),
            Direction::Falling => {
                if start >= rules.secondary_threshold {
                    rules.fast_rate
                } else {
                    rules.slow_rate
                }
            }
        }
    }
}

static PPA_POLICY: PpaRatePolicy = PpaRatePolicy;
static EPC_POLICY: EpcRatePolicy = EpcRatePolicy;

/// Serializable handle to one of the built-in rate policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSelection {
    #[default]
    Ppa,
    Epc,
}

impl RateSelection {
    pub fn policy(self) -> &'static dyn RatePolicy {
        match self {
            RateSelection::Ppa => &PPA_POLICY,
            RateSelection::Epc => &EPC_POLICY,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.policy().id()
    }
}

impl fmt::Display for RateSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateSelection {
    type Err = RampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ppa" => Ok(RateSelection::Ppa),
            "epc" => Ok(RateSelection::Epc),
            other => Err(RampError::Config(format!(
                "unknown rule set '{other}' (expected ppa or epc)"
            ))),
        }
    }
}

/// Constants for one regulatory regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampRules {
    pub slow_rate: MegawattsPerSecond,
    pub fast_rate: MegawattsPerSecond,
    pub secondary_threshold: Megawatts,
    pub up_threshold: Megawatts,
    pub down_threshold: Megawatts,
    pub up_hold_seconds: f64,
    pub down_hold_seconds: f64,
    pub rate_selection: RateSelection,
}

impl Default for RampRules {
    fn default() -> Self {
        Self::ppa()
    }
}

impl RampRules {
    pub fn ppa() -> Self {
        Self {
            slow_rate: SLOW_RATE,
            fast_rate: FAST_RATE,
            secondary_threshold: SECONDARY_THRESHOLD,
            up_threshold: Megawatts(330.0),
            down_threshold: Megawatts(462.0),
            up_hold_seconds: DEFAULT_HOLD_SECONDS,
            down_hold_seconds: DEFAULT_HOLD_SECONDS,
            rate_selection: RateSelection::Ppa,
        }
    }

    pub fn epc() -> Self {
        Self {
            up_threshold: Megawatts(429.0),
            down_threshold: Megawatts(429.0),
            rate_selection: RateSelection::Epc,
            ..Self::ppa()
        }
    }

    pub fn preset(selection: RateSelection) -> Self {
        match selection {
            RateSelection::Ppa => Self::ppa(),
            RateSelection::Epc => Self::epc(),
        }
    }

    pub fn with_hold_durations(mut self, up_seconds: f64, down_seconds: f64) -> Self {
        self.up_hold_seconds = up_seconds;
        self.down_hold_seconds = down_seconds;
        self
    }

    pub fn policy(&self) -> &'static dyn RatePolicy {
        self.rate_selection.policy()
    }

    pub fn threshold(&self, direction: Direction) -> Megawatts {
        match direction {
            Direction::Rising => self.up_threshold,
            Direction::Falling => self.down_threshold,
        }
    }

    pub fn hold_seconds(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Rising => self.up_hold_seconds,
            Direction::Falling => self.down_hold_seconds,
        }
    }

    /// Rising moves cross when `start < up <= target`, falling moves when
    /// `start > down >= target`.
    pub fn crosses(&self, direction: Direction, start: Megawatts, target: Megawatts) -> bool {
        let level = self.threshold(direction);
        match direction {
            Direction::Rising => start < level && level <= target,
            Direction::Falling => start > level && level >= target,
        }
    }

    pub fn validate(&self) -> RampResult<()> {
        for (name, rate) in [("slow_rate", self.slow_rate), ("fast_rate", self.fast_rate)] {
            if !(rate.is_finite() && rate.value() > 0.0) {
                return Err(RampError::Config(format!(
                    "{name} must be a positive MW/s value, got {}",
                    rate.value()
                )));
            }
        }
        for (name, secs) in [
            ("up_hold_seconds", self.up_hold_seconds),
            ("down_hold_seconds", self.down_hold_seconds),
        ] {
            if !(secs.is_finite() && secs >= 0.0) {
                return Err(RampError::Config(format!(
                    "{name} must be zero or positive, got {secs}"
                )));
            }
        }
        for (name, level) in [
            ("secondary_threshold", self.secondary_threshold),
            ("up_threshold", self.up_threshold),
            ("down_threshold", self.down_threshold),
        ] {
            if !level.is_finite() {
                return Err(RampError::Config(format!("{name} must be finite")));
            }
        }
        Ok(())
    }
}
