//! Unit newtypes for dispatch quantities.
//!
//! Ramp rules mix three kinds of numbers that are all `f64` underneath:
//! power levels (MW), ramp rates (MW/s) and energy (MWh). Keeping them apart
//! at the type level stops a rate from being compared against a threshold or
//! an hourly energy from being reported as an average power.
//!
//! All types are `#[repr(transparent)]` over `f64`.
//!
//! ```
//! use ramptrace_core::units::{Megawatts, MegawattsPerSecond};
//!
//! let start = Megawatts(0.0);
//! let threshold = Megawatts(330.0);
//! let slow = MegawattsPerSecond(0.11);
//!
//! let secs = (threshold - start).ramp_seconds(slow);
//! assert!((secs - 3000.0).abs() < 1e-9);
//! assert!((slow.over(100.0).value() - 11.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Macro to implement common arithmetic operations for unit types
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.3} {}", self.0, $unit_name)
            }
        }

        impl From<f64> for $type {
            fn from(value: f64) -> Self {
                Self(value)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            /// Round to `digits` decimal places (summary tables use 3).
            #[inline]
            pub fn rounded(self, digits: i32) -> Self {
                let scale = 10f64.powi(digits);
                Self((self.0 * scale).round() / scale)
            }
        }
    };
}

// =============================================================================
// Power
// =============================================================================

/// Active power output in megawatts (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

impl Megawatts {
    pub const ZERO: Self = Self(0.0);

    /// Seconds needed to cover this power difference at `rate`.
    ///
    /// The sign of `self` is ignored; a non-positive rate yields zero, which
    /// callers treat as "already there".
    #[inline]
    pub fn ramp_seconds(self, rate: MegawattsPerSecond) -> f64 {
        if rate.0 <= 0.0 {
            return 0.0;
        }
        (self.0.abs() / rate.0).max(0.0)
    }

    /// Energy delivered holding this power for `hours`.
    #[inline]
    pub fn over_hours(self, hours: f64) -> MegawattHours {
        MegawattHours(self.0 * hours)
    }
}

// =============================================================================
// Ramp rate
// =============================================================================

/// Ramp rate in megawatts per second (MW/s)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MegawattsPerSecond(pub f64);

impl_unit_ops!(MegawattsPerSecond, "MW/s");

impl MegawattsPerSecond {
    /// Power change accumulated over `seconds` at this rate.
    #[inline]
    pub fn over(self, seconds: f64) -> Megawatts {
        Megawatts(self.0 * seconds)
    }

    /// Build from a per-minute rate (start-up tables are quoted in MW/min).
    #[inline]
    pub fn from_per_minute(mw_per_min: f64) -> Self {
        Self(mw_per_min / 60.0)
    }
}

// =============================================================================
// Energy
// =============================================================================

/// Energy in megawatt-hours (MWh)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MegawattHours(pub f64);

impl_unit_ops!(MegawattHours, "MWh");

impl MegawattHours {
    /// Average power over `hours`; zero-length spans yield zero.
    #[inline]
    pub fn average_over(self, hours: f64) -> Megawatts {
        if hours.abs() < 1e-12 {
            Megawatts(0.0)
        } else {
            Megawatts(self.0 / hours)
        }
    }
}

impl std::iter::Sum for MegawattHours {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|x| x.0).sum())
    }
}
