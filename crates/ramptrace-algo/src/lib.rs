//! # ramptrace-algo: Trajectory Reconstruction
//!
//! Turns a dispatch command stream into the output path a generating unit
//! could physically follow.
//!
//! ## Rule sets
//!
//! | Preset | Up threshold | Down threshold | Rate policy |
//! |--------|--------------|----------------|-------------|
//! | [`RampRules::ppa`] | 330 MW | 462 MW | [`PpaRatePolicy`] |
//! | [`RampRules::epc`] | 429 MW | 429 MW | [`EpcRatePolicy`] |
//!
//! Both ramp at 0.11 MW/s (slow) or 0.22 MW/s (fast) and hold 30 minutes at
//! a crossed threshold by default.
//!
//! ### Architecture
//!
//! - **[`RatePolicy`]**: which rate applies to each leg of a move
//! - **[`Transition`]**: the ramp/hold model for one move, queried by time
//! - **[`build_pairs`]**: one segment per command pair, with the universal
//!   cut, hold sanitation and optional gap pairs
//! - **[`profiles`]**: table-driven start-up and shutdown timelines
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use ramptrace_algo::{build_pairs, PairBuildOptions, RampRules};
//! use ramptrace_core::{Command, EndReason};
//!
//! let t0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let commands = vec![
//!     Command::new(t0, 0.0),
//!     Command::new(t0 + chrono::Duration::hours(1), 330.0),
//! ];
//!
//! let out = build_pairs(&commands, &PairBuildOptions::new(RampRules::ppa())).unwrap();
//! assert_eq!(out.summary[0].end_reason, EndReason::CutByOverwrite);
//! ```

pub mod commands;
pub mod pairs;
pub mod profiles;
pub mod rules;
pub mod trajectory;

pub use commands::{clean_commands, normalize_flag, prepare_commands, RawCommand};
pub use pairs::{build_pairs, PairBuildOptions};
pub use rules::{
    Direction, EpcRatePolicy, PpaRatePolicy, RampRules, RatePolicy, RateSelection, FAST_RATE,
    SLOW_RATE,
};
pub use trajectory::{Shape, Transition};
