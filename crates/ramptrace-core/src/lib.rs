//! # ramptrace-core: Dispatch Trajectory Data Model
//!
//! Shared types for reconstructing generator output from dispatch command
//! logs.
//!
//! ## Data flow
//!
//! ```text
//! commands ──► pair builder ──► segments + summary ──► resampler ──► minutely ──► hourly
//! ```
//!
//! - [`Command`] - one dispatch instruction (time, target MW)
//! - [`TrajectorySegment`] - ordered [`Event`]s between two consecutive commands
//! - [`PairSummary`] - one row per segment, derived from it
//! - [`ResampledPoint`] / [`HourlyPoint`] - fixed-frequency series
//!
//! Segments and fixed start-up/shutdown timelines both implement
//! [`EventPath`], which is all the resampler needs to see.
//!
//! ## Modules
//!
//! - [`diagnostics`] - dropped-row reporting for input cleaning
//! - [`error`] - [`RampError`] and [`RampResult`]
//! - [`time`] - timestamp parsing, formatting and arithmetic
//! - [`units`] - MW, MW/s and MWh newtypes

pub mod diagnostics;
pub mod error;
pub mod model;
pub mod time;
pub mod units;

pub use diagnostics::{CleaningStats, DiagnosticIssue, Diagnostics, Severity};
pub use error::{RampError, RampResult};
pub use model::{
    BuildOutput, Command, EndReason, Event, EventKind, EventPath, HoldWindow, HourlyPoint,
    PairIndex, PairSummary, ResampledPoint, TimePoint, TrajectorySegment,
};
pub use time::Timestamp;
pub use units::{MegawattHours, Megawatts, MegawattsPerSecond};
