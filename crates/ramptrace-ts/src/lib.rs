//! # ramptrace-ts: Time-Series Stages
//!
//! Turns trajectory segments into fixed-frequency series and hourly values.
//!
//! - [`Frequency`]: frequency strings and epoch-aligned grids
//! - [`resample`]: per-path interpolation onto a grid, with gap policies
//! - [`hourly_average`]: closed-window hour buckets, left or right labelled
//! - [`compare_with_contract`]: hourly values against a contracted curve
//! - [`io`]: polars-backed CSV (and optionally Parquet) tables
//!
//! ## Example
//!
//! ```
//! use ramptrace_core::time::parse_timestamp;
//! use ramptrace_core::TimePoint;
//! use ramptrace_ts::{resample, ResampleOptions};
//!
//! let t0 = parse_timestamp("2024-01-01 00:00:00").unwrap();
//! let t1 = parse_timestamp("2024-01-01 00:02:00").unwrap();
//! let path = vec![TimePoint::new(t0, 0.0), TimePoint::new(t1, 2.0)];
//!
//! let series = resample(&[path], &ResampleOptions::default()).unwrap();
//! let values: Vec<_> = series.iter().map(|p| p.mw).collect();
//! assert_eq!(values, vec![Some(0.0), Some(1.0), Some(2.0)]);
//! ```

pub mod compare;
pub mod frequency;
pub mod hourly;
pub mod io;
pub mod resample;

pub use compare::{compare_with_contract, ContractComparison};
pub use frequency::Frequency;
pub use hourly::{hourly_average, HourLabel, HourlyAverage, HourlyOptions};
pub use resample::{resample, GapPolicy, ResampleOptions};
