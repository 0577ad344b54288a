//! Unified error type for trajectory reconstruction.
//!
//! Data problems inside a series (a bad timestamp, a missing MW value) are not
//! errors: those rows are dropped and reported through
//! [`crate::diagnostics::Diagnostics`]. [`RampError`] is reserved for
//! configuration mistakes and I/O failures that make a call meaningless.
//!
//! # Example
//!
//! ```
//! use ramptrace_core::{RampError, RampResult};
//!
//! fn step_seconds(seconds: i64) -> RampResult<i64> {
//!     if seconds <= 0 {
//!         return Err(RampError::InvalidFrequency(format!("{seconds}s")));
//!     }
//!     Ok(seconds)
//! }
//!
//! assert!(step_seconds(60).is_ok());
//! assert!(matches!(step_seconds(0), Err(RampError::InvalidFrequency(_))));
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RampError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Input table does not satisfy the contract (missing columns, etc.)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Sampling frequency did not resolve to a positive duration
    #[error("Invalid frequency '{0}': expected a positive duration such as T, 5T, 30S or 1H")]
    InvalidFrequency(String),

    /// Hour-bucket label other than left/right
    #[error("Invalid label '{0}': expected 'left' or 'right'")]
    InvalidLabel(String),

    /// Gap policy other than none/nan/ffill/bridge_linear
    #[error("Invalid gap policy '{0}': expected none, nan, ffill or bridge_linear")]
    InvalidGapPolicy(String),

    /// Ramp rules or option values that cannot produce a trajectory
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

pub type RampResult<T> = Result<T, RampError>;

impl From<anyhow::Error> for RampError {
    fn from(err: anyhow::Error) -> Self {
        RampError::Other(err.to_string())
    }
}

impl From<String> for RampError {
    fn from(s: String) -> Self {
        RampError::Other(s)
    }
}

impl From<&str> for RampError {
    fn from(s: &str) -> Self {
        RampError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for RampError {
    fn from(err: serde_json::Error) -> Self {
        RampError::Parse(err.to_string())
    }
}
