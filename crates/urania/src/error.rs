use thiserror::Error;

use crate::ephemeris::EphemerisError;

/// Errors raised by the derivation layer.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Invalid date/time: {message}. Expected date=YYYY-MM-DD, time=HH:MM[:SS]")]
    InvalidDateTime { message: String },
    #[error("Unknown timezone: {tz}")]
    UnknownTimezone { tz: String },
    #[error("Provide either a timezone name or an offset in minutes, not both")]
    ConflictingZone,
    #[error("Invalid house system: {system}. Valid systems: {valid:?}")]
    UnsupportedHouseSystem { system: String, valid: Vec<String> },
    #[error("Invalid {name}: {value}. Valid values: {valid:?}")]
    InvalidOption {
        name: &'static str,
        value: String,
        valid: Vec<String>,
    },
    #[error("Invalid coordinates: {message}")]
    InvalidCoordinates { message: String },
    #[error("Invalid star list: {message}")]
    InvalidStarList { message: String },
    #[error("Invalid solver configuration: {0}")]
    InvalidSolverConfig(&'static str),
    #[error("Phase root is not bracketed on [{left}, {right}] (f = {f_left:e}, {f_right:e})")]
    SolverPrecondition {
        left: f64,
        right: f64,
        f_left: f64,
        f_right: f64,
    },
    #[error(transparent)]
    Provider(#[from] EphemerisError),
}

impl ChartError {
    /// True for errors caused by the caller's input rather than a failed
    /// computation. These are never worth retrying.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidDateTime { .. }
                | Self::UnknownTimezone { .. }
                | Self::ConflictingZone
                | Self::UnsupportedHouseSystem { .. }
                | Self::InvalidOption { .. }
                | Self::InvalidCoordinates { .. }
                | Self::InvalidStarList { .. }
                | Self::InvalidSolverConfig(_)
        )
    }
}
