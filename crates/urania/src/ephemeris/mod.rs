//! Ephemeris provider boundary.
//!
//! Everything astronomical that the derivation layer does not compute itself
//! goes through [`Ephemeris`]. The Swiss Ephemeris backend lives in
//! [`swiss`]; tests substitute an analytic implementation.

pub mod catalog;
pub mod shadow;
pub mod swiss;
pub mod types;

use thiserror::Error;

use crate::time::JulianDay;

pub use catalog::{CatalogStar, StarCatalog};
pub use swiss::SwissEphemeris;
pub use types::{
    Body, EclipticPosition, EquatorialPosition, GeoLocation, RawEclipse, RawHouses, StarPosition,
};

/// Errors that can occur during ephemeris calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("{path}: {message}")]
    FileNotFound { path: String, message: String },
    #[error("Failed to calculate position for {body} at {jd}: {message}")]
    CalculationFailed {
        body: String,
        jd: JulianDay,
        message: String,
    },
    #[error("House calculation failed: {message}")]
    HouseCalculationFailed { message: String },
    #[error("Star not found: {name}")]
    StarNotFound { name: String },
    #[error("Eclipse search failed: {message}")]
    EclipseSearchFailed { message: String },
    #[error("All lookups failed for {subject}: {}", failures.join("; "))]
    LookupExhausted {
        subject: String,
        failures: Vec<String>,
    },
}

/// Raw astronomical queries consumed by the chart engines.
///
/// Implementations must be pure with respect to their inputs: the same
/// instant always yields the same answer.
pub trait Ephemeris {
    /// Backend name used in log lines.
    fn name(&self) -> &str {
        "ephemeris"
    }

    /// Geocentric ecliptic position of date, with speeds.
    fn position(&self, jd: JulianDay, body: Body) -> Result<EclipticPosition, EphemerisError>;

    /// Geocentric equatorial position of date.
    fn equatorial_position(
        &self,
        jd: JulianDay,
        body: Body,
    ) -> Result<EquatorialPosition, EphemerisError>;

    /// Greenwich sidereal time in hours [0, 24).
    fn sidereal_time(&self, jd: JulianDay) -> Result<f64, EphemerisError>;

    /// Cusps and angles for a one-letter house system code.
    fn house_cusps(
        &self,
        jd: JulianDay,
        location: GeoLocation,
        code: u8,
    ) -> Result<RawHouses, EphemerisError>;

    /// Position of a named fixed star; `StarNotFound` when the name is unknown.
    fn star_position(&self, name: &str, jd: JulianDay) -> Result<StarPosition, EphemerisError>;

    /// Next global solar eclipse strictly after `jd`, `None` past the horizon.
    fn next_solar_eclipse(&self, jd: JulianDay) -> Result<Option<RawEclipse>, EphemerisError>;

    /// Next lunar eclipse strictly after `jd`, `None` past the horizon.
    fn next_lunar_eclipse(&self, jd: JulianDay) -> Result<Option<RawEclipse>, EphemerisError>;
}
