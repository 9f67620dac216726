//! Sect (day/night chart) and the Part of Fortune.

use serde::{Deserialize, Serialize};

use crate::ephemeris::{Body, Ephemeris, GeoLocation};
use crate::error::ChartError;
use crate::numeric::normalize_degrees;
use crate::time::JulianDay;

/// Geometric altitude of the Sun's centre in degrees, no refraction.
pub fn sun_altitude<E: Ephemeris + ?Sized>(
    eph: &E,
    jd: JulianDay,
    location: GeoLocation,
) -> Result<f64, ChartError> {
    location.validate()?;
    let sun = eph.equatorial_position(jd, Body::Sun)?;
    let gst_hours = eph.sidereal_time(jd)?;
    let lst_degrees = normalize_degrees(gst_hours * 15.0 + location.lon);
    let hour_angle = (lst_degrees - sun.right_ascension).to_radians();

    let phi = location.lat.to_radians();
    let dec = sun.declination.to_radians();
    let sin_alt = phi.sin() * dec.sin() + phi.cos() * dec.cos() * hour_angle.cos();
    Ok(sin_alt.clamp(-1.0, 1.0).asin().to_degrees())
}

/// True when the Sun is above the geometric horizon.
pub fn is_diurnal<E: Ephemeris + ?Sized>(
    eph: &E,
    jd: JulianDay,
    location: GeoLocation,
) -> Result<bool, ChartError> {
    Ok(sun_altitude(eph, jd, location)? > 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FortuneFormula {
    /// ASC + Moon - Sun regardless of sect
    #[serde(rename = "ASC+Moon-Sun (always)")]
    Always,
    /// ASC + Moon - Sun by day, ASC + Sun - Moon by night
    #[serde(rename = "ASC+Moon-Sun (day) / ASC+Sun-Moon (night)")]
    Sect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FortuneOptions {
    pub use_sect: bool,
    /// Overrides the computed sect when `use_sect` is set
    pub force_diurnal: Option<bool>,
}

impl Default for FortuneOptions {
    fn default() -> Self {
        Self {
            use_sect: true,
            force_diurnal: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PartOfFortune {
    #[serde(rename = "lon")]
    pub longitude: f64,
    /// `None` when sect was not consulted
    pub diurnal: Option<bool>,
    pub formula: FortuneFormula,
}

/// Fortune longitude for a known sect.
pub fn fortune_longitude(asc: f64, sun: f64, moon: f64, diurnal: bool) -> f64 {
    if diurnal {
        normalize_degrees(asc + moon - sun)
    } else {
        normalize_degrees(asc + sun - moon)
    }
}

/// Part of Fortune at `jd` for the given ascendant and luminaries.
///
/// The provider is only consulted when sect is in use and not forced.
pub fn part_of_fortune<E: Ephemeris + ?Sized>(
    eph: &E,
    jd: JulianDay,
    location: GeoLocation,
    asc: f64,
    sun: f64,
    moon: f64,
    options: FortuneOptions,
) -> Result<PartOfFortune, ChartError> {
    if !options.use_sect {
        return Ok(PartOfFortune {
            longitude: fortune_longitude(asc, sun, moon, true),
            diurnal: None,
            formula: FortuneFormula::Always,
        });
    }

    let diurnal = match options.force_diurnal {
        Some(forced) => forced,
        None => is_diurnal(eph, jd, location)?,
    };
    Ok(PartOfFortune {
        longitude: fortune_longitude(asc, sun, moon, diurnal),
        diurnal: Some(diurnal),
        formula: FortuneFormula::Sect,
    })
}
