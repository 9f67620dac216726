use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ChartError;
use crate::numeric::normalize_degrees;
use crate::time::JulianDay;

/// Geographic location coordinates (degrees, east and north positive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
}

impl GeoLocation {
    pub fn new(lat: f64, lon: f64) -> Result<Self, ChartError> {
        let loc = Self { lat, lon };
        loc.validate()?;
        Ok(loc)
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(ChartError::InvalidCoordinates {
                message: format!("latitude {} is outside [-90, 90]", self.lat),
            });
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(ChartError::InvalidCoordinates {
                message: format!("longitude {} is outside [-180, 180]", self.lon),
            });
        }
        Ok(())
    }
}

/// Bodies the provider can position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    Chiron,
    MeanNode,
    TrueNode,
}

// Swiss Ephemeris body numbers
const BODY_IDS: &[(Body, &str, i32)] = &[
    (Body::Sun, "Sun", 0),
    (Body::Moon, "Moon", 1),
    (Body::Mercury, "Mercury", 2),
    (Body::Venus, "Venus", 3),
    (Body::Mars, "Mars", 4),
    (Body::Jupiter, "Jupiter", 5),
    (Body::Saturn, "Saturn", 6),
    (Body::Uranus, "Uranus", 7),
    (Body::Neptune, "Neptune", 8),
    (Body::Pluto, "Pluto", 9),
    (Body::MeanNode, "MeanNode", 10),
    (Body::TrueNode, "TrueNode", 11),
    (Body::Chiron, "Chiron", 15),
];

impl Body {
    fn entry(self) -> &'static (Body, &'static str, i32) {
        BODY_IDS
            .iter()
            .find(|(body, _, _)| *body == self)
            .unwrap_or(&BODY_IDS[0])
    }

    pub fn name(self) -> &'static str {
        self.entry().1
    }

    /// Swiss Ephemeris body number.
    pub fn swiss_id(self) -> i32 {
        self.entry().2
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Geocentric ecliptic position of a body (degrees, AU, per day)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EclipticPosition {
    /// Longitude in degrees [0, 360)
    pub longitude: f64,
    pub latitude: f64,
    pub distance: f64,
    pub speed_longitude: f64,
    pub speed_latitude: f64,
    pub speed_distance: f64,
}

impl EclipticPosition {
    /// Build a position, normalizing the longitude.
    pub fn new(
        longitude: f64,
        latitude: f64,
        distance: f64,
        speed_longitude: f64,
        speed_latitude: f64,
        speed_distance: f64,
    ) -> Self {
        Self {
            longitude: normalize_degrees(longitude),
            latitude,
            distance,
            speed_longitude,
            speed_latitude,
            speed_distance,
        }
    }
}

/// Equatorial coordinates of date (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquatorialPosition {
    pub right_ascension: f64,
    pub declination: f64,
}

/// Raw output of the provider's house primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawHouses {
    /// Cusps of houses 1..12, not necessarily normalized
    pub cusps: [f64; 12],
    pub ascendant: f64,
    pub mc: f64,
}

/// A resolved fixed star.
#[derive(Debug, Clone, PartialEq)]
pub struct StarPosition {
    /// Catalog name, e.g. "Aldebaran,alTau"
    pub name: String,
    pub position: EclipticPosition,
}

/// A global eclipse as reported by the provider, before classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEclipse {
    /// Time of greatest eclipse
    pub instant: JulianDay,
    /// Swiss-style type bitmask
    pub flags: u32,
}
