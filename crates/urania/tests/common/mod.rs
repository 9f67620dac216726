#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use urania::ephemeris::{
    shadow, Body, EclipticPosition, EquatorialPosition, GeoLocation, RawEclipse, RawHouses,
    StarPosition,
};
use urania::numeric::normalize_degrees;
use urania::time::{greenwich_mean_sidereal_hours, J2000_JD};
use urania::{Ephemeris, EphemerisError, JulianDay};

pub const OBLIQUITY: f64 = 23.439_291_1;

pub const SUN_RATE: f64 = 0.985_647_4;
pub const MOON_RATE: f64 = 13.176_396;

/// Raw cusps come back this far from the true angles so locking is visible.
pub const CUSP_SKEW: f64 = 1.0;

/// Uniform-motion Sun and Moon with a textbook ascendant. Everything else is
/// a straight line in longitude.
pub struct MockEphemeris {
    pub moon_rate: f64,
    pub moon_epoch: f64,
    /// Constant ecliptic latitude of the Moon
    pub moon_latitude: f64,
    pub house_calls: RefCell<Vec<u8>>,
    pub failing_house_code: Option<u8>,
    pub stars: Vec<(&'static str, f64)>,
    /// Search eclipses from the Sun and Moon instead of the schedules below
    pub geometric: bool,
    pub solar: Vec<RawEclipse>,
    pub lunar: Vec<RawEclipse>,
    /// Solar searches that succeed before every later one fails
    pub solar_fail_after: Option<usize>,
    pub solar_calls: Cell<usize>,
}

impl MockEphemeris {
    pub fn new() -> Self {
        Self {
            moon_rate: MOON_RATE,
            moon_epoch: 218.316,
            moon_latitude: 0.0,
            house_calls: RefCell::new(Vec::new()),
            failing_house_code: None,
            stars: vec![("Regulus", 149.83), ("Spica", 203.84), ("Aldebaran,alTau", 69.79)],
            geometric: false,
            solar: Vec::new(),
            lunar: Vec::new(),
            solar_fail_after: None,
            solar_calls: Cell::new(0),
        }
    }

    /// Moon locked 90 degrees ahead of the Sun: no lunation ever happens.
    pub fn frozen_phase() -> Self {
        Self {
            moon_rate: SUN_RATE,
            moon_epoch: 280.46 + 90.0,
            ..Self::new()
        }
    }

    pub fn sun_longitude(&self, jd: JulianDay) -> f64 {
        normalize_degrees(280.46 + SUN_RATE * (jd.0 - J2000_JD))
    }

    pub fn moon_longitude(&self, jd: JulianDay) -> f64 {
        normalize_degrees(self.moon_epoch + self.moon_rate * (jd.0 - J2000_JD))
    }

    fn line(&self, jd: JulianDay, body: Body) -> (f64, f64) {
        let d = jd.0 - J2000_JD;
        match body {
            Body::Sun => (self.sun_longitude(jd), SUN_RATE),
            Body::Moon => (self.moon_longitude(jd), self.moon_rate),
            Body::MeanNode | Body::TrueNode => (125.04 - 0.052_953_9 * d, -0.052_953_9),
            other => {
                let rate = 1.0 / f64::from(other.swiss_id() + 1);
                (30.0 * f64::from(other.swiss_id()) + rate * d, rate)
            }
        }
    }
}

impl Default for MockEphemeris {
    fn default() -> Self {
        Self::new()
    }
}

fn ecliptic_to_equatorial(lon: f64) -> (f64, f64) {
    let (sl, cl) = lon.to_radians().sin_cos();
    let (se, ce) = OBLIQUITY.to_radians().sin_cos();
    let ra = normalize_degrees((sl * ce).atan2(cl).to_degrees());
    let dec = (se * sl).asin().to_degrees();
    (ra, dec)
}

/// Ascendant and MC from local sidereal time and latitude.
pub fn textbook_angles(jd: JulianDay, location: GeoLocation) -> (f64, f64) {
    let ramc = normalize_degrees(greenwich_mean_sidereal_hours(jd) * 15.0 + location.lon).to_radians();
    let eps = OBLIQUITY.to_radians();
    let phi = location.lat.to_radians();
    let mc = normalize_degrees(ramc.sin().atan2(ramc.cos() * eps.cos()).to_degrees());
    let asc = normalize_degrees(
        ramc.cos()
            .atan2(-(ramc.sin() * eps.cos() + phi.tan() * eps.sin()))
            .to_degrees(),
    );
    (asc, mc)
}

impl Ephemeris for MockEphemeris {
    fn name(&self) -> &str {
        "mock"
    }

    fn position(&self, jd: JulianDay, body: Body) -> Result<EclipticPosition, EphemerisError> {
        let (lon, speed) = self.line(jd, body);
        let (latitude, distance) = match body {
            Body::Sun => (0.0, 1.0),
            Body::Moon => (self.moon_latitude, 0.002_57),
            _ => (0.0, 5.0),
        };
        Ok(EclipticPosition::new(lon, latitude, distance, speed, 0.0, 0.0))
    }

    fn equatorial_position(
        &self,
        jd: JulianDay,
        body: Body,
    ) -> Result<EquatorialPosition, EphemerisError> {
        let (lon, _) = self.line(jd, body);
        let (ra, dec) = ecliptic_to_equatorial(lon);
        Ok(EquatorialPosition {
            right_ascension: ra,
            declination: dec,
        })
    }

    fn sidereal_time(&self, jd: JulianDay) -> Result<f64, EphemerisError> {
        Ok(greenwich_mean_sidereal_hours(jd))
    }

    fn house_cusps(
        &self,
        jd: JulianDay,
        location: GeoLocation,
        code: u8,
    ) -> Result<RawHouses, EphemerisError> {
        self.house_calls.borrow_mut().push(code);
        if self.failing_house_code == Some(code) {
            return Err(EphemerisError::HouseCalculationFailed {
                message: format!("system {} undefined here", code as char),
            });
        }
        let (asc, mc) = textbook_angles(jd, location);
        let mut cusps = [0.0; 12];
        for (i, cusp) in cusps.iter_mut().enumerate() {
            // unnormalized on purpose
            *cusp = asc + 30.0 * i as f64 + CUSP_SKEW;
        }
        Ok(RawHouses {
            cusps,
            ascendant: asc + 360.0,
            mc,
        })
    }

    fn star_position(&self, name: &str, jd: JulianDay) -> Result<StarPosition, EphemerisError> {
        let t = (jd.0 - J2000_JD) / 36_525.0;
        self.stars
            .iter()
            .find(|(star, _)| *star == name || star.split(',').next() == Some(name))
            .map(|(star, lon)| StarPosition {
                name: star.to_string(),
                position: EclipticPosition::new(lon + 1.397 * t, 0.5, 0.0, 3.8e-5, 0.0, 0.0),
            })
            .ok_or_else(|| EphemerisError::StarNotFound {
                name: name.to_string(),
            })
    }

    fn next_solar_eclipse(&self, jd: JulianDay) -> Result<Option<RawEclipse>, EphemerisError> {
        if self.geometric {
            return shadow::next_solar_eclipse(self, jd);
        }
        let calls = self.solar_calls.get();
        self.solar_calls.set(calls + 1);
        if let Some(limit) = self.solar_fail_after {
            if calls >= limit {
                return Err(EphemerisError::EclipseSearchFailed {
                    message: "ephemeris file missing for this range".to_string(),
                });
            }
        }
        Ok(self.solar.iter().copied().find(|e| e.instant.0 > jd.0))
    }

    fn next_lunar_eclipse(&self, jd: JulianDay) -> Result<Option<RawEclipse>, EphemerisError> {
        if self.geometric {
            return shadow::next_lunar_eclipse(self, jd);
        }
        Ok(self.lunar.iter().copied().find(|e| e.instant.0 > jd.0))
    }
}

pub fn tallinn() -> GeoLocation {
    GeoLocation {
        lat: 59.4167,
        lon: 24.75,
    }
}

pub fn assert_normalized(value: f64) {
    assert!((0.0..360.0).contains(&value), "{value} not in [0, 360)");
}
