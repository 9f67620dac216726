//! Fixed-star catalog in the `sefstars.txt` layout.
//!
//! One star per line, comma separated:
//! name, nomenclature, frame, RA h/m/s, Dec d/m/s, proper motion in RA and
//! Dec (mas/yr, RA already scaled by cos Dec), radial velocity (km/s),
//! parallax (mas), visual magnitude (ignored). Lines starting with `#` are comments.

use std::fs;
use std::path::Path;

use log::debug;

use crate::ephemeris::types::EclipticPosition;
use crate::ephemeris::EphemerisError;
use crate::numeric::normalize_degrees;
use crate::time::{JulianDay, J2000_JD};

/// Mean obliquity of the ecliptic at J2000.0 in degrees.
const OBLIQUITY_J2000: f64 = 23.439_291_1;

/// AU per parsec.
const AU_PER_PARSEC: f64 = 206_264.806;

const MAS_PER_DEGREE: f64 = 3_600_000.0;

/// One catalog entry at epoch J2000.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStar {
    pub name: String,
    pub nomenclature: String,
    /// Right ascension in degrees
    pub ra: f64,
    /// Declination in degrees
    pub dec: f64,
    /// Proper motion in RA times cos Dec, mas/yr
    pub pm_ra: f64,
    /// Proper motion in Dec, mas/yr
    pub pm_dec: f64,
    /// Parallax in mas, zero when unknown
    pub parallax: f64,
}

impl CatalogStar {
    /// Label in the catalog's own `name,nomenclature` form.
    pub fn label(&self) -> String {
        format!("{},{}", self.name, self.nomenclature)
    }

    /// Tropical ecliptic position of date.
    ///
    /// Proper motion is applied linearly from J2000, the result is rotated
    /// to ecliptic J2000 and carried to the equinox of date by general
    /// precession in longitude.
    pub fn ecliptic_position(&self, jd: JulianDay) -> EclipticPosition {
        let years = (jd.days() - J2000_JD) / 365.25;
        let dec = self.dec + self.pm_dec * years / MAS_PER_DEGREE;
        let cos_dec = self.dec.to_radians().cos();
        let ra = if cos_dec.abs() > 1e-12 {
            self.ra + self.pm_ra / cos_dec * years / MAS_PER_DEGREE
        } else {
            self.ra
        };

        let (lon_j2000, lat) = equatorial_to_ecliptic(ra, dec, OBLIQUITY_J2000);

        let t = jd.centuries_since_j2000();
        let precession_arcsec = 5028.796_195 * t + 1.105_434_8 * t * t;
        let rate_arcsec_per_century = 5028.796_195 + 2.0 * 1.105_434_8 * t;

        let distance = if self.parallax > 0.0 {
            1000.0 / self.parallax * AU_PER_PARSEC
        } else {
            0.0
        };

        EclipticPosition::new(
            lon_j2000 + precession_arcsec / 3600.0,
            lat,
            distance,
            rate_arcsec_per_century / 3600.0 / 36_525.0,
            0.0,
            0.0,
        )
    }

    fn matches(&self, key: &str) -> bool {
        self.name.eq_ignore_ascii_case(key)
            || self.nomenclature.eq_ignore_ascii_case(key)
            || self.label().eq_ignore_ascii_case(key)
    }
}

/// Rotate equatorial (RA, Dec) to ecliptic (longitude, latitude), degrees.
pub fn equatorial_to_ecliptic(ra: f64, dec: f64, obliquity: f64) -> (f64, f64) {
    let (sa, ca) = ra.to_radians().sin_cos();
    let (sd, cd) = dec.to_radians().sin_cos();
    let (se, ce) = obliquity.to_radians().sin_cos();

    let lat = (sd * ce - cd * se * sa).clamp(-1.0, 1.0).asin();
    let lon = (sa * cd * ce + sd * se).atan2(ca * cd);
    (normalize_degrees(lon.to_degrees()), lat.to_degrees())
}

#[derive(Debug, Clone, Default)]
pub struct StarCatalog {
    stars: Vec<CatalogStar>,
}

impl StarCatalog {
    /// Read a catalog file from disk.
    pub fn load(path: &Path) -> Result<Self, EphemerisError> {
        let text = fs::read_to_string(path).map_err(|e| EphemerisError::FileNotFound {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::parse(&text))
    }

    /// Parse catalog text. Malformed lines and non-J2000 frames are skipped.
    pub fn parse(text: &str) -> Self {
        let mut stars = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Some(star) => stars.push(star),
                None => debug!("skipping star catalog line {}", lineno + 1),
            }
        }
        Self { stars }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Case-insensitive lookup by traditional name, nomenclature or the
    /// combined `name,nomenclature` label. First catalog entry wins.
    pub fn find(&self, name: &str) -> Option<&CatalogStar> {
        let key = name.trim();
        if key.is_empty() {
            return None;
        }
        self.stars.iter().find(|star| star.matches(key))
    }
}

fn parse_line(line: &str) -> Option<CatalogStar> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 14 {
        return None;
    }

    let frame = fields[2];
    if !(frame.eq_ignore_ascii_case("ICRS") || frame == "2000") {
        return None;
    }

    let num = |i: usize| fields[i].parse::<f64>().ok();

    let ra = 15.0 * (num(3)? + num(4)? / 60.0 + num(5)? / 3600.0);
    let dec_deg = num(6)?;
    let dec_abs = dec_deg.abs() + num(7)? / 60.0 + num(8)? / 3600.0;
    // "-00" parses to +0.0, so the sign is taken from the text
    let dec = if fields[6].starts_with('-') { -dec_abs } else { dec_abs };

    let name = fields[0].to_string();
    let nomenclature = fields[1].to_string();
    if name.is_empty() && nomenclature.is_empty() {
        return None;
    }

    Some(CatalogStar {
        name,
        nomenclature,
        ra,
        dec,
        pm_ra: num(9)?,
        pm_dec: num(10)?,
        parallax: num(12).unwrap_or(0.0),
    })
}
