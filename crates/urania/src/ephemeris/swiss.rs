use std::env;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use swisseph::swe::{calc_ut, houses_ex};
use swisseph::{AscMc, Cusp};

use crate::ephemeris::catalog::StarCatalog;
use crate::ephemeris::shadow;
use crate::ephemeris::types::{
    Body, EclipticPosition, EquatorialPosition, GeoLocation, RawEclipse, RawHouses, StarPosition,
};
use crate::ephemeris::{Ephemeris, EphemerisError};
use crate::time::{greenwich_mean_sidereal_hours, JulianDay};

/// Use Swiss Ephemeris data files
const FLG_SWIEPH: i32 = 2;
const FLG_SPEED: i32 = 256;
const FLG_EQUATORIAL: i32 = 2048;

const DEFAULT_EPHEMERIS_PATH: &str = "/usr/local/share/swisseph";
const EPHEMERIS_PATH_ENV: &str = "SWISS_EPHEMERIS_PATH";
const STAR_CATALOG_FILE: &str = "sefstars.txt";

/// Swiss Ephemeris backed provider.
pub struct SwissEphemeris {
    ephemeris_path: PathBuf,
    stars: StarCatalog,
}

impl SwissEphemeris {
    /// Open the data directory. An explicit directory wins, then
    /// `SWISS_EPHEMERIS_PATH`, then the usual install prefix.
    pub fn new(ephemeris_path: Option<PathBuf>) -> Result<Self, EphemerisError> {
        let path = match ephemeris_path {
            Some(dir) => dir,
            None => env::var_os(EPHEMERIS_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EPHEMERIS_PATH)),
        };
        if !path.is_dir() {
            return Err(EphemerisError::FileNotFound {
                path: path.display().to_string(),
                message: format!(
                    "no Swiss Ephemeris data directory here; set {} or [ephemeris] path",
                    EPHEMERIS_PATH_ENV
                ),
            });
        }

        let catalog_path = path.join(STAR_CATALOG_FILE);
        let stars = if catalog_path.exists() {
            StarCatalog::load(&catalog_path)?
        } else {
            warn!(
                "{} not found in {}, fixed star lookups will fail",
                STAR_CATALOG_FILE,
                path.display()
            );
            StarCatalog::default()
        };

        info!(
            "Swiss Ephemeris ready at {} ({} catalog stars)",
            path.display(),
            stars.len()
        );

        Ok(Self {
            ephemeris_path: path,
            stars,
        })
    }

    pub fn ephemeris_path(&self) -> &Path {
        &self.ephemeris_path
    }

    fn calc(&self, jd: JulianDay, body: Body, flags: i32) -> Result<[f64; 6], EphemerisError> {
        let result = calc_ut(jd.days(), body.swiss_id() as u32, flags as u32).map_err(|e| {
            EphemerisError::CalculationFailed {
                body: body.name().to_string(),
                jd,
                message: format!("Swiss Ephemeris error: {}", e),
            }
        })?;

        let out = result.out;
        let values = [out[0], out[1], out[2], out[3], out[4], out[5]];
        if values[..2].iter().any(|v| !v.is_finite()) {
            return Err(EphemerisError::CalculationFailed {
                body: body.name().to_string(),
                jd,
                message: "non-finite coordinates".to_string(),
            });
        }
        Ok(values)
    }
}

impl Ephemeris for SwissEphemeris {
    fn name(&self) -> &str {
        "swisseph"
    }

    fn position(&self, jd: JulianDay, body: Body) -> Result<EclipticPosition, EphemerisError> {
        let out = self.calc(jd, body, FLG_SWIEPH | FLG_SPEED)?;
        Ok(EclipticPosition::new(
            out[0], out[1], out[2], out[3], out[4], out[5],
        ))
    }

    fn equatorial_position(
        &self,
        jd: JulianDay,
        body: Body,
    ) -> Result<EquatorialPosition, EphemerisError> {
        let out = self.calc(jd, body, FLG_SWIEPH | FLG_EQUATORIAL)?;
        Ok(EquatorialPosition {
            right_ascension: out[0].rem_euclid(360.0),
            declination: out[1],
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
        debug!(
            "houses_ex {} lat {} lon {} system {}",
            jd, location.lat, location.lon, code as char
        );
        let (c, a) = houses_ex(jd.days(), FLG_SWIEPH, location.lat, location.lon, code as i32);
        let cusps = Cusp::from_array(c);
        let ascmc = AscMc::from_array(a);

        let raw = RawHouses {
            cusps: [
                cusps.first,
                cusps.second,
                cusps.third,
                cusps.fourth,
                cusps.fifth,
                cusps.sixth,
                cusps.seventh,
                cusps.eighth,
                cusps.ninth,
                cusps.tenth,
                cusps.eleventh,
                cusps.twelfth,
            ],
            ascendant: ascmc.ascendant,
            mc: ascmc.mc,
        };

        // Quadrant systems are undefined inside the polar circles; the
        // library reports that with garbage values rather than an error.
        if raw.cusps.iter().chain([&raw.ascendant, &raw.mc]).any(|v| !v.is_finite()) {
            return Err(EphemerisError::HouseCalculationFailed {
                message: format!(
                    "system '{}' gave no finite cusps at latitude {}",
                    code as char, location.lat
                ),
            });
        }
        Ok(raw)
    }

    fn star_position(&self, name: &str, jd: JulianDay) -> Result<StarPosition, EphemerisError> {
        let star = self
            .stars
            .find(name)
            .ok_or_else(|| EphemerisError::StarNotFound {
                name: name.to_string(),
            })?;
        Ok(StarPosition {
            name: star.label(),
            position: star.ecliptic_position(jd),
        })
    }

    fn next_solar_eclipse(&self, jd: JulianDay) -> Result<Option<RawEclipse>, EphemerisError> {
        shadow::next_solar_eclipse(self, jd)
    }

    fn next_lunar_eclipse(&self, jd: JulianDay) -> Result<Option<RawEclipse>, EphemerisError> {
        shadow::next_lunar_eclipse(self, jd)
    }
}
