//! Eclipse search from Sun/Moon geometry.
//!
//! New and full Moons come from the lunation solver run forward. At each
//! syzygy the time of least separation is refined, then:
//!
//! * lunar: the Moon's disc is compared against Earth's shadow radii at the
//!   Moon's distance, enlarged 2% (Danjon);
//! * solar: the shadow-axis distance from the geocentre in Earth radii
//!   (gamma) decides whether the eclipse is central somewhere on Earth, and
//!   the apparent disc sizes decide total, annular or hybrid.
//!
//! Results are reported as the Swiss Ephemeris type bitmask.

use log::debug;

use crate::ephemeris::types::{Body, EclipticPosition, RawEclipse};
use crate::ephemeris::{Ephemeris, EphemerisError};
use crate::error::ChartError;
use crate::lunation::{next_lunation, LunationKind, SolverConfig};
use crate::time::JulianDay;

pub const ECL_CENTRAL: u32 = 1;
pub const ECL_NONCENTRAL: u32 = 2;
pub const ECL_TOTAL: u32 = 4;
pub const ECL_ANNULAR: u32 = 8;
pub const ECL_PARTIAL: u32 = 16;
pub const ECL_ANNULAR_TOTAL: u32 = 32;
pub const ECL_PENUMBRAL: u32 = 64;

const EARTH_RADIUS_KM: f64 = 6378.137;
const SUN_RADIUS_KM: f64 = 696_000.0;
const MOON_RADIUS_KM: f64 = 1737.4;
const AU_KM: f64 = 149_597_870.7;

const DANJON_ENLARGEMENT: f64 = 1.02;

/// Gamma below which the shadow axis meets Earth's flattened surface.
const CENTRAL_GAMMA_LIMIT: f64 = 0.9972;

/// Syzygies examined before a search gives up.
const MAX_LUNATIONS: usize = 50;

/// Half-width in days of the window searched for least separation.
const REFINE_HALF_WINDOW: f64 = 0.25;
const REFINE_ITERATIONS: usize = 60;

/// Angular separation of two ecliptic positions in degrees.
fn separation_deg(a: &EclipticPosition, b: &EclipticPosition) -> f64 {
    let (sb1, cb1) = a.latitude.to_radians().sin_cos();
    let (sb2, cb2) = b.latitude.to_radians().sin_cos();
    let dl = (a.longitude - b.longitude).to_radians();
    (sb1 * sb2 + cb1 * cb2 * dl.cos()).clamp(-1.0, 1.0).acos().to_degrees()
}

struct Luminaries {
    sun: EclipticPosition,
    moon: EclipticPosition,
}

impl Luminaries {
    fn at<E: Ephemeris + ?Sized>(eph: &E, jd: JulianDay) -> Result<Self, EphemerisError> {
        Ok(Self {
            sun: eph.position(jd, Body::Sun)?,
            moon: eph.position(jd, Body::Moon)?,
        })
    }

    fn sun_km(&self) -> f64 {
        self.sun.distance * AU_KM
    }

    fn moon_km(&self) -> f64 {
        self.moon.distance * AU_KM
    }

    fn separation(&self) -> f64 {
        separation_deg(&self.sun, &self.moon)
    }
}

fn angular_radius_deg(radius_km: f64, distance_km: f64) -> f64 {
    (radius_km / distance_km).clamp(-1.0, 1.0).asin().to_degrees()
}

/// Bitmask for a lunar eclipse, 0 when the Moon misses the penumbra.
pub fn classify_lunar(shadow_offset: f64, moon_radius: f64, umbra: f64, penumbra: f64) -> u32 {
    let near = shadow_offset - moon_radius;
    let far = shadow_offset + moon_radius;
    if near >= penumbra {
        0
    } else if far <= umbra {
        ECL_TOTAL
    } else if near < umbra {
        ECL_PARTIAL
    } else {
        ECL_PENUMBRAL
    }
}

fn lunar_flags(l: &Luminaries) -> u32 {
    let sun_km = l.sun_km();
    let moon_km = l.moon_km();
    if !(sun_km > 0.0 && moon_km > 0.0) {
        return 0;
    }
    let pi_sun = angular_radius_deg(EARTH_RADIUS_KM, sun_km);
    let pi_moon = angular_radius_deg(EARTH_RADIUS_KM, moon_km);
    let s_sun = angular_radius_deg(SUN_RADIUS_KM, sun_km);
    let penumbra = DANJON_ENLARGEMENT * (pi_moon + pi_sun + s_sun);
    let umbra = DANJON_ENLARGEMENT * (pi_moon + pi_sun - s_sun);
    let moon_radius = angular_radius_deg(MOON_RADIUS_KM, moon_km);
    let offset = (180.0 - l.separation()).abs();
    classify_lunar(offset, moon_radius, umbra, penumbra)
}

/// Geometry of a global solar eclipse at greatest eclipse.
#[derive(Debug, Clone, Copy)]
pub struct SolarGeometry {
    /// Sun/Moon geocentric separation, degrees
    pub separation: f64,
    pub sun_radius: f64,
    pub moon_radius: f64,
    /// Moon's apparent radius seen from the sub-lunar point
    pub moon_radius_topocentric: f64,
    pub moon_parallax: f64,
    pub sun_parallax: f64,
}

/// Bitmask for a global solar eclipse, 0 when the penumbra misses Earth.
pub fn classify_solar(g: &SolarGeometry) -> u32 {
    let scale = g.moon_parallax - g.sun_parallax;
    if scale <= 0.0 {
        return 0;
    }
    let gamma = g.separation / scale;
    let penumbra = (g.moon_radius + g.sun_radius) / scale;
    let umbra = (g.moon_radius - g.sun_radius) / scale;

    if gamma >= 1.0 + penumbra {
        return 0;
    }

    let dark = if umbra > 0.0 {
        ECL_TOTAL
    } else if g.moon_radius_topocentric >= g.sun_radius {
        ECL_ANNULAR_TOTAL
    } else {
        ECL_ANNULAR
    };

    if gamma < CENTRAL_GAMMA_LIMIT {
        ECL_CENTRAL | dark
    } else if gamma < CENTRAL_GAMMA_LIMIT + umbra.abs() {
        // umbra grazes Earth without the axis touching it
        ECL_NONCENTRAL | if dark == ECL_ANNULAR_TOTAL { ECL_ANNULAR } else { dark }
    } else {
        ECL_NONCENTRAL | ECL_PARTIAL
    }
}

fn solar_flags(l: &Luminaries) -> u32 {
    let sun_km = l.sun_km();
    let moon_km = l.moon_km();
    if !(sun_km > 0.0 && moon_km > EARTH_RADIUS_KM) {
        return 0;
    }
    classify_solar(&SolarGeometry {
        separation: l.separation(),
        sun_radius: angular_radius_deg(SUN_RADIUS_KM, sun_km),
        moon_radius: angular_radius_deg(MOON_RADIUS_KM, moon_km),
        moon_radius_topocentric: angular_radius_deg(MOON_RADIUS_KM, moon_km - EARTH_RADIUS_KM),
        moon_parallax: angular_radius_deg(EARTH_RADIUS_KM, moon_km),
        sun_parallax: angular_radius_deg(EARTH_RADIUS_KM, sun_km),
    })
}

/// Golden-section search for the instant closest to exact alignment.
fn refine_greatest<E, F>(eph: &E, center: JulianDay, cost: F) -> Result<JulianDay, EphemerisError>
where
    E: Ephemeris + ?Sized,
    F: Fn(&Luminaries) -> f64,
{
    let ratio = 0.5 * (5f64.sqrt() - 1.0);
    let mut a = center.0 - REFINE_HALF_WINDOW;
    let mut b = center.0 + REFINE_HALF_WINDOW;
    let mut c = b - ratio * (b - a);
    let mut d = a + ratio * (b - a);
    let mut fc = cost(&Luminaries::at(eph, JulianDay(c))?);
    let mut fd = cost(&Luminaries::at(eph, JulianDay(d))?);
    for _ in 0..REFINE_ITERATIONS {
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - ratio * (b - a);
            fc = cost(&Luminaries::at(eph, JulianDay(c))?);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + ratio * (b - a);
            fd = cost(&Luminaries::at(eph, JulianDay(d))?);
        }
    }
    Ok(JulianDay(0.5 * (a + b)))
}

fn search_error(err: ChartError) -> EphemerisError {
    match err {
        ChartError::Provider(inner) => inner,
        other => EphemerisError::EclipseSearchFailed {
            message: other.to_string(),
        },
    }
}

fn next_eclipse<E, C, K>(
    eph: &E,
    after: JulianDay,
    kind: LunationKind,
    cost: C,
    classify: K,
) -> Result<Option<RawEclipse>, EphemerisError>
where
    E: Ephemeris + ?Sized,
    C: Fn(&Luminaries) -> f64 + Copy,
    K: Fn(&Luminaries) -> u32,
{
    let config = SolverConfig::default();
    let mut from = after;
    for _ in 0..MAX_LUNATIONS {
        let syzygy = next_lunation(eph, from, kind, &config).map_err(search_error)?;
        if syzygy.degraded {
            return Err(EphemerisError::EclipseSearchFailed {
                message: format!("no {} found after {}", kind, from),
            });
        }

        let greatest = refine_greatest(eph, syzygy.instant, cost)?;
        if greatest.0 > after.0 {
            let flags = classify(&Luminaries::at(eph, greatest)?);
            if flags != 0 {
                debug!("{} eclipse at {} flags {:#b}", kind, greatest, flags);
                return Ok(Some(RawEclipse {
                    instant: greatest,
                    flags,
                }));
            }
        }
        from = syzygy.instant.add_days(1.0);
    }
    Ok(None)
}

/// Next global solar eclipse after `after`.
pub fn next_solar_eclipse<E: Ephemeris + ?Sized>(
    eph: &E,
    after: JulianDay,
) -> Result<Option<RawEclipse>, EphemerisError> {
    next_eclipse(eph, after, LunationKind::New, |l| l.separation(), solar_flags)
}

/// Next lunar eclipse after `after`.
pub fn next_lunar_eclipse<E: Ephemeris + ?Sized>(
    eph: &E,
    after: JulianDay,
) -> Result<Option<RawEclipse>, EphemerisError> {
    next_eclipse(eph, after, LunationKind::Full, |l| 180.0 - l.separation(), lunar_flags)
}
