//! Angle helpers shared by the house, sect and lunation engines.

/// Mean synodic month in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_853;

/// Normalize an angle to [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid rounds to 360.0 for tiny negative inputs
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Signed difference `a - b` wrapped to (-180, 180].
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let d = normalize_degrees(a - b);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Zodiac sign index (0 = Aries .. 11 = Pisces) for a longitude.
pub fn sign_index(longitude: f64) -> u8 {
    ((normalize_degrees(longitude) / 30.0).floor() as u8).min(11)
}

/// Longitude of the start of the sign containing `longitude`.
pub fn sign_start(longitude: f64) -> f64 {
    30.0 * f64::from(sign_index(longitude))
}
