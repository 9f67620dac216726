mod common;

use common::{tallinn, MockEphemeris};
use urania::sect::{
    fortune_longitude, is_diurnal, part_of_fortune, sun_altitude, FortuneFormula, FortuneOptions,
};
use urania::time::J2000_JD;
use urania::{ChartError, GeoLocation, JulianDay};

// At J2000.0 the mean Sun transits Greenwich within a few minutes of 12:00 UT.
const GREENWICH_NOON: JulianDay = JulianDay(J2000_JD);

#[test]
fn test_diurnal_at_local_noon_and_nocturnal_at_midnight() {
    let eph = MockEphemeris::new();
    let equator = GeoLocation { lat: 0.0, lon: 0.0 };
    assert!(is_diurnal(&eph, GREENWICH_NOON, equator).unwrap());
    assert!(!is_diurnal(&eph, GREENWICH_NOON.add_days(0.5), equator).unwrap());
}

#[test]
fn test_local_noon_follows_longitude() {
    let eph = MockEphemeris::new();
    let east = GeoLocation { lat: 20.0, lon: 90.0 };
    // local noon at 90E is six hours earlier in UT
    let noon = GREENWICH_NOON.add_days(-0.25);
    assert!(is_diurnal(&eph, noon, east).unwrap());
    assert!(!is_diurnal(&eph, noon.add_days(0.5), east).unwrap());
}

#[test]
fn test_noon_altitude_matches_declination() {
    let eph = MockEphemeris::new();
    // January Sun near -23 deg declination: noon altitude at 50N is about 17 deg
    let alt = sun_altitude(&eph, GREENWICH_NOON, GeoLocation { lat: 50.0, lon: 0.0 }).unwrap();
    assert!((alt - 17.0).abs() < 0.5, "altitude {alt}");
}

#[test]
fn test_without_sect_only_angles_matter() {
    let eph = MockEphemeris::new();
    let options = FortuneOptions {
        use_sect: false,
        force_diurnal: Some(false),
    };
    let a = part_of_fortune(&eph, GREENWICH_NOON, tallinn(), 100.0, 10.0, 40.0, options).unwrap();
    let b = part_of_fortune(
        &eph,
        GREENWICH_NOON.add_days(0.5),
        GeoLocation { lat: -45.0, lon: 170.0 },
        100.0,
        10.0,
        40.0,
        options,
    )
    .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.longitude, 130.0);
    assert_eq!(a.diurnal, None);
    assert_eq!(a.formula, FortuneFormula::Always);
}

#[test]
fn test_forced_sect_overrides_sky() {
    let eph = MockEphemeris::new();
    let equator = GeoLocation { lat: 0.0, lon: 0.0 };
    let midnight = GREENWICH_NOON.add_days(0.5);
    let options = FortuneOptions {
        use_sect: true,
        force_diurnal: Some(true),
    };
    let pof = part_of_fortune(&eph, midnight, equator, 100.0, 10.0, 40.0, options).unwrap();
    assert_eq!(pof.diurnal, Some(true));
    assert_eq!(pof.longitude, 130.0);
}

#[test]
fn test_night_chart_reverses_formula() {
    let eph = MockEphemeris::new();
    let equator = GeoLocation { lat: 0.0, lon: 0.0 };
    let midnight = GREENWICH_NOON.add_days(0.5);
    let pof =
        part_of_fortune(&eph, midnight, equator, 100.0, 10.0, 40.0, FortuneOptions::default())
            .unwrap();
    assert_eq!(pof.diurnal, Some(false));
    assert_eq!(pof.formula, FortuneFormula::Sect);
    assert_eq!(pof.longitude, fortune_longitude(100.0, 10.0, 40.0, false));
    assert_eq!(pof.longitude, 70.0);
}

#[test]
fn test_result_is_normalized() {
    assert_eq!(fortune_longitude(350.0, 300.0, 20.0, true), 70.0);
    assert_eq!(fortune_longitude(5.0, 20.0, 300.0, true), 285.0);
}

#[test]
fn test_sect_rejects_bad_coordinates() {
    let eph = MockEphemeris::new();
    let bad = GeoLocation { lat: 0.0, lon: 200.0 };
    let err = is_diurnal(&eph, GREENWICH_NOON, bad).unwrap_err();
    assert!(matches!(err, ChartError::InvalidCoordinates { .. }));
}
