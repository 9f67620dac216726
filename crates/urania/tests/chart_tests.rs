mod common;

use common::{assert_normalized, tallinn, MockEphemeris};
use urania::ephemeris::RawEclipse;
use urania::ephemeris::shadow::ECL_TOTAL;
use urania::numeric::normalize_degrees;
use urania::{calc_chart, ChartError, ChartRequest, HouseSystem, NodeKind, SyzygyPolicy, ZoneSpec};

fn tallinn_request() -> ChartRequest {
    let zone = ZoneSpec::from_params(Some("Europe/Tallinn"), None).unwrap();
    ChartRequest::new("1971-06-22", "02:30", zone, tallinn())
}

#[test]
fn test_tallinn_chart_end_to_end() {
    let eph = MockEphemeris::new();
    let chart = calc_chart(&eph, &tallinn_request()).unwrap();

    assert_eq!(chart.time.datetime_utc, "1971-06-21T23:30:00+00:00");
    assert_eq!(chart.time.tz, "Europe/Tallinn");
    assert!(chart.time.datetime_local.ends_with("+03:00"));
    assert_eq!(chart.settings.engine, "mock");

    assert_eq!(chart.bodies.len(), 12);
    for name in ["Sun", "Moon", "Mercury", "Pluto", "LunarNode", "SouthNode"] {
        assert!(chart.bodies.contains_key(name), "missing {name}");
    }
    for entry in chart.bodies.values() {
        assert_normalized(entry.lon);
    }
    let north = chart.bodies["LunarNode"].lon;
    let south = chart.bodies["SouthNode"].lon;
    assert!((south - normalize_degrees(north + 180.0)).abs() < 1e-9);

    let houses = &chart.houses;
    assert_eq!(houses.cusps.cusp(1), Some(houses.angles.asc));
    assert_eq!(houses.cusps.cusp(10), Some(houses.angles.mc));

    let san = &chart.extras.syzygies;
    assert!(san.san1.jd_ut < chart.time.jd_ut);
    assert!(san.san2.jd_ut < san.san1.jd_ut);
    assert!(chart.extras.eclipses.is_none());
    assert!(chart.extras.stars.is_empty());
}

#[test]
fn test_offset_matches_named_zone() {
    let eph = MockEphemeris::new();
    let named = calc_chart(&eph, &tallinn_request()).unwrap();
    let request = ChartRequest::new("1971-06-22", "02:30", ZoneSpec::OffsetMinutes(180), tallinn());
    let offset = calc_chart(&eph, &request).unwrap();
    assert_eq!(named.time.jd_ut, offset.time.jd_ut);
    assert_eq!(offset.time.tz, "UTC+03:00");
}

#[test]
fn test_negative_offset_is_west_of_utc() {
    let eph = MockEphemeris::new();
    let request = ChartRequest::new("2020-01-15", "12:00", ZoneSpec::OffsetMinutes(-300), tallinn());
    let chart = calc_chart(&eph, &request).unwrap();
    assert_eq!(chart.time.tz, "UTC-05:00");
    assert_eq!(chart.time.datetime_local, "2020-01-15T12:00:00-05:00");
    assert_eq!(chart.time.datetime_utc, "2020-01-15T17:00:00+00:00");
}

#[test]
fn test_json_layout() {
    let eph = MockEphemeris::new();
    let mut request = tallinn_request();
    request.stars = vec!["Regulus".to_string(), "Vulcan".to_string()];
    let chart = calc_chart(&eph, &request).unwrap();
    let text = chart.to_json_pretty().unwrap();
    assert!(text.contains("\"SAN1\""));
    assert!(text.contains("\"SAN2\""));
    assert!(text.contains("\"PartOfFortune\""));

    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["time"]["datetimeUTC"], "1971-06-21T23:30:00+00:00");
    assert_eq!(json["settings"]["houseSystem"], "placidus");
    assert_eq!(json["settings"]["nodes"], "true");
    assert!(json["bodies"]["Sun"]["spd_lon"].is_number());
    assert_eq!(json["extras"]["stars"].as_array().unwrap().len(), 2);
    assert!(json["extras"]["stars"][1]["error"].is_string());
    assert!(json["extras"]["PartOfFortune"]["lon"].is_number());
}

#[test]
fn test_compact_output_and_options() {
    let eph = MockEphemeris::new();
    let mut request = tallinn_request();
    request.detail = false;
    request.node_kind = NodeKind::Mean;
    request.house_system = HouseSystem::WholeSign;
    request.syzygy_policy = SyzygyPolicy::NearestWins;
    let chart = calc_chart(&eph, &request).unwrap();

    let sun = &chart.bodies["Sun"];
    assert!(sun.lat.is_none() && sun.spd_lon.is_none());
    assert_eq!(chart.settings.nodes, NodeKind::Mean);
    assert_eq!(chart.houses.cusps.cusp(1).unwrap() % 30.0, 0.0);
}

#[test]
fn test_eclipses_listed_when_requested() {
    let eph = MockEphemeris {
        lunar: vec![RawEclipse {
            instant: urania::JulianDay(2_441_200.0),
            flags: ECL_TOTAL,
        }],
        ..MockEphemeris::new()
    };
    let mut request = tallinn_request();
    request.eclipse_count = 2;
    let chart = calc_chart(&eph, &request).unwrap();
    let eclipses = chart.extras.eclipses.as_ref().unwrap();
    assert!(eclipses.solar.is_empty());
    assert_eq!(eclipses.lunar.len(), 1);
    assert!(eclipses.lunar[0].event().unwrap().jd_ut > chart.time.jd_ut);
}

#[test]
fn test_conflicting_zone_is_rejected() {
    let err = ZoneSpec::from_params(Some("Europe/Tallinn"), Some(120)).unwrap_err();
    assert!(matches!(err, ChartError::ConflictingZone));
    assert!(err.is_invalid_input());

    let err = ZoneSpec::from_params(Some("Mars/Olympus"), None).unwrap_err();
    assert!(matches!(err, ChartError::UnknownTimezone { .. }));
}

#[test]
fn test_bad_inputs_fail_before_any_computation() {
    let eph = MockEphemeris::new();
    let mut request = tallinn_request();
    request.time = "25:99".to_string();
    let err = calc_chart(&eph, &request).unwrap_err();
    assert!(matches!(err, ChartError::InvalidDateTime { .. }));

    let mut request = tallinn_request();
    request.location.lat = -95.0;
    let err = calc_chart(&eph, &request).unwrap_err();
    assert!(matches!(err, ChartError::InvalidCoordinates { .. }));
    assert!(eph.house_calls.borrow().is_empty());
}
