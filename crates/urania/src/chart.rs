//! Natal chart assembly.
//!
//! Ties the engines together for one birth moment: body positions, houses,
//! Part of Fortune, prenatal syzygies, fixed stars and optionally the
//! eclipses that follow.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::eclipses::{next_eclipses, EclipseReport};
use crate::ephemeris::{Body, EclipticPosition, Ephemeris, GeoLocation};
use crate::error::ChartError;
use crate::houses::{compute_houses, HouseResult, HouseSystem};
use crate::lunation::{prenatal_syzygies, PrenatalSyzygies, SolverConfig, SyzygyPolicy};
use crate::numeric::normalize_degrees;
use crate::sect::{part_of_fortune, FortuneOptions, PartOfFortune};
use crate::stars::{star_positions, StarEntry};
use crate::time::{resolve_local_time, ZoneSpec};

/// Bodies reported in every chart, in output order.
pub const CHART_BODIES: &[Body] = &[
    Body::Sun,
    Body::Moon,
    Body::Mercury,
    Body::Venus,
    Body::Mars,
    Body::Jupiter,
    Body::Saturn,
    Body::Uranus,
    Body::Neptune,
    Body::Pluto,
];

/// Which lunar node the chart uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    True,
    Mean,
}

impl NodeKind {
    pub fn body(self) -> Body {
        match self {
            Self::True => Body::TrueNode,
            Self::Mean => Body::MeanNode,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("true"),
            Self::Mean => f.write_str("mean"),
        }
    }
}

impl FromStr for NodeKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true" | "true node" | "true_node" => Ok(Self::True),
            "mean" | "mean node" | "mean_node" => Ok(Self::Mean),
            _ => Err(ChartError::InvalidOption {
                name: "node kind",
                value: s.to_string(),
                valid: vec!["true".to_string(), "mean".to_string()],
            }),
        }
    }
}

/// Everything needed to cast one chart.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    /// Local date, `YYYY-MM-DD`
    pub date: String,
    /// Local time, `HH:MM` or `HH:MM:SS`
    pub time: String,
    pub zone: ZoneSpec,
    pub location: GeoLocation,
    pub house_system: HouseSystem,
    pub node_kind: NodeKind,
    pub stars: Vec<String>,
    /// Emit latitude, distance and speeds as well as longitude
    pub detail: bool,
    pub fortune: FortuneOptions,
    pub syzygy_policy: SyzygyPolicy,
    /// Eclipses of each kind to list after the birth, 0 for none
    pub eclipse_count: usize,
    pub solver: SolverConfig,
}

impl ChartRequest {
    pub fn new(date: &str, time: &str, zone: ZoneSpec, location: GeoLocation) -> Self {
        Self {
            date: date.to_string(),
            time: time.to_string(),
            zone,
            location,
            house_system: HouseSystem::Placidus,
            node_kind: NodeKind::default(),
            stars: Vec::new(),
            detail: true,
            fortune: FortuneOptions::default(),
            syzygy_policy: SyzygyPolicy::default(),
            eclipse_count: 0,
            solver: SolverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyEntry {
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spd_lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spd_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spd_dist: Option<f64>,
}

impl BodyEntry {
    pub fn new(p: &EclipticPosition, detail: bool) -> Self {
        if !detail {
            return Self {
                lon: p.longitude,
                lat: None,
                dist: None,
                spd_lon: None,
                spd_lat: None,
                spd_dist: None,
            };
        }
        Self {
            lon: p.longitude,
            lat: Some(p.latitude),
            dist: Some(p.distance),
            spd_lon: Some(p.speed_longitude),
            spd_lat: Some(p.speed_latitude),
            spd_dist: Some(p.speed_distance),
        }
    }
}

/// South node: the north node reflected through the Earth.
pub fn south_node(north: &EclipticPosition) -> EclipticPosition {
    EclipticPosition::new(
        normalize_degrees(north.longitude + 180.0),
        -north.latitude,
        north.distance,
        north.speed_longitude,
        -north.speed_latitude,
        north.speed_distance,
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBlock {
    #[serde(rename = "datetimeLocal")]
    pub datetime_local: String,
    #[serde(rename = "datetimeUTC")]
    pub datetime_utc: String,
    pub tz: String,
    pub jd_ut: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSettings {
    pub engine: String,
    pub house_system: HouseSystem,
    pub nodes: NodeKind,
    pub detail: bool,
    pub syzygy_policy: SyzygyPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartExtras {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stars: Vec<StarEntry>,
    #[serde(rename = "PartOfFortune")]
    pub part_of_fortune: PartOfFortune,
    #[serde(flatten)]
    pub syzygies: PrenatalSyzygies,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eclipses: Option<EclipseReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NatalChart {
    pub time: TimeBlock,
    pub location: GeoLocation,
    pub settings: ChartSettings,
    pub bodies: BTreeMap<String, BodyEntry>,
    pub houses: HouseResult,
    pub extras: ChartExtras,
}

impl NatalChart {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Cast the chart described by `request`.
pub fn calc_chart<E: Ephemeris + ?Sized>(
    eph: &E,
    request: &ChartRequest,
) -> Result<NatalChart, ChartError> {
    request.location.validate()?;
    request.solver.validate()?;
    let moment = resolve_local_time(&request.date, &request.time, &request.zone)?;
    let jd = moment.jd;
    debug!(
        "casting chart for {} ({}) at {}",
        moment.utc, moment.zone_label, jd
    );

    let sun = eph.position(jd, Body::Sun)?;
    let moon = eph.position(jd, Body::Moon)?;
    let mut bodies = BTreeMap::new();
    for &body in CHART_BODIES {
        let position = match body {
            Body::Sun => sun,
            Body::Moon => moon,
            other => eph.position(jd, other)?,
        };
        bodies.insert(body.name().to_string(), BodyEntry::new(&position, request.detail));
    }

    let node = eph.position(jd, request.node_kind.body())?;
    bodies.insert("LunarNode".to_string(), BodyEntry::new(&node, request.detail));
    bodies.insert(
        "SouthNode".to_string(),
        BodyEntry::new(&south_node(&node), request.detail),
    );

    let houses = compute_houses(eph, jd, request.location, request.house_system)?;
    let part_of_fortune = part_of_fortune(
        eph,
        jd,
        request.location,
        houses.angles.asc,
        sun.longitude,
        moon.longitude,
        request.fortune,
    )?;
    let syzygies = prenatal_syzygies(eph, jd, request.syzygy_policy, &request.solver)?;
    let stars = star_positions(eph, jd, &request.stars);
    let eclipses = (request.eclipse_count > 0).then(|| next_eclipses(eph, jd, request.eclipse_count));

    Ok(NatalChart {
        time: TimeBlock {
            datetime_local: moment.local.to_rfc3339(),
            datetime_utc: moment.utc.to_rfc3339(),
            tz: moment.zone_label,
            jd_ut: jd.0,
        },
        location: request.location,
        settings: ChartSettings {
            engine: eph.name().to_string(),
            house_system: request.house_system,
            nodes: request.node_kind,
            detail: request.detail,
            syzygy_policy: request.syzygy_policy,
        },
        bodies,
        houses,
        extras: ChartExtras {
            stars,
            part_of_fortune,
            syzygies,
            eclipses,
        },
    })
}
