//! Lunation root-finder and prenatal syzygy selection.
//!
//! Phase function: `f(t) = sin(angdiff(moon, sun) - target)`. It vanishes at
//! the wanted phase and also at the opposite phase, so a sign change only
//! counts as a lunation when the Moon is within a quadrant of the target.
//! Coarse scan in fixed steps, then bisection down to the time tolerance.

use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::ephemeris::{Body, Ephemeris};
use crate::error::ChartError;
use crate::numeric::{angular_difference, normalize_degrees, SYNODIC_MONTH_DAYS};
use crate::time::JulianDay;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LunationKind {
    New,
    Full,
}

impl LunationKind {
    /// Moon minus Sun elongation at the exact phase.
    pub fn target_degrees(self) -> f64 {
        match self {
            Self::New => 0.0,
            Self::Full => 180.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::New => Self::Full,
            Self::Full => Self::New,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::New => "NM",
            Self::Full => "FM",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::New => "New Moon",
            Self::Full => "Full Moon",
        }
    }
}

impl fmt::Display for LunationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Search direction in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Coarse scan and bisection limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Scan step in days
    pub step_days: f64,
    /// Give up scanning after this many days and fall back to a mean estimate
    pub max_walk_days: f64,
    /// Bisection stops once the bracket is narrower than this
    pub tolerance_seconds: f64,
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            step_days: 0.5,
            max_walk_days: 100.0,
            tolerance_seconds: 0.5,
            max_iterations: 50,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), ChartError> {
        if !(self.step_days.is_finite() && self.step_days > 0.0) {
            return Err(ChartError::InvalidSolverConfig("step_days must be positive"));
        }
        // Keeps every step well under 90 degrees of elongation.
        if self.step_days > SYNODIC_MONTH_DAYS / 8.0 {
            return Err(ChartError::InvalidSolverConfig(
                "step_days must be shorter than an eighth of a synodic month",
            ));
        }
        if !(self.max_walk_days.is_finite() && self.max_walk_days > 0.0) {
            return Err(ChartError::InvalidSolverConfig("max_walk_days must be positive"));
        }
        if !(self.tolerance_seconds.is_finite() && self.tolerance_seconds > 0.0) {
            return Err(ChartError::InvalidSolverConfig(
                "tolerance_seconds must be positive",
            ));
        }
        if self.max_iterations == 0 {
            return Err(ChartError::InvalidSolverConfig("max_iterations must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct PhaseSample {
    jd: JulianDay,
    /// Signed distance from the target phase in (-180, 180]
    deviation: f64,
    error: f64,
}

impl PhaseSample {
    fn near_target(&self) -> bool {
        self.deviation.abs() < 90.0
    }

    /// True when the target phase lies between `self` and `next`. The sine
    /// also changes sign where the deviation wraps through +/-180, so that
    /// jump is excluded.
    fn brackets_target(&self, next: &PhaseSample) -> bool {
        self.error * next.error < 0.0
            && (self.deviation - next.deviation).abs() <= 180.0
            && (self.near_target() || next.near_target())
    }
}

fn sample<E: Ephemeris + ?Sized>(
    eph: &E,
    jd: JulianDay,
    kind: LunationKind,
) -> Result<PhaseSample, ChartError> {
    let moon = eph.position(jd, Body::Moon)?;
    let sun = eph.position(jd, Body::Sun)?;
    let deviation = angular_difference(
        angular_difference(moon.longitude, sun.longitude),
        kind.target_degrees(),
    );
    Ok(PhaseSample {
        jd,
        deviation,
        error: deviation.to_radians().sin(),
    })
}

/// `sin(angdiff(moon, sun) - target)` at `jd`.
pub fn phase_error<E: Ephemeris + ?Sized>(
    eph: &E,
    jd: JulianDay,
    kind: LunationKind,
) -> Result<f64, ChartError> {
    Ok(sample(eph, jd, kind)?.error)
}

/// Bisect the phase function on `[left, right]`.
///
/// The endpoints must bracket a root: `f(left) * f(right) <= 0`. An endpoint
/// that is already an exact root is returned as is.
pub fn bisect_root<E: Ephemeris + ?Sized>(
    eph: &E,
    kind: LunationKind,
    left: JulianDay,
    right: JulianDay,
    config: &SolverConfig,
) -> Result<JulianDay, ChartError> {
    config.validate()?;
    let (mut a, mut b) = if left.0 <= right.0 {
        (left, right)
    } else {
        (right, left)
    };

    let mut fa = phase_error(eph, a, kind)?;
    let fb = phase_error(eph, b, kind)?;
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if fa * fb > 0.0 || fa.is_nan() || fb.is_nan() {
        return Err(ChartError::SolverPrecondition {
            left: a.0,
            right: b.0,
            f_left: fa,
            f_right: fb,
        });
    }

    let tolerance_days = config.tolerance_seconds / SECONDS_PER_DAY;
    for iteration in 0..config.max_iterations {
        if b.0 - a.0 < tolerance_days {
            debug!("{} bisection converged after {} iterations", kind, iteration);
            break;
        }
        let mid = JulianDay(0.5 * (a.0 + b.0));
        let fm = phase_error(eph, mid, kind)?;
        if fm == 0.0 {
            return Ok(mid);
        }
        if fa * fm < 0.0 {
            b = mid;
        } else {
            a = mid;
            fa = fm;
        }
    }
    Ok(JulianDay(0.5 * (a.0 + b.0)))
}

/// Result of a lunation search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunationEstimate {
    pub instant: JulianDay,
    /// Set when the scan found nothing and the instant is `from` shifted by
    /// one mean synodic month.
    pub degraded: bool,
}

/// Find the nearest lunation of `kind` strictly before (Backward) or after
/// (Forward) `from`.
pub fn find_lunation<E: Ephemeris + ?Sized>(
    eph: &E,
    from: JulianDay,
    kind: LunationKind,
    direction: SearchDirection,
    config: &SolverConfig,
) -> Result<LunationEstimate, ChartError> {
    config.validate()?;
    let step = match direction {
        SearchDirection::Forward => config.step_days,
        SearchDirection::Backward => -config.step_days,
    };

    let mut prev = sample(eph, from, kind)?;
    let mut walked = 0.0;
    while walked < config.max_walk_days {
        let cur = sample(eph, prev.jd.add_days(step), kind)?;
        walked += config.step_days;

        if cur.error == 0.0 && cur.near_target() {
            return Ok(LunationEstimate {
                instant: cur.jd,
                degraded: false,
            });
        }

        if prev.brackets_target(&cur) {
            debug!(
                "{} bracketed between {} and {} after {:.1} days",
                kind, prev.jd, cur.jd, walked
            );
            let instant = bisect_root(eph, kind, prev.jd, cur.jd, config)?;
            return Ok(LunationEstimate {
                instant,
                degraded: false,
            });
        }
        prev = cur;
    }

    let fallback = match direction {
        SearchDirection::Forward => from.add_days(SYNODIC_MONTH_DAYS),
        SearchDirection::Backward => from.add_days(-SYNODIC_MONTH_DAYS),
    };
    warn!(
        "no {} found within {} days of {}, using mean estimate {}",
        kind, config.max_walk_days, from, fallback
    );
    Ok(LunationEstimate {
        instant: fallback,
        degraded: true,
    })
}

/// Nearest lunation of `kind` strictly before `from`.
pub fn previous_lunation<E: Ephemeris + ?Sized>(
    eph: &E,
    from: JulianDay,
    kind: LunationKind,
    config: &SolverConfig,
) -> Result<LunationEstimate, ChartError> {
    find_lunation(eph, from, kind, SearchDirection::Backward, config)
}

/// Nearest lunation of `kind` strictly after `from`.
pub fn next_lunation<E: Ephemeris + ?Sized>(
    eph: &E,
    from: JulianDay,
    kind: LunationKind,
    config: &SolverConfig,
) -> Result<LunationEstimate, ChartError> {
    find_lunation(eph, from, kind, SearchDirection::Forward, config)
}

/// A lunation with the luminaries observed at its instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunationEvent {
    pub kind: LunationKind,
    pub instant: JulianDay,
    pub sun_longitude: f64,
    pub moon_longitude: f64,
    /// Signed distance of Moon minus Sun from the exact phase
    pub phase_deviation_degrees: f64,
    pub degraded: bool,
}

impl LunationEvent {
    pub fn observe<E: Ephemeris + ?Sized>(
        eph: &E,
        kind: LunationKind,
        estimate: LunationEstimate,
    ) -> Result<Self, ChartError> {
        let moon = eph.position(estimate.instant, Body::Moon)?;
        let sun = eph.position(estimate.instant, Body::Sun)?;
        Ok(Self {
            kind,
            instant: estimate.instant,
            sun_longitude: sun.longitude,
            moon_longitude: moon.longitude,
            phase_deviation_degrees: angular_difference(
                angular_difference(moon.longitude, sun.longitude),
                kind.target_degrees(),
            ),
            degraded: estimate.degraded,
        })
    }
}

/// How SAN1 (the governing prenatal syzygy) is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyzygyPolicy {
    /// The Moon's phase sector at the reference decides: waxing gives the
    /// preceding New Moon, waning the preceding Full Moon. SAN2 is the
    /// opposite kind before SAN1.
    #[default]
    NatalSector,
    /// Previous New and previous Full are found independently; the closer
    /// one is SAN1 and the other SAN2. Ties go to the New Moon.
    NearestWins,
}

const POLICY_NAMES: &[(SyzygyPolicy, &str)] = &[
    (SyzygyPolicy::NatalSector, "natal_sector"),
    (SyzygyPolicy::NearestWins, "nearest_wins"),
];

impl FromStr for SyzygyPolicy {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        POLICY_NAMES
            .iter()
            .find(|(_, name)| *name == key)
            .map(|(policy, _)| *policy)
            .ok_or_else(|| ChartError::InvalidOption {
                name: "syzygy policy",
                value: s.to_string(),
                valid: POLICY_NAMES.iter().map(|(_, name)| name.to_string()).collect(),
            })
    }
}

/// One prenatal syzygy as reported in chart output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyzygyReport {
    pub label: String,
    #[serde(rename = "type")]
    pub code: String,
    #[serde(rename = "typeName")]
    pub type_name: String,
    pub datetime: String,
    pub jd_ut: f64,
    pub sun_lon: f64,
    pub moon_lon: f64,
    /// Signed deviation from the exact phase
    pub delta_deg: f64,
    pub delta_from_birth_days: f64,
    pub delta_from_birth_hours: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl SyzygyReport {
    pub fn new(label: &str, event: &LunationEvent, reference: JulianDay) -> Self {
        let days = reference.days_since(event.instant);
        Self {
            label: label.to_string(),
            code: event.kind.code().to_string(),
            type_name: event.kind.name().to_string(),
            datetime: event.instant.to_iso_utc(),
            jd_ut: event.instant.0,
            sun_lon: event.sun_longitude,
            moon_lon: event.moon_longitude,
            delta_deg: round_to(event.phase_deviation_degrees, 6),
            delta_from_birth_days: round_to(days, 6),
            delta_from_birth_hours: round_to(days * 24.0, 3),
            degraded: event.degraded,
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct PrenatalSyzygies {
    pub san1: SyzygyReport,
    pub san2: SyzygyReport,
}

/// SAN1 and SAN2 before `reference` under `policy`.
pub fn prenatal_syzygies<E: Ephemeris + ?Sized>(
    eph: &E,
    reference: JulianDay,
    policy: SyzygyPolicy,
    config: &SolverConfig,
) -> Result<PrenatalSyzygies, ChartError> {
    let (first, second) = match policy {
        SyzygyPolicy::NearestWins => {
            let new = previous_lunation(eph, reference, LunationKind::New, config)?;
            let full = previous_lunation(eph, reference, LunationKind::Full, config)?;
            let new_gap = reference.days_since(new.instant).abs();
            let full_gap = reference.days_since(full.instant).abs();
            if new_gap <= full_gap {
                ((LunationKind::New, new), (LunationKind::Full, full))
            } else {
                ((LunationKind::Full, full), (LunationKind::New, new))
            }
        }
        SyzygyPolicy::NatalSector => {
            let sun = eph.position(reference, Body::Sun)?;
            let moon = eph.position(reference, Body::Moon)?;
            let elongation = normalize_degrees(moon.longitude - sun.longitude);
            let kind = if elongation < 180.0 {
                LunationKind::New
            } else {
                LunationKind::Full
            };
            let san1 = previous_lunation(eph, reference, kind, config)?;
            let san2 = previous_lunation(eph, san1.instant, kind.opposite(), config)?;
            ((kind, san1), (kind.opposite(), san2))
        }
    };

    debug!(
        "prenatal syzygies under {:?}: SAN1 {} at {}, SAN2 {} at {}",
        policy, first.0, first.1.instant, second.0, second.1.instant
    );

    let san1 = LunationEvent::observe(eph, first.0, first.1)?;
    let san2 = LunationEvent::observe(eph, second.0, second.1)?;
    Ok(PrenatalSyzygies {
        san1: SyzygyReport::new("SAN1", &san1, reference),
        san2: SyzygyReport::new("SAN2", &san2, reference),
    })
}
