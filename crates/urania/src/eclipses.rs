//! Upcoming eclipse series.
//!
//! Each series (solar, lunar) is walked independently. A failed provider
//! call ends that series only; whatever was found before it is kept and
//! the failure is reported as the last entry.

use std::fmt;

use log::{debug, warn};
use serde::Serialize;

use crate::ephemeris::shadow::{
    ECL_ANNULAR, ECL_ANNULAR_TOTAL, ECL_CENTRAL, ECL_NONCENTRAL, ECL_PARTIAL, ECL_PENUMBRAL,
    ECL_TOTAL,
};
use crate::ephemeris::{Ephemeris, EphemerisError, RawEclipse};
use crate::time::JulianDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EclipseKind {
    Solar,
    Lunar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EclipseSubtype {
    Total,
    Hybrid,
    Annular,
    Partial,
    Penumbral,
    Unknown,
}

impl fmt::Display for EclipseSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Total => "Total",
            Self::Hybrid => "Hybrid",
            Self::Annular => "Annular",
            Self::Partial => "Partial",
            Self::Penumbral => "Penumbral",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Named eclipse type flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EclipseFlag {
    Central,
    NonCentral,
    Total,
    Annular,
    Partial,
    AnnularTotal,
    Penumbral,
}

/// Decoded provider bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EclipseFlags {
    pub central: bool,
    pub noncentral: bool,
    pub total: bool,
    pub annular: bool,
    pub partial: bool,
    pub annular_total: bool,
    pub penumbral: bool,
}

impl EclipseFlags {
    pub fn from_bits(bits: u32) -> Self {
        Self {
            central: bits & ECL_CENTRAL != 0,
            noncentral: bits & ECL_NONCENTRAL != 0,
            total: bits & ECL_TOTAL != 0,
            annular: bits & ECL_ANNULAR != 0,
            partial: bits & ECL_PARTIAL != 0,
            annular_total: bits & ECL_ANNULAR_TOTAL != 0,
            penumbral: bits & ECL_PENUMBRAL != 0,
        }
    }

    pub fn has(&self, flag: EclipseFlag) -> bool {
        match flag {
            EclipseFlag::Central => self.central,
            EclipseFlag::NonCentral => self.noncentral,
            EclipseFlag::Total => self.total,
            EclipseFlag::Annular => self.annular,
            EclipseFlag::Partial => self.partial,
            EclipseFlag::AnnularTotal => self.annular_total,
            EclipseFlag::Penumbral => self.penumbral,
        }
    }
}

// First matching row wins.
const SOLAR_RULES: &[(EclipseFlag, EclipseSubtype)] = &[
    (EclipseFlag::Total, EclipseSubtype::Total),
    (EclipseFlag::AnnularTotal, EclipseSubtype::Hybrid),
    (EclipseFlag::Annular, EclipseSubtype::Annular),
    (EclipseFlag::Partial, EclipseSubtype::Partial),
];

const LUNAR_RULES: &[(EclipseFlag, EclipseSubtype)] = &[
    (EclipseFlag::Total, EclipseSubtype::Total),
    (EclipseFlag::Partial, EclipseSubtype::Partial),
    (EclipseFlag::Penumbral, EclipseSubtype::Penumbral),
];

/// Subtype for a decoded flag set.
pub fn classify(kind: EclipseKind, flags: &EclipseFlags) -> EclipseSubtype {
    let rules = match kind {
        EclipseKind::Solar => SOLAR_RULES,
        EclipseKind::Lunar => LUNAR_RULES,
    };
    rules
        .iter()
        .find(|(flag, _)| flags.has(*flag))
        .map(|(_, subtype)| *subtype)
        .unwrap_or(EclipseSubtype::Unknown)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EclipseEvent {
    pub kind: EclipseKind,
    #[serde(rename = "type")]
    pub subtype: EclipseSubtype,
    pub jd_ut: f64,
    pub datetime: String,
    /// Raw provider bitmask
    pub retflag: u32,
}

impl EclipseEvent {
    pub fn from_raw(kind: EclipseKind, raw: RawEclipse) -> Self {
        Self {
            kind,
            subtype: classify(kind, &EclipseFlags::from_bits(raw.flags)),
            jd_ut: raw.instant.0,
            datetime: raw.instant.to_iso_utc(),
            retflag: raw.flags,
        }
    }

    pub fn instant(&self) -> JulianDay {
        JulianDay(self.jd_ut)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesEntry {
    Event(EclipseEvent),
    Failure { error: String },
}

impl SeriesEntry {
    pub fn event(&self) -> Option<&EclipseEvent> {
        match self {
            Self::Event(event) => Some(event),
            Self::Failure { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EclipseReport {
    pub solar: Vec<SeriesEntry>,
    pub lunar: Vec<SeriesEntry>,
}

fn series<F>(kind: EclipseKind, after: JulianDay, count: usize, mut next: F) -> Vec<SeriesEntry>
where
    F: FnMut(JulianDay) -> Result<Option<RawEclipse>, EphemerisError>,
{
    let mut entries = Vec::with_capacity(count);
    let mut cursor = after;
    while entries.len() < count {
        match next(cursor) {
            // A zero flag word means the provider found nothing.
            Ok(Some(raw)) if raw.flags == 0 => {
                debug!("{:?} eclipse search after {} returned no flags", kind, cursor);
                break;
            }
            Ok(Some(raw)) => {
                if raw.instant.0.is_nan() || raw.instant.0 <= cursor.0 {
                    warn!(
                        "{:?} eclipse search returned {} which is not after {}",
                        kind, raw.instant, cursor
                    );
                    entries.push(SeriesEntry::Failure {
                        error: format!(
                            "{:?} eclipse search did not advance past {}",
                            kind, cursor
                        ),
                    });
                    break;
                }
                cursor = raw.instant.add_days(1.0);
                entries.push(SeriesEntry::Event(EclipseEvent::from_raw(kind, raw)));
            }
            Ok(None) => break,
            Err(e) => {
                warn!("{:?} eclipse search failed after {}: {}", kind, cursor, e);
                entries.push(SeriesEntry::Failure {
                    error: e.to_string(),
                });
                break;
            }
        }
    }
    entries
}

/// Up to `count_each` solar and lunar eclipses after `after`.
pub fn next_eclipses<E: Ephemeris + ?Sized>(
    eph: &E,
    after: JulianDay,
    count_each: usize,
) -> EclipseReport {
    EclipseReport {
        solar: series(EclipseKind::Solar, after, count_each, |t| eph.next_solar_eclipse(t)),
        lunar: series(EclipseKind::Lunar, after, count_each, |t| eph.next_lunar_eclipse(t)),
    }
}
