//! House cusps and angles.
//!
//! Angles always come from the Placidus call to the provider. Every system
//! except Whole Sign then has its cusps 1, 4, 7 and 10 pinned to the angles
//! so that rounding in the provider never leaves a gap between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ephemeris::{Ephemeris, GeoLocation, RawHouses};
use crate::error::ChartError;
use crate::numeric::{normalize_degrees, sign_start};
use crate::time::JulianDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HouseSystem {
    Placidus,
    Koch,
    Equal,
    WholeSign,
    Porphyry,
    Alcabitius,
    Regiomontanus,
    Campanus,
}

/// (system, provider code, accepted names)
const HOUSE_SYSTEMS: &[(HouseSystem, u8, &[&str])] = &[
    (HouseSystem::Placidus, b'P', &["placidus"]),
    (HouseSystem::Koch, b'K', &["koch"]),
    (HouseSystem::Equal, b'E', &["equal"]),
    (HouseSystem::WholeSign, b'W', &["whole_sign", "wholesign", "whole"]),
    (HouseSystem::Porphyry, b'O', &["porphyry", "porphyrius"]),
    (HouseSystem::Alcabitius, b'B', &["alcabitius", "alcabitus"]),
    (HouseSystem::Regiomontanus, b'R', &["regiomontanus"]),
    (HouseSystem::Campanus, b'C', &["campanus"]),
];

impl HouseSystem {
    fn entry(self) -> &'static (HouseSystem, u8, &'static [&'static str]) {
        HOUSE_SYSTEMS
            .iter()
            .find(|(system, _, _)| *system == self)
            .unwrap_or(&HOUSE_SYSTEMS[0])
    }

    /// One-letter provider code.
    pub fn code(self) -> u8 {
        self.entry().1
    }

    pub fn name(self) -> &'static str {
        self.entry().2[0]
    }

    /// Whether cusps 1/4/7/10 are pinned to the angles.
    pub fn locks_angles(self) -> bool {
        self != Self::WholeSign
    }

    pub fn all() -> impl Iterator<Item = HouseSystem> {
        HOUSE_SYSTEMS.iter().map(|(system, _, _)| *system)
    }
}

impl fmt::Display for HouseSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HouseSystem {
    type Err = ChartError;

    /// Accepts a name (`placidus`, `Whole Sign`) or a one-letter code (`P`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() == 1 {
            let code = trimmed.as_bytes()[0].to_ascii_uppercase();
            if let Some((system, _, _)) = HOUSE_SYSTEMS.iter().find(|(_, c, _)| *c == code) {
                return Ok(*system);
            }
        }
        let key = trimmed.to_lowercase().replace([' ', '-'], "_");
        HOUSE_SYSTEMS
            .iter()
            .find(|(_, _, names)| names.contains(&key.as_str()))
            .map(|(system, _, _)| *system)
            .ok_or_else(|| ChartError::UnsupportedHouseSystem {
                system: s.to_string(),
                valid: HOUSE_SYSTEMS
                    .iter()
                    .map(|(_, _, names)| names[0].to_string())
                    .collect(),
            })
    }
}

impl TryFrom<String> for HouseSystem {
    type Error = ChartError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HouseSystem> for String {
    fn from(system: HouseSystem) -> Self {
        system.name().to_string()
    }
}

/// The four angles, normalized to [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Angles {
    pub asc: f64,
    pub mc: f64,
    pub dc: f64,
    pub ic: f64,
}

impl Angles {
    pub fn from_asc_mc(asc: f64, mc: f64) -> Self {
        let asc = normalize_degrees(asc);
        let mc = normalize_degrees(mc);
        Self {
            asc,
            mc,
            dc: normalize_degrees(asc + 180.0),
            ic: normalize_degrees(mc + 180.0),
        }
    }
}

/// Cusps of houses 1..12, normalized to [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HouseCusps(pub [f64; 12]);

impl HouseCusps {
    /// Cusp of house `n` (1-based).
    pub fn cusp(&self, n: usize) -> Option<f64> {
        n.checked_sub(1).and_then(|i| self.0.get(i).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HouseResult {
    pub system: HouseSystem,
    pub cusps: HouseCusps,
    pub angles: Angles,
}

/// Angles from the provider's Placidus primitive.
pub fn compute_angles<E: Ephemeris + ?Sized>(
    eph: &E,
    jd: JulianDay,
    location: GeoLocation,
) -> Result<Angles, ChartError> {
    location.validate()?;
    let raw = eph.house_cusps(jd, location, HouseSystem::Placidus.code())?;
    Ok(Angles::from_asc_mc(raw.ascendant, raw.mc))
}

/// Whole-sign cusps: house 1 starts at the beginning of the rising sign.
pub fn whole_sign_cusps(asc: f64) -> HouseCusps {
    let first = sign_start(asc);
    let mut cusps = [0.0; 12];
    for (i, cusp) in cusps.iter_mut().enumerate() {
        *cusp = normalize_degrees(first + 30.0 * i as f64);
    }
    HouseCusps(cusps)
}

fn locked(raw: &RawHouses, angles: &Angles) -> HouseCusps {
    let mut cusps = raw.cusps.map(normalize_degrees);
    cusps[0] = angles.asc;
    cusps[3] = angles.ic;
    cusps[6] = angles.dc;
    cusps[9] = angles.mc;
    HouseCusps(cusps)
}

/// Cusps and angles for `system` at `jd` and `location`.
pub fn compute_houses<E: Ephemeris + ?Sized>(
    eph: &E,
    jd: JulianDay,
    location: GeoLocation,
    system: HouseSystem,
) -> Result<HouseResult, ChartError> {
    location.validate()?;
    let placidus = eph.house_cusps(jd, location, HouseSystem::Placidus.code())?;
    let angles = Angles::from_asc_mc(placidus.ascendant, placidus.mc);

    let cusps = match system {
        HouseSystem::WholeSign => whole_sign_cusps(angles.asc),
        HouseSystem::Placidus => locked(&placidus, &angles),
        other => {
            let raw = eph.house_cusps(jd, location, other.code())?;
            if other.locks_angles() {
                locked(&raw, &angles)
            } else {
                HouseCusps(raw.cusps.map(normalize_degrees))
            }
        }
    };

    Ok(HouseResult {
        system,
        cusps,
        angles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_codes() {
        assert_eq!("placidus".parse::<HouseSystem>().unwrap(), HouseSystem::Placidus);
        assert_eq!("Whole Sign".parse::<HouseSystem>().unwrap(), HouseSystem::WholeSign);
        assert_eq!("b".parse::<HouseSystem>().unwrap(), HouseSystem::Alcabitius);
        assert_eq!("O".parse::<HouseSystem>().unwrap(), HouseSystem::Porphyry);
        let err = "topocentric".parse::<HouseSystem>().unwrap_err();
        assert!(matches!(err, ChartError::UnsupportedHouseSystem { .. }));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn only_whole_sign_is_unlocked() {
        for system in HouseSystem::all() {
            assert_eq!(system.locks_angles(), system != HouseSystem::WholeSign);
        }
    }

    #[test]
    fn serde_uses_names() {
        let json = serde_json::to_string(&HouseSystem::WholeSign).unwrap();
        assert_eq!(json, "\"whole_sign\"");
        let back: HouseSystem = serde_json::from_str("\"koch\"").unwrap();
        assert_eq!(back, HouseSystem::Koch);
    }

    #[test]
    fn angles_are_opposed() {
        let a = Angles::from_asc_mc(350.0, 260.0);
        assert_eq!(a.dc, 170.0);
        assert_eq!(a.ic, 80.0);
        let json = serde_json::to_value(a).unwrap();
        assert_eq!(json["ASC"], 350.0);
        assert_eq!(json["IC"], 80.0);
    }

    #[test]
    fn whole_sign_starts_at_rising_sign() {
        let cusps = whole_sign_cusps(355.2);
        assert_eq!(cusps.cusp(1), Some(330.0));
        assert_eq!(cusps.cusp(2), Some(0.0));
        assert_eq!(cusps.cusp(12), Some(300.0));
        assert_eq!(cusps.cusp(13), None);
        assert_eq!(cusps.cusp(0), None);
    }
}
