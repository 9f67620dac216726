//! Fixed-star batch lookup.

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::Serialize;

use crate::ephemeris::{Ephemeris, StarPosition};
use crate::error::ChartError;
use crate::lookup::{first_success, LookupStrategy};
use crate::time::JulianDay;

lazy_static! {
    static ref NAME_NOISE: Option<Regex> = Regex::new(r"[^A-Za-z0-9]+").ok();
}

/// Split a comma separated star list.
///
/// Blank input means no stars. Input made only of separators is rejected.
pub fn parse_star_list(input: &str) -> Result<Vec<String>, ChartError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let names: Vec<String> = trimmed
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        return Err(ChartError::InvalidStarList {
            message: format!("'{}' names no stars", input),
        });
    }
    Ok(names)
}

/// Name with punctuation and whitespace removed, `None` if unchanged.
fn cleaned_name(name: &str) -> Option<String> {
    let re = NAME_NOISE.as_ref()?;
    let cleaned = re.replace_all(name, "").into_owned();
    (!cleaned.is_empty() && cleaned != name).then_some(cleaned)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StarRecord {
    pub input: String,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat_speed: Option<f64>,
}

impl StarRecord {
    fn new(input: &str, star: StarPosition) -> Self {
        let p = star.position;
        Self {
            input: input.to_string(),
            name: star.name.trim().to_string(),
            lon: p.longitude,
            lat: p.latitude,
            lon_speed: p.speed_longitude.is_finite().then_some(p.speed_longitude),
            lat_speed: p.speed_latitude.is_finite().then_some(p.speed_latitude),
        }
    }
}

/// One entry per requested star, resolved or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StarEntry {
    Found(StarRecord),
    Failed { input: String, error: String },
}

impl StarEntry {
    pub fn input(&self) -> &str {
        match self {
            Self::Found(record) => &record.input,
            Self::Failed { input, .. } => input,
        }
    }

    pub fn record(&self) -> Option<&StarRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::Failed { .. } => None,
        }
    }
}

/// Resolve every non-blank name in `names`. Failures become entries.
pub fn star_positions<E: Ephemeris + ?Sized>(
    eph: &E,
    jd: JulianDay,
    names: &[String],
) -> Vec<StarEntry> {
    let mut entries = Vec::with_capacity(names.len());
    for raw in names {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }

        let mut strategies = vec![LookupStrategy::new("as given", move || {
            eph.star_position(name, jd)
        })];
        if let Some(cleaned) = cleaned_name(name) {
            strategies.push(LookupStrategy::new("cleaned", move || {
                eph.star_position(&cleaned, jd)
            }));
        }

        match first_success(name, &strategies) {
            Ok(star) => entries.push(StarEntry::Found(StarRecord::new(name, star))),
            Err(e) => {
                warn!("fixed star '{}' unresolved: {}", name, e);
                entries.push(StarEntry::Failed {
                    input: name.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims() {
        let names = parse_star_list(" Regulus, Spica ,,Aldebaran ").unwrap();
        assert_eq!(names, vec!["Regulus", "Spica", "Aldebaran"]);
    }

    #[test]
    fn blank_list_is_empty_but_separators_are_rejected() {
        assert!(parse_star_list("   ").unwrap().is_empty());
        let err = parse_star_list(" , ,").unwrap_err();
        assert!(matches!(err, ChartError::InvalidStarList { .. }));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn cleaning_strips_noise() {
        assert_eq!(cleaned_name("al Tau."), Some("alTau".to_string()));
        assert_eq!(cleaned_name("Regulus"), None);
        assert_eq!(cleaned_name("--"), None);
    }
}
