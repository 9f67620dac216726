//! Instants, calendar conversion and local-time resolution.
//!
//! All astronomy runs on [`JulianDay`] in UT. Local civil time only exists at
//! the edges: request parsing and the `datetimeLocal` echo in chart output.

use std::f64::consts::TAU;
use std::fmt;

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ChartError;

/// Julian Day of the Unix epoch (1970-01-01 00:00 UTC).
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian Day of J2000.0.
pub const J2000_JD: f64 = 2_451_545.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Continuous UT time as fractional days since the Julian epoch.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JulianDay(pub f64);

impl JulianDay {
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let secs = dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9;
        Self(UNIX_EPOCH_JD + secs / SECONDS_PER_DAY)
    }

    /// Convert back to a UTC timestamp, `None` outside chrono's range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = (self.0 - UNIX_EPOCH_JD) * SECONDS_PER_DAY;
        if !secs.is_finite() {
            return None;
        }
        let whole = secs.floor();
        let mut nanos = ((secs - whole) * 1e9).round() as i64;
        let mut whole = whole as i64;
        if nanos >= 1_000_000_000 {
            whole += 1;
            nanos -= 1_000_000_000;
        }
        DateTime::from_timestamp(whole, nanos as u32)
    }

    pub fn days(self) -> f64 {
        self.0
    }

    pub fn add_days(self, days: f64) -> Self {
        Self(self.0 + days)
    }

    /// Days from `other` to `self`.
    pub fn days_since(self, other: JulianDay) -> f64 {
        self.0 - other.0
    }

    /// Julian centuries since J2000.0.
    pub fn centuries_since_j2000(self) -> f64 {
        (self.0 - J2000_JD) / 36_525.0
    }

    /// Render as `YYYY-MM-DD HH:MM:SS UTC`, rounding to the nearest second.
    ///
    /// A rounded 60th second carries into the minute, the minute into the
    /// hour, and a 24th hour rolls the calendar date forward.
    pub fn to_iso_utc(self) -> String {
        let day_start = (self.0 - 0.5).floor() + 0.5;
        let Some(mut date) = civil_date(day_start) else {
            return format!("JD {:.6}", self.0);
        };

        let total_sec = (self.0 - day_start) * SECONDS_PER_DAY;
        let mut ss = (total_sec % 60.0).round() as u32;
        let mut mm = ((total_sec / 60.0).floor() as u32) % 60;
        let mut hh = (total_sec / 3600.0).floor() as u32;

        if ss == 60 {
            ss = 0;
            mm += 1;
        }
        if mm == 60 {
            mm = 0;
            hh += 1;
        }
        if hh >= 24 {
            hh -= 24;
            match date.succ_opt() {
                Some(next) => date = next,
                None => return format!("JD {:.6}", self.0),
            }
        }

        format!("{} {:02}:{:02}:{:02} UTC", date.format("%Y-%m-%d"), hh, mm, ss)
    }
}

impl fmt::Display for JulianDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JD {:.6}", self.0)
    }
}

/// Calendar date of a Julian Day that falls on 00:00 UT.
fn civil_date(day_start: f64) -> Option<NaiveDate> {
    let days = (day_start - UNIX_EPOCH_JD).round() as i64;
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(Duration::days(days))
}

/// Greenwich mean sidereal time in hours [0, 24).
///
/// Earth Rotation Angle (IERS 2010) plus the Capitaine et al. 2003
/// polynomial. UT is used in place of UT1.
pub fn greenwich_mean_sidereal_hours(jd: JulianDay) -> f64 {
    let du = jd.0 - J2000_JD;
    let era = TAU * (0.779_057_273_264_0 + 1.002_737_811_911_354_6 * du);
    let t = du / 36_525.0;
    let poly_arcsec = 0.014506 + 4612.156534 * t + 1.3915817 * t * t
        - 0.000_000_44 * t.powi(3)
        - 0.000_029_956 * t.powi(4)
        - 0.000_000_036_8 * t.powi(5);
    let gmst = (era + (poly_arcsec / 3600.0).to_radians()).rem_euclid(TAU);
    gmst.to_degrees() / 15.0
}

/// How a local wall-clock time is tied to UTC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneSpec {
    Utc,
    Iana(Tz),
    /// Minutes east of UTC: local = UTC + offset, so -300 is UTC-05:00.
    OffsetMinutes(i32),
}

impl ZoneSpec {
    /// Resolve request parameters. Naming a zone and an offset together is
    /// rejected; naming neither means UTC.
    pub fn from_params(tz: Option<&str>, offset_minutes: Option<i32>) -> Result<Self, ChartError> {
        match (tz.map(str::trim).filter(|s| !s.is_empty()), offset_minutes) {
            (Some(_), Some(_)) => Err(ChartError::ConflictingZone),
            (Some(name), None) => {
                if name.eq_ignore_ascii_case("utc") {
                    return Ok(Self::Utc);
                }
                name.parse::<Tz>()
                    .map(Self::Iana)
                    .map_err(|_| ChartError::UnknownTimezone { tz: name.to_string() })
            }
            (None, Some(minutes)) => Ok(Self::OffsetMinutes(minutes)),
            (None, None) => Ok(Self::Utc),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Utc => "UTC".to_string(),
            Self::Iana(tz) => tz.name().to_string(),
            Self::OffsetMinutes(minutes) => {
                let sign = if *minutes < 0 { '-' } else { '+' };
                let abs = minutes.unsigned_abs();
                format!("UTC{}{:02}:{:02}", sign, abs / 60, abs % 60)
            }
        }
    }
}

/// A birth moment resolved against its zone.
#[derive(Debug, Clone)]
pub struct ResolvedTime {
    pub local: DateTime<FixedOffset>,
    pub utc: DateTime<Utc>,
    pub zone_label: String,
    pub jd: JulianDay,
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(time: &str) -> Result<NaiveTime, ChartError> {
    let time = time.trim();
    let format = match time.matches(':').count() {
        1 => "%H:%M",
        2 => "%H:%M:%S",
        _ => {
            return Err(ChartError::InvalidDateTime {
                message: format!("time must be HH:MM or HH:MM:SS, got '{}'", time),
            })
        }
    };
    NaiveTime::parse_from_str(time, format).map_err(|e| ChartError::InvalidDateTime {
        message: format!("bad time '{}': {}", time, e),
    })
}

/// Parse `YYYY-MM-DD`.
pub fn parse_date(date: &str) -> Result<NaiveDate, ChartError> {
    let date = date.trim();
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| ChartError::InvalidDateTime {
        message: format!("bad date '{}': {}", date, e),
    })
}

/// Resolve a local date and time in `zone` to UTC and a Julian Day.
///
/// Ambiguous wall-clock times (DST fall-back) take the earlier instant;
/// times inside a DST gap are rejected.
pub fn resolve_local_time(date: &str, time: &str, zone: &ZoneSpec) -> Result<ResolvedTime, ChartError> {
    let naive = NaiveDateTime::new(parse_date(date)?, parse_clock(time)?);

    let local: DateTime<FixedOffset> = match zone {
        ZoneSpec::Utc => Utc.from_utc_datetime(&naive).fixed_offset_view(),
        ZoneSpec::Iana(tz) => tz
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| ChartError::InvalidDateTime {
                message: format!("{} does not exist in {}", naive, tz.name()),
            })?
            .fixed_offset_view(),
        ZoneSpec::OffsetMinutes(minutes) => {
            let offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| ChartError::InvalidDateTime {
                    message: format!("offset of {} minutes is out of range", minutes),
                })?;
            offset
                .from_local_datetime(&naive)
                .single()
                .ok_or_else(|| ChartError::InvalidDateTime {
                    message: format!("{} cannot be placed at offset {}", naive, offset),
                })?
        }
    };

    let utc = local.with_timezone(&Utc);
    Ok(ResolvedTime {
        local,
        utc,
        zone_label: zone.label(),
        jd: JulianDay::from_datetime(utc),
    })
}

trait FixedOffsetView {
    fn fixed_offset_view(&self) -> DateTime<FixedOffset>;
}

impl<Z: TimeZone> FixedOffsetView for DateTime<Z> {
    fn fixed_offset_view(&self) -> DateTime<FixedOffset> {
        let offset = self.offset().fix();
        self.with_timezone(&offset)
    }
}
