//! Natal chart derivations over a pluggable ephemeris.

pub mod chart;
pub mod eclipses;
pub mod ephemeris;
pub mod error;
pub mod houses;
pub mod lookup;
pub mod lunation;
pub mod numeric;
pub mod sect;
pub mod stars;
pub mod time;

pub use chart::{calc_chart, ChartRequest, NatalChart, NodeKind};
pub use eclipses::{next_eclipses, EclipseEvent, EclipseKind, EclipseReport, EclipseSubtype};
pub use ephemeris::{Body, Ephemeris, EphemerisError, GeoLocation, SwissEphemeris};
pub use error::ChartError;
pub use houses::{compute_angles, compute_houses, Angles, HouseCusps, HouseResult, HouseSystem};
pub use lunation::{
    find_lunation, next_lunation, prenatal_syzygies, previous_lunation, LunationEvent,
    LunationKind, SearchDirection, SolverConfig, SyzygyPolicy,
};
pub use sect::{is_diurnal, part_of_fortune, FortuneOptions, PartOfFortune};
pub use stars::{parse_star_list, star_positions, StarEntry};
pub use time::{resolve_local_time, JulianDay, ZoneSpec};
