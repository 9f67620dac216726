use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::info;
use serde_json::json;
use std::path::PathBuf;

use urania::ephemeris::Body;
use urania::lunation::{LunationEvent, SyzygyReport};
use urania::{
    calc_chart, compute_angles, compute_houses, next_eclipses, next_lunation, parse_star_list,
    part_of_fortune, prenatal_syzygies, resolve_local_time, star_positions, ChartRequest,
    Ephemeris, FortuneOptions, GeoLocation, HouseSystem, JulianDay, LunationKind, NodeKind,
    SwissEphemeris, SyzygyPolicy, ZoneSpec,
};
use urania_config::{load_config, UraniaConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Natal chart derivations on the Swiss Ephemeris")]
struct Cli {
    /// Config file (default: configs/urania.toml or $URANIA_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Swiss Ephemeris data directory, overrides [ephemeris] path.
    #[arg(long, global = true)]
    ephemeris: Option<PathBuf>,

    /// Log solver and provider progress to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Local birth moment.
#[derive(Args, Debug)]
struct Moment {
    /// Local date, YYYY-MM-DD.
    #[arg(long)]
    date: String,

    /// Local time, HH:MM or HH:MM:SS.
    #[arg(long)]
    time: String,

    /// IANA timezone name, e.g. Europe/Tallinn.
    #[arg(long)]
    tz: Option<String>,

    /// Fixed offset in minutes east of UTC, so local = UTC + offset.
    /// New York in winter is -300 (UTC-05:00).
    #[arg(long, allow_hyphen_values = true)]
    tz_offset: Option<i32>,
}

impl Moment {
    fn zone(&self) -> anyhow::Result<ZoneSpec> {
        Ok(ZoneSpec::from_params(self.tz.as_deref(), self.tz_offset)?)
    }
}

#[derive(Args, Debug)]
struct Place {
    /// Latitude in degrees, north positive.
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in degrees, east positive.
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
}

impl Place {
    fn location(&self) -> anyhow::Result<GeoLocation> {
        Ok(GeoLocation::new(self.lat, self.lon)?)
    }
}

/// Sect handling for the Part of Fortune.
#[derive(Args, Debug)]
struct SectArgs {
    /// Always use ASC + Moon - Sun.
    #[arg(long)]
    no_sect: bool,

    /// Treat the chart as diurnal regardless of the Sun.
    #[arg(long, conflicts_with = "force_night")]
    force_day: bool,

    /// Treat the chart as nocturnal regardless of the Sun.
    #[arg(long)]
    force_night: bool,
}

impl SectArgs {
    fn options(&self, use_sect_default: bool) -> FortuneOptions {
        let force_diurnal = if self.force_day {
            Some(true)
        } else if self.force_night {
            Some(false)
        } else {
            None
        };
        FortuneOptions {
            use_sect: use_sect_default && !self.no_sect,
            force_diurnal,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full natal chart.
    Chart {
        #[command(flatten)]
        moment: Moment,
        #[command(flatten)]
        place: Place,
        #[command(flatten)]
        sect: SectArgs,
        /// House system name or one-letter code.
        #[arg(long)]
        house_system: Option<HouseSystem>,
        /// Lunar node: true or mean.
        #[arg(long)]
        nodes: Option<NodeKind>,
        /// Comma-separated fixed stars.
        #[arg(long, default_value = "")]
        stars: String,
        /// Longitudes only.
        #[arg(long)]
        compact: bool,
        /// SAN1 selection: natal_sector or nearest_wins.
        #[arg(long)]
        policy: Option<SyzygyPolicy>,
        /// Solar and lunar eclipses to list after the birth.
        #[arg(long)]
        eclipses: Option<usize>,
    },
    /// House cusps and angles.
    Houses {
        #[command(flatten)]
        moment: Moment,
        #[command(flatten)]
        place: Place,
        #[arg(long)]
        house_system: Option<HouseSystem>,
    },
    /// Sect and Part of Fortune.
    Fortune {
        #[command(flatten)]
        moment: Moment,
        #[command(flatten)]
        place: Place,
        #[command(flatten)]
        sect: SectArgs,
    },
    /// Prenatal syzygies and the next New and Full Moon.
    Lunations {
        #[command(flatten)]
        moment: Moment,
        #[arg(long)]
        policy: Option<SyzygyPolicy>,
    },
    /// Upcoming solar and lunar eclipses.
    Eclipses {
        #[command(flatten)]
        moment: Moment,
        /// Eclipses of each kind.
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
    /// Fixed star positions.
    Stars {
        #[command(flatten)]
        moment: Moment,
        /// Comma-separated star names.
        #[arg(long)]
        names: String,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn open_ephemeris(cli_path: Option<PathBuf>, cfg: &UraniaConfig) -> anyhow::Result<SwissEphemeris> {
    let path = cli_path.or_else(|| cfg.ephemeris.path.clone());
    SwissEphemeris::new(path).context("Failed to open Swiss Ephemeris")
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn upcoming(
    eph: &dyn Ephemeris,
    jd: JulianDay,
    cfg: &UraniaConfig,
) -> anyhow::Result<Vec<SyzygyReport>> {
    let mut reports = Vec::new();
    for kind in [LunationKind::New, LunationKind::Full] {
        let estimate = next_lunation(eph, jd, kind, &cfg.solver)?;
        let event = LunationEvent::observe(eph, kind, estimate)?;
        reports.push(SyzygyReport::new(kind.code(), &event, jd));
    }
    reports.sort_by(|a, b| a.jd_ut.total_cmp(&b.jd_ut));
    Ok(reports)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = load_config(cli.config.as_deref())?;
    let eph = open_ephemeris(cli.ephemeris, &cfg)?;
    info!("using {} at {}", eph.name(), eph.ephemeris_path().display());

    match cli.command {
        Command::Chart {
            moment,
            place,
            sect,
            house_system,
            nodes,
            stars,
            compact,
            policy,
            eclipses,
        } => {
            let mut request =
                ChartRequest::new(&moment.date, &moment.time, moment.zone()?, place.location()?);
            cfg.chart.apply_to(&mut request);
            request.solver = cfg.solver;
            request.fortune = sect.options(cfg.chart.fortune_use_sect);
            request.stars = parse_star_list(&stars)?;
            if let Some(system) = house_system {
                request.house_system = system;
            }
            if let Some(nodes) = nodes {
                request.node_kind = nodes;
            }
            if let Some(policy) = policy {
                request.syzygy_policy = policy;
            }
            if let Some(count) = eclipses {
                request.eclipse_count = count;
            }
            if compact {
                request.detail = false;
            }
            let chart = calc_chart(&eph, &request)?;
            println!("{}", chart.to_json_pretty()?);
        }
        Command::Houses {
            moment,
            place,
            house_system,
        } => {
            let resolved = resolve_local_time(&moment.date, &moment.time, &moment.zone()?)?;
            let system = house_system.unwrap_or(cfg.chart.house_system);
            let houses = compute_houses(&eph, resolved.jd, place.location()?, system)?;
            print_json(&houses)?;
        }
        Command::Fortune {
            moment,
            place,
            sect,
        } => {
            let resolved = resolve_local_time(&moment.date, &moment.time, &moment.zone()?)?;
            let location = place.location()?;
            let angles = compute_angles(&eph, resolved.jd, location)?;
            let sun = eph.position(resolved.jd, Body::Sun)?;
            let moon = eph.position(resolved.jd, Body::Moon)?;
            let pof = part_of_fortune(
                &eph,
                resolved.jd,
                location,
                angles.asc,
                sun.longitude,
                moon.longitude,
                sect.options(cfg.chart.fortune_use_sect),
            )?;
            print_json(&json!({ "angles": angles, "PartOfFortune": pof }))?;
        }
        Command::Lunations { moment, policy } => {
            let resolved = resolve_local_time(&moment.date, &moment.time, &moment.zone()?)?;
            let policy = policy.unwrap_or(cfg.chart.syzygy_policy);
            let prenatal = prenatal_syzygies(&eph, resolved.jd, policy, &cfg.solver)?;
            let next = upcoming(&eph, resolved.jd, &cfg)?;
            print_json(&json!({ "prenatal": prenatal, "next": next }))?;
        }
        Command::Eclipses { moment, count } => {
            let resolved = resolve_local_time(&moment.date, &moment.time, &moment.zone()?)?;
            print_json(&next_eclipses(&eph, resolved.jd, count))?;
        }
        Command::Stars { moment, names } => {
            let resolved = resolve_local_time(&moment.date, &moment.time, &moment.zone()?)?;
            let names = parse_star_list(&names)?;
            print_json(&star_positions(&eph, resolved.jd, &names))?;
        }
    }
    Ok(())
}
