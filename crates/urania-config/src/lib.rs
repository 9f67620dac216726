use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use urania::{ChartRequest, FortuneOptions, HouseSystem, NodeKind, SolverConfig, SyzygyPolicy};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "URANIA_CONFIG";

const CONFIG_PATHS: [&str; 2] = ["configs/urania.toml", "../../configs/urania.toml"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EphemerisSection {
    /// Swiss Ephemeris data directory, also searched for `sefstars.txt`
    pub path: Option<PathBuf>,
}

/// Chart options used when the command line does not override them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartDefaults {
    pub house_system: HouseSystem,
    pub node_kind: NodeKind,
    pub detail: bool,
    pub fortune_use_sect: bool,
    pub syzygy_policy: SyzygyPolicy,
    pub eclipse_count: usize,
}

impl Default for ChartDefaults {
    fn default() -> Self {
        Self {
            house_system: HouseSystem::Placidus,
            node_kind: NodeKind::True,
            detail: true,
            fortune_use_sect: true,
            syzygy_policy: SyzygyPolicy::NatalSector,
            eclipse_count: 0,
        }
    }
}

impl ChartDefaults {
    pub fn apply_to(&self, request: &mut ChartRequest) {
        request.house_system = self.house_system;
        request.node_kind = self.node_kind;
        request.detail = self.detail;
        request.fortune = FortuneOptions {
            use_sect: self.fortune_use_sect,
            force_diurnal: None,
        };
        request.syzygy_policy = self.syzygy_policy;
        request.eclipse_count = self.eclipse_count;
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UraniaConfig {
    pub ephemeris: EphemerisSection,
    pub chart: ChartDefaults,
    pub solver: SolverConfig,
}

/// Config text from `explicit`, then `URANIA_CONFIG`, then the usual
/// relative locations. `Ok(None)` when no file is found at the relative
/// locations; a named file that cannot be read is an error.
pub fn read_config_text(explicit: Option<&Path>) -> anyhow::Result<Option<String>> {
    let named = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
    if let Some(path) = named {
        let text = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Could not read config {}: {e}", path.display()))?;
        return Ok(Some(text));
    }

    for p in &CONFIG_PATHS {
        if let Ok(c) = fs::read_to_string(p) {
            return Ok(Some(c));
        }
    }
    Ok(None)
}

pub fn parse_config(text: &str) -> anyhow::Result<UraniaConfig> {
    let cfg: UraniaConfig = toml::from_str(text)
        .map_err(|e| anyhow::anyhow!("Failed to parse urania.toml: {e}"))?;
    cfg.solver
        .validate()
        .map_err(|e| anyhow::anyhow!("Bad [solver] section: {e}"))?;
    Ok(cfg)
}

/// Load the config, falling back to defaults when no file exists.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<UraniaConfig> {
    match read_config_text(explicit)? {
        Some(text) => parse_config(&text),
        None => Ok(UraniaConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse_config("").unwrap();
        assert!(cfg.ephemeris.path.is_none());
        assert_eq!(cfg.chart.house_system, HouseSystem::Placidus);
        assert!(cfg.chart.fortune_use_sect);
        assert_eq!(cfg.solver, SolverConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = parse_config(
            r#"
[ephemeris]
path = "/opt/ephe"

[chart]
house_system = "whole sign"
node_kind = "mean"
syzygy_policy = "nearest_wins"
eclipse_count = 3

[solver]
step_days = 0.25
"#,
        )
        .unwrap();
        assert_eq!(cfg.ephemeris.path, Some(PathBuf::from("/opt/ephe")));
        assert_eq!(cfg.chart.house_system, HouseSystem::WholeSign);
        assert_eq!(cfg.chart.node_kind, NodeKind::Mean);
        assert_eq!(cfg.chart.syzygy_policy, SyzygyPolicy::NearestWins);
        assert_eq!(cfg.chart.eclipse_count, 3);
        assert!(cfg.chart.detail);
        assert_eq!(cfg.solver.step_days, 0.25);
        assert_eq!(cfg.solver.max_iterations, 50);
    }

    #[test]
    fn unknown_house_system_is_rejected() {
        let err = parse_config("[chart]\nhouse_system = \"topocentric\"\n").unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn invalid_solver_is_rejected() {
        let err = parse_config("[solver]\ntolerance_seconds = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("[solver]"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = read_config_text(Some(Path::new("/nonexistent/urania.toml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/urania.toml"));
    }

    #[test]
    fn defaults_apply_to_request() {
        let cfg = parse_config("[chart]\ndetail = false\nfortune_use_sect = false\n").unwrap();
        let zone = urania::ZoneSpec::Utc;
        let location = urania::GeoLocation { lat: 0.0, lon: 0.0 };
        let mut request = ChartRequest::new("2000-01-01", "12:00", zone, location);
        cfg.chart.apply_to(&mut request);
        assert!(!request.detail);
        assert!(!request.fortune.use_sect);
    }
}
