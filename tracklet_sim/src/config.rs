// tracklet_sim/src/config.rs

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tracing::info;
use tracklet_core::config::UkfConfig;
use tracklet_core::messages::SensorKind;

use crate::error::SimError;

/// Environment variables with this prefix override file values. Nested keys
/// are separated by a double underscore, e.g. `TRACKLET_FILTER__NOISE__STD_A`.
pub const ENV_PREFIX: &str = "TRACKLET_";

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a `scenario.toml` file. `replay` only
/// reads the `[filter]` section; `simulate` uses all of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)]
    pub filter: UkfConfig,

    #[serde(default)] // Use default if the [simulation] section is missing
    pub simulation: Simulation,

    #[serde(default)]
    pub target: TargetConfig,

    // The TOML has `[[sensors]]`, which becomes a Vec of SensorConfig structs.
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorConfig>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            filter: UkfConfig::default(),
            simulation: Simulation::default(),
            target: TargetConfig::default(),
            sensors: default_sensors(),
        }
    }
}

impl ScenarioConfig {
    /// Layers built-in defaults, then the TOML file (if any), then `TRACKLET_*`
    /// environment overrides, and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, SimError> {
        let mut figment = Figment::from(Serialized::defaults(ScenarioConfig::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(SimError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("scenario file not found: {}", path.display()),
                )));
            }
            info!("Loading scenario from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        let config: ScenarioConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a scenario from an in-memory TOML document, without env overrides.
    pub fn from_toml_str(source: &str) -> Result<Self, SimError> {
        let config: ScenarioConfig = Figment::from(Serialized::defaults(ScenarioConfig::default()))
            .merge(Toml::string(source))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.filter.validate()?;

        let sim = &self.simulation;
        if !sim.duration_s.is_finite() || sim.duration_s <= 0.0 {
            return Err(SimError::InvalidScenario(format!(
                "simulation.duration_s must be positive (got {})",
                sim.duration_s
            )));
        }
        if sim.step_us == 0 {
            return Err(SimError::InvalidScenario(
                "simulation.step_us must be non-zero".to_string(),
            ));
        }

        let t = &self.target;
        let non_negative = |value: f64| value.is_finite() && value >= 0.0;
        if !(non_negative(t.std_a) && non_negative(t.std_yawdd)) {
            return Err(SimError::InvalidScenario(
                "target noise must be finite and non-negative".to_string(),
            ));
        }

        if self.sensors.is_empty() {
            return Err(SimError::InvalidScenario(
                "at least one [[sensors]] entry is required".to_string(),
            ));
        }
        for sensor in &self.sensors {
            if !sensor.rate_hz.is_finite() || sensor.rate_hz <= 0.0 {
                return Err(SimError::InvalidScenario(format!(
                    "{} sensor rate must be positive (got {} Hz)",
                    sensor.kind, sensor.rate_hz
                )));
            }
        }
        Ok(())
    }

    /// Renders the fully resolved configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String, SimError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections in a scenario.toml file.
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Simulation {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Duration of the simulated track in seconds.
    pub duration_s: f64,
    /// Integration step of the ground-truth trajectory, us.
    pub step_us: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: None,
            duration_s: 25.0,
            step_us: 5_000,
        }
    }
}

/// Initial CTRV state of the simulated target and the random accelerations
/// that perturb it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TargetConfig {
    pub px: f64,
    pub py: f64,
    pub v: f64,
    pub yaw: f64,
    pub yaw_rate: f64,
    /// Longitudinal acceleration noise, m/s^2.
    pub std_a: f64,
    /// Yaw acceleration noise, rad/s^2.
    pub std_yawdd: f64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            px: 0.6,
            py: 0.6,
            v: 5.0,
            yaw: 0.0,
            yaw_rate: 0.25,
            std_a: 0.3,
            std_yawdd: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorConfig {
    pub kind: SensorKind,
    pub rate_hz: f64,
    /// Delay of the first reading after the start of the run, us.
    #[serde(default)]
    pub offset_us: u64,
}

fn default_sensors() -> Vec<SensorConfig> {
    vec![
        SensorConfig {
            kind: SensorKind::Lidar,
            rate_hz: 20.0,
            offset_us: 0,
        },
        SensorConfig {
            kind: SensorKind::Radar,
            rate_hz: 20.0,
            offset_us: 25_000,
        },
    ]
}
