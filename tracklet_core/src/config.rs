// tracklet_core/src/config.rs

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::FilterError;

// =========================================================================
// == Top-Level Filter Configuration ==
// =========================================================================

/// # UkfConfig
/// Everything the unscented filter is tuned with. It is handed to the filter by
/// value at construction and cannot be changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct UkfConfig {
    #[serde(default)]
    pub noise: NoiseParams,

    #[serde(default)]
    pub sensors: SensorToggles,
}

impl UkfConfig {
    /// Rejects standard deviations that would make `P_aug` or `S` degenerate.
    pub fn validate(&self) -> Result<(), FilterError> {
        for (name, value) in self.noise.named() {
            if !value.is_finite() || value <= 0.0 {
                return Err(FilterError::InvalidConfig(format!(
                    "{name} must be a positive, finite standard deviation (got {value})"
                )));
            }
        }
        Ok(())
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

/// Noise standard deviations for the process and both sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct NoiseParams {
    /// Longitudinal acceleration process noise, m/s^2.
    pub std_a: f64,
    /// Yaw acceleration process noise, rad/s^2.
    pub std_yawdd: f64,
    /// Lidar x position noise, m.
    pub std_laspx: f64,
    /// Lidar y position noise, m.
    pub std_laspy: f64,
    /// Radar range noise, m.
    pub std_radr: f64,
    /// Radar bearing noise, rad.
    pub std_radphi: f64,
    /// Radar range-rate noise, m/s.
    pub std_radrd: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            std_a: 0.5,
            std_yawdd: PI / 4.0,
            std_laspx: 0.15,
            std_laspy: 0.15,
            std_radr: 0.3,
            std_radphi: 0.03,
            std_radrd: 0.3,
        }
    }
}

impl NoiseParams {
    fn named(&self) -> [(&'static str, f64); 7] {
        [
            ("std_a", self.std_a),
            ("std_yawdd", self.std_yawdd),
            ("std_laspx", self.std_laspx),
            ("std_laspy", self.std_laspy),
            ("std_radr", self.std_radr),
            ("std_radphi", self.std_radphi),
            ("std_radrd", self.std_radrd),
        ]
    }
}

/// Per-modality switches. A disabled sensor still drives prediction so the
/// filter's clock stays current; only its correction step is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SensorToggles {
    pub use_lidar: bool,
    pub use_radar: bool,
}

impl Default for SensorToggles {
    fn default() -> Self {
        Self {
            use_lidar: true,
            use_radar: true,
        }
    }
}
