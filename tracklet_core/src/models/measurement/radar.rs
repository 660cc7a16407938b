// tracklet_core/src/models/measurement/radar.rs

use nalgebra::{Matrix3, Vector3};

use crate::config::NoiseParams;
use crate::messages::SensorKind;
use crate::models::measurement::{diagonal_noise, MeasurementModel};
use crate::state::StateVariable;
use crate::types::{StateVector, N_Z_RADAR};

/// Smallest range used as a divisor in the range-rate model, in meters.
///
/// A state sitting on the sensor origin would otherwise divide by zero and
/// push NaN through every downstream sum.
pub const MIN_RANGE: f64 = 1e-4;

/// Index of the bearing channel in `[range, bearing, range_rate]`.
pub const BEARING_IDX: usize = 1;

/// A range / bearing / range-rate sensor located at the origin.
#[derive(Debug, Clone)]
pub struct RadarModel {
    /// The 3x3 measurement noise covariance matrix, R.
    pub r_matrix: Matrix3<f64>,
}

impl RadarModel {
    pub fn from_noise(noise: &NoiseParams) -> Self {
        Self {
            r_matrix: diagonal_noise([noise.std_radr, noise.std_radphi, noise.std_radrd]),
        }
    }
}

impl MeasurementModel<N_Z_RADAR> for RadarModel {
    fn sensor(&self) -> SensorKind {
        SensorKind::Radar
    }

    fn get_r(&self) -> &Matrix3<f64> {
        &self.r_matrix
    }

    fn predict_measurement(&self, x: &StateVector) -> Vector3<f64> {
        let px = x[StateVariable::Px.idx()];
        let py = x[StateVariable::Py.idx()];
        let v = x[StateVariable::V.idx()];
        let yaw = x[StateVariable::Yaw.idx()];

        let range = px.hypot(py);
        let bearing = py.atan2(px);
        let range_rate = (px * v * yaw.cos() + py * v * yaw.sin()) / range.max(MIN_RANGE);

        Vector3::new(range, bearing, range_rate)
    }

    fn measurement_angle_index(&self) -> Option<usize> {
        Some(BEARING_IDX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_4;

    fn model() -> RadarModel {
        RadarModel::from_noise(&NoiseParams::default())
    }

    #[test]
    fn test_radar_measures_range_bearing_and_closing_speed() {
        // Moving straight away from the sensor along the diagonal.
        let x = StateVector::new(3.0, 3.0, 2.0, FRAC_PI_4, 0.0);
        let z = model().predict_measurement(&x);
        assert_abs_diff_eq!(z[0], 18.0_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(z[1], FRAC_PI_4, epsilon = 1e-12);
        assert_abs_diff_eq!(z[2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tangential_motion_has_zero_range_rate() {
        let x = StateVector::new(5.0, 0.0, 3.0, std::f64::consts::FRAC_PI_2, 0.0);
        let z = model().predict_measurement(&x);
        assert_abs_diff_eq!(z[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_origin_is_guarded() {
        let x = StateVector::new(0.0, 0.0, 5.0, 1.0, 0.0);
        let z = model().predict_measurement(&x);
        assert!(z.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(z[0], 0.0);
    }

    #[test]
    fn test_noise_and_angle_indices() {
        let m = model();
        assert_abs_diff_eq!(m.get_r()[(1, 1)], 0.03 * 0.03, epsilon = 1e-15);
        assert_abs_diff_eq!(m.get_r()[(2, 2)], 0.3 * 0.3, epsilon = 1e-15);
        assert_eq!(m.measurement_angle_index(), Some(1));
    }
}
