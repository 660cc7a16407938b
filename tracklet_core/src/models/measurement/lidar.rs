// tracklet_core/src/models/measurement/lidar.rs

use nalgebra::{Matrix2, Vector2};

use crate::config::NoiseParams;
use crate::messages::SensorKind;
use crate::models::measurement::{diagonal_noise, MeasurementModel};
use crate::state::StateVariable;
use crate::types::{StateVector, N_Z_LIDAR};

/// Positional sensor: observes `[px, py]` directly.
#[derive(Debug, Clone)]
pub struct LidarModel {
    // The R matrix for this sensor
    pub noise_covariance: Matrix2<f64>,
}

impl LidarModel {
    pub fn from_noise(noise: &NoiseParams) -> Self {
        Self {
            noise_covariance: diagonal_noise([noise.std_laspx, noise.std_laspy]),
        }
    }
}

impl MeasurementModel<N_Z_LIDAR> for LidarModel {
    fn sensor(&self) -> SensorKind {
        SensorKind::Lidar
    }

    fn get_r(&self) -> &Matrix2<f64> {
        &self.noise_covariance
    }

    fn predict_measurement(&self, x: &StateVector) -> Vector2<f64> {
        Vector2::new(x[StateVariable::Px.idx()], x[StateVariable::Py.idx()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_lidar_projects_position() {
        let model = LidarModel::from_noise(&NoiseParams::default());
        let z = model.predict_measurement(&StateVector::new(4.0, -2.0, 9.0, 1.0, 0.2));
        assert_abs_diff_eq!(z, Vector2::new(4.0, -2.0));
        assert_abs_diff_eq!(model.get_r()[(0, 0)], 0.15 * 0.15, epsilon = 1e-15);
        assert_abs_diff_eq!(model.get_r()[(0, 1)], 0.0);
        assert!(model.measurement_angle_index().is_none());
    }
}
