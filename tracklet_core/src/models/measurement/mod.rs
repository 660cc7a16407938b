// tracklet_core/src/models/measurement/mod.rs

use nalgebra::{SMatrix, SVector};
use std::fmt::Debug;

use crate::messages::SensorKind;
use crate::types::StateVector;

// --- MEASUREMENT MODEL TRAIT ---
// Represents the mathematical model of a sensor. `z = h(x) + v`
pub trait MeasurementModel<const M: usize>: Debug + Send + Sync {
    /// Which sensor this model describes.
    fn sensor(&self) -> SensorKind;

    /// Returns the measurement noise covariance matrix `R`.
    fn get_r(&self) -> &SMatrix<f64, M, M>;

    /// Predicts the ideal measurement `z_pred = h(x)` for one state.
    fn predict_measurement(&self, x: &StateVector) -> SVector<f64, M>;

    /// Index of the measurement component that is an angle and must be wrapped
    /// in every residual.
    fn measurement_angle_index(&self) -> Option<usize> {
        None
    }
}

/// Builds a diagonal `R` from per-channel standard deviations.
pub(crate) fn diagonal_noise<const M: usize>(std_devs: [f64; M]) -> SMatrix<f64, M, M> {
    SMatrix::<f64, M, M>::from_diagonal(&SVector::<f64, M>::from_fn(|i, _| std_devs[i].powi(2)))
}

pub mod lidar;
pub mod radar;
