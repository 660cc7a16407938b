// tracklet_core/src/types.rs

use nalgebra::{Matrix5, SMatrix, SVector, Vector5};

// --- Dimensionality ---
/// Dimension of the CTRV state `[px, py, v, yaw, yaw_rate]`.
pub const N_X: usize = 5;
/// Dimension of the augmented state (state + longitudinal and yaw acceleration noise).
pub const N_AUG: usize = 7;
/// Number of sigma points generated from the augmented belief.
pub const N_SIGMA: usize = 2 * N_AUG + 1;
/// Dimension of a lidar (positional) measurement.
pub const N_Z_LIDAR: usize = 2;
/// Dimension of a radar (range, bearing, range-rate) measurement.
pub const N_Z_RADAR: usize = 3;

// --- Core Type Aliases ---
pub type StateVector = Vector5<f64>;
pub type StateCovariance = Matrix5<f64>;
pub type AugmentedVector = SVector<f64, N_AUG>;
pub type AugmentedCovariance = SMatrix<f64, N_AUG, N_AUG>;
/// Augmented sigma points, one point per column.
pub type AugmentedSigmaPoints = SMatrix<f64, N_AUG, N_SIGMA>;
/// Sigma points after propagation through the process model, one point per column.
pub type PredictedSigmaPoints = SMatrix<f64, N_X, N_SIGMA>;
pub type Weights = SVector<f64, N_SIGMA>;

/// Measurement timestamps, in microseconds.
pub type Timestamp = u64;

/// Converts a pair of microsecond timestamps into elapsed seconds.
pub fn elapsed_seconds(from: Timestamp, to: Timestamp) -> f64 {
    (to as f64 - from as f64) / 1_000_000.0
}
