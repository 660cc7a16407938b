// tracklet_core/src/evaluation.rs

//! Accuracy scoring of an estimate stream against ground truth.

use nalgebra::Vector4;
use tracing::warn;

/// Per-dimension root-mean-square error between estimates and ground truth,
/// both given as `[px, py, vx, vy]`.
///
/// Empty or length-mismatched inputs are not an error: they are reported
/// with a warning and yield the zero vector.
pub fn calculate_rmse(
    estimations: &[Vector4<f64>],
    ground_truth: &[Vector4<f64>],
) -> Vector4<f64> {
    if estimations.is_empty() || estimations.len() != ground_truth.len() {
        warn!(
            "Cannot compute RMSE: {} estimations vs {} ground truth samples",
            estimations.len(),
            ground_truth.len()
        );
        return Vector4::zeros();
    }

    let sum_sq = estimations
        .iter()
        .zip(ground_truth)
        .fold(Vector4::zeros(), |acc: Vector4<f64>, (est, gt)| {
            let res = est - gt;
            acc + res.component_mul(&res)
        });

    (sum_sq / estimations.len() as f64).map(f64::sqrt)
}
