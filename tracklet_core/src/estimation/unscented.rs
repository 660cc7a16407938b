// tracklet_core/src/estimation/unscented.rs

//! Unscented transform building blocks shared by prediction and both
//! measurement updates: weights, augmented sigma points, moment
//! reconstruction and the generic sigma-point measurement update.

use nalgebra::{Cholesky, SMatrix, SVector};

use crate::config::NoiseParams;
use crate::error::FilterError;
use crate::models::measurement::MeasurementModel;
use crate::state::{CtrvState, StateVariable};
use crate::types::{
    AugmentedCovariance, AugmentedSigmaPoints, AugmentedVector, PredictedSigmaPoints,
    StateCovariance, StateVector, Weights, N_AUG, N_SIGMA, N_X,
};
use crate::utils::angles::normalize_angle;

/// Sigma point spread, `lambda = 3 - n_x`.
///
/// Uses the state dimension rather than the augmented one, which gives the
/// central point a weight of `-0.4`. The value is fixed; changing it changes
/// every estimate the filter produces.
pub const LAMBDA: f64 = 3.0 - N_X as f64;

// Heading is the only angular state component; its deviations are wrapped in
// every state-space sum regardless of sensor.
const YAW_IDX: usize = StateVariable::Yaw.idx();

/// Mean and covariance recovered from a sigma point set.
#[derive(Debug, Clone, PartialEq)]
pub struct Moments<const R: usize> {
    pub mean: SVector<f64, R>,
    pub covariance: SMatrix<f64, R, R>,
}

/// Weights for the `2 * n_aug + 1` sigma points. Used for both mean and covariance.
pub fn sigma_weights(lambda: f64) -> Weights {
    let n = N_AUG as f64;
    let mut weights = Weights::from_element(0.5 / (lambda + n));
    weights[0] = lambda / (lambda + n);
    weights
}

/// Generates the augmented sigma points for the current belief.
///
/// The mean is extended with two zero-mean noise dimensions whose variances
/// are `std_a^2` and `std_yawdd^2`. Fails if the augmented covariance has no
/// Cholesky factor.
pub fn augmented_sigma_points(
    state: &CtrvState,
    noise: &NoiseParams,
    lambda: f64,
) -> Result<AugmentedSigmaPoints, FilterError> {
    let mut x_aug = AugmentedVector::zeros();
    x_aug.fixed_rows_mut::<N_X>(0).copy_from(&state.vector);

    let mut p_aug = AugmentedCovariance::zeros();
    p_aug
        .fixed_view_mut::<N_X, N_X>(0, 0)
        .copy_from(&state.covariance);
    p_aug[(N_X, N_X)] = noise.std_a.powi(2);
    p_aug[(N_X + 1, N_X + 1)] = noise.std_yawdd.powi(2);

    // Cholesky decomposition: P_aug = L * L^T
    let l_matrix = Cholesky::new(p_aug)
        .ok_or(FilterError::CovarianceNotPositiveDefinite {
            stage: "augmented sigma point generation",
        })?
        .l();
    let scaled_l = l_matrix * (lambda + N_AUG as f64).sqrt();

    let mut sigma_points = AugmentedSigmaPoints::zeros();
    // First point is the mean.
    sigma_points.set_column(0, &x_aug);
    // The other 2n points are spread symmetrically around it.
    for i in 0..N_AUG {
        sigma_points.set_column(i + 1, &(x_aug + scaled_l.column(i)));
        sigma_points.set_column(i + 1 + N_AUG, &(x_aug - scaled_l.column(i)));
    }

    Ok(sigma_points)
}

/// Weighted mean and covariance of a sigma point set.
///
/// When `angle_idx` is set, that component of every deviation is wrapped into
/// `(-π, π]` before it enters the outer product.
pub fn reconstruct<const R: usize>(
    points: &SMatrix<f64, R, N_SIGMA>,
    weights: &Weights,
    angle_idx: Option<usize>,
) -> Moments<R> {
    let mean = points * weights;

    let mut covariance = SMatrix::<f64, R, R>::zeros();
    for i in 0..N_SIGMA {
        let diff = wrapped_diff(points.column(i).into_owned(), &mean, angle_idx);
        covariance += weights[i] * diff * diff.transpose();
    }

    Moments { mean, covariance }
}

/// Predicted mean and covariance of the state from propagated sigma points.
/// The heading deviation is always wrapped.
pub fn reconstruct_state(points: &PredictedSigmaPoints, weights: &Weights) -> Moments<N_X> {
    reconstruct(points, weights, Some(YAW_IDX))
}

fn wrapped_diff<const R: usize>(
    point: SVector<f64, R>,
    mean: &SVector<f64, R>,
    angle_idx: Option<usize>,
) -> SVector<f64, R> {
    let mut diff = point - mean;
    if let Some(idx) = angle_idx {
        diff[idx] = normalize_angle(diff[idx]);
    }
    diff
}

/// Result of a sigma-point measurement update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult<const M: usize> {
    pub vector: StateVector,
    pub covariance: StateCovariance,
    /// Measurement residual `z - z_pred`, angle-wrapped where the model requires it.
    pub innovation: SVector<f64, M>,
    /// Normalized innovation squared.
    pub nis: f64,
}

/// The unscented measurement update shared by every sensor.
///
/// Projects the predicted sigma points through the model's `h(x)`,
/// reconstructs `z_pred` and `S`, builds the cross-covariance `T`, and
/// corrects `(x, P)` with `K = T * S^-1`. The inputs are not modified.
pub fn unscented_update<const M: usize, H>(
    model: &H,
    sigma_points: &PredictedSigmaPoints,
    x_pred: &StateVector,
    p_pred: &StateCovariance,
    weights: &Weights,
    z: &SVector<f64, M>,
) -> Result<UpdateResult<M>, FilterError>
where
    H: MeasurementModel<M> + ?Sized,
{
    let z_angle = model.measurement_angle_index();

    // --- 1. Project sigma points into measurement space ---
    let mut z_sig = SMatrix::<f64, M, N_SIGMA>::zeros();
    for i in 0..N_SIGMA {
        let x_i: StateVector = sigma_points.column(i).into_owned();
        z_sig.set_column(i, &model.predict_measurement(&x_i));
    }

    // --- 2. Predicted measurement and its covariance ---
    let Moments {
        mean: z_pred,
        covariance: mut s_cov,
    } = reconstruct(&z_sig, weights, z_angle);
    s_cov += model.get_r();

    // --- 3. Cross-covariance between state and measurement deviations ---
    let mut t_cov = SMatrix::<f64, N_X, M>::zeros();
    for i in 0..N_SIGMA {
        let z_diff = wrapped_diff(z_sig.column(i).into_owned(), &z_pred, z_angle);
        let x_diff = wrapped_diff(sigma_points.column(i).into_owned(), x_pred, Some(YAW_IDX));
        t_cov += weights[i] * x_diff * z_diff.transpose();
    }

    // --- 4. Kalman gain and correction ---
    let s_inv = s_cov
        .try_inverse()
        .ok_or(FilterError::SingularInnovation {
            sensor: model.sensor(),
        })?;
    let k_gain = t_cov * s_inv;

    let innovation = wrapped_diff(*z, &z_pred, z_angle);
    let vector = x_pred + k_gain * innovation;
    let covariance = p_pred - k_gain * s_cov * k_gain.transpose();
    let nis = (innovation.transpose() * s_inv * innovation)[(0, 0)];

    Ok(UpdateResult {
        vector,
        covariance,
        innovation,
        nis,
    })
}
