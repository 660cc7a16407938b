// tracklet_core/src/models/dynamics/ctrv.rs

use crate::state::StateVariable;
use crate::types::{
    AugmentedSigmaPoints, AugmentedVector, PredictedSigmaPoints, StateVector, N_SIGMA,
};

/// Below this turn rate the curved-path integral is replaced by a straight line.
pub const MIN_YAW_RATE: f64 = 0.001;

// Indices of the two noise dimensions appended to the state in the augmented vector.
const NOISE_A: usize = 5;
const NOISE_YAWDD: usize = 6;

// --- Constant Turn Rate and Velocity Model ---
// Speed and turn rate are held constant between updates; longitudinal and yaw
// accelerations enter only as zero-mean noise through the augmented state.
#[derive(Debug, Default, Clone, Copy)]
pub struct CtrvModel;

impl CtrvModel {
    /// Propagates one augmented point `[px, py, v, yaw, yaw_rate, nu_a, nu_yawdd]`
    /// forward by `dt` seconds.
    pub fn propagate(&self, point: &AugmentedVector, dt: f64) -> StateVector {
        let px = point[StateVariable::Px.idx()];
        let py = point[StateVariable::Py.idx()];
        let v = point[StateVariable::V.idx()];
        let yaw = point[StateVariable::Yaw.idx()];
        let yaw_rate = point[StateVariable::YawRate.idx()];
        let nu_a = point[NOISE_A];
        let nu_yawdd = point[NOISE_YAWDD];

        // Deterministic part.
        let (mut px_p, mut py_p) = if yaw_rate.abs() > MIN_YAW_RATE {
            (
                px + v / yaw_rate * ((yaw + yaw_rate * dt).sin() - yaw.sin()),
                py + v / yaw_rate * (yaw.cos() - (yaw + yaw_rate * dt).cos()),
            )
        } else {
            (px + v * dt * yaw.cos(), py + v * dt * yaw.sin())
        };
        let mut v_p = v;
        let mut yaw_p = yaw + yaw_rate * dt;
        let mut yaw_rate_p = yaw_rate;

        // Noise contribution.
        let half_dt2 = 0.5 * dt * dt;
        px_p += half_dt2 * nu_a * yaw.cos();
        py_p += half_dt2 * nu_a * yaw.sin();
        v_p += nu_a * dt;
        yaw_p += half_dt2 * nu_yawdd;
        yaw_rate_p += nu_yawdd * dt;

        StateVector::new(px_p, py_p, v_p, yaw_p, yaw_rate_p)
    }

    /// Runs every column of an augmented sigma point set through [`Self::propagate`].
    pub fn predict_sigma_points(
        &self,
        sigma_points: &AugmentedSigmaPoints,
        dt: f64,
    ) -> PredictedSigmaPoints {
        let mut predicted = PredictedSigmaPoints::zeros();
        for i in 0..N_SIGMA {
            let point: AugmentedVector = sigma_points.column(i).into_owned();
            predicted.set_column(i, &self.propagate(&point, dt));
        }
        predicted
    }
}
