// tracklet_core/src/state.rs

use nalgebra::Vector4;

use crate::types::{StateCovariance, StateVector, Timestamp, N_X};

/// Every variable in the CTRV state vector, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVariable {
    /// X position, m.
    Px,
    /// Y position, m.
    Py,
    /// Scalar speed along the heading, m/s.
    V,
    /// Heading angle, rad.
    Yaw,
    /// Turn rate, rad/s.
    YawRate,
}

impl StateVariable {
    /// The ordered layout of the state vector.
    pub const LAYOUT: [StateVariable; N_X] = [
        StateVariable::Px,
        StateVariable::Py,
        StateVariable::V,
        StateVariable::Yaw,
        StateVariable::YawRate,
    ];

    /// Index of this variable in the state vector.
    pub const fn idx(self) -> usize {
        match self {
            StateVariable::Px => 0,
            StateVariable::Py => 1,
            StateVariable::V => 2,
            StateVariable::Yaw => 3,
            StateVariable::YawRate => 4,
        }
    }
}

/// Resolves a CTRV state vector into `[px, py, vx, vy]`.
pub fn cartesian(x: &StateVector) -> Vector4<f64> {
    let v = x[StateVariable::V.idx()];
    let yaw = x[StateVariable::Yaw.idx()];
    Vector4::new(
        x[StateVariable::Px.idx()],
        x[StateVariable::Py.idx()],
        v * yaw.cos(),
        v * yaw.sin(),
    )
}

/// The filter's belief: mean, covariance and the time they refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct CtrvState {
    /// The mean `x = [px, py, v, yaw, yaw_rate]`.
    pub vector: StateVector,
    /// The covariance matrix `P`.
    pub covariance: StateCovariance,
    /// The timestamp (us) the belief refers to.
    pub last_update_timestamp: Timestamp,
}

impl Default for CtrvState {
    fn default() -> Self {
        Self {
            vector: StateVector::zeros(),
            covariance: StateCovariance::zeros(),
            last_update_timestamp: 0,
        }
    }
}

impl CtrvState {
    pub fn new(vector: StateVector, covariance: StateCovariance, timestamp: Timestamp) -> Self {
        Self {
            vector,
            covariance,
            last_update_timestamp: timestamp,
        }
    }

    /// Position and velocity components `[px, py, vx, vy]`, the form used for accuracy scoring.
    pub fn to_cartesian(&self) -> Vector4<f64> {
        cartesian(&self.vector)
    }

    /// Forces `P` to be exactly symmetric, removing round-off asymmetry.
    pub fn symmetrize(&mut self) {
        self.covariance = (self.covariance + self.covariance.transpose()) * 0.5;
    }

    pub fn is_finite(&self) -> bool {
        self.vector.iter().all(|v| v.is_finite()) && self.covariance.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_layout_matches_indices() {
        for (i, var) in StateVariable::LAYOUT.iter().enumerate() {
            assert_eq!(var.idx(), i);
        }
    }

    #[test]
    fn test_to_cartesian_resolves_heading() {
        let state = CtrvState::new(
            StateVector::new(1.0, 2.0, 3.0, FRAC_PI_2, 0.1),
            StateCovariance::identity(),
            0,
        );
        let c = state.to_cartesian();
        assert_abs_diff_eq!(c[0], 1.0);
        assert_abs_diff_eq!(c[1], 2.0);
        assert_abs_diff_eq!(c[2], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c[3], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_symmetrize() {
        let mut state = CtrvState::default();
        state.covariance[(0, 1)] = 1.0;
        state.covariance[(1, 0)] = 0.0;
        state.symmetrize();
        assert_abs_diff_eq!(state.covariance[(0, 1)], 0.5);
        assert_abs_diff_eq!(state.covariance[(1, 0)], 0.5);
    }
}
