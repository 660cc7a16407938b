// tracklet_core/src/error.rs

use crate::messages::SensorKind;
use thiserror::Error;

/// Everything that can abort a filter cycle.
///
/// A cycle that returns one of these leaves the filter's last good belief untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    /// The augmented covariance has no Cholesky factor; the filter has diverged.
    #[error("covariance is not positive definite during {stage}")]
    CovarianceNotPositiveDefinite { stage: &'static str },

    /// The predicted measurement covariance `S` could not be inverted.
    #[error("innovation covariance is singular for {sensor} update")]
    SingularInnovation { sensor: SensorKind },

    /// A NaN or infinity appeared in a result that was about to be committed.
    #[error("non-finite values produced during {stage}")]
    NonFiniteState { stage: &'static str },

    /// The measurement is older than the filter's current belief.
    #[error("measurement timestamp goes backwards by {dt_us} us")]
    NegativeTimeStep { dt_us: u64 },

    #[error("invalid filter configuration: {0}")]
    InvalidConfig(String),
}
