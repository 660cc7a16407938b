// tracklet_core/src/estimation/mod.rs

use crate::error::FilterError;
use crate::messages::{MeasurementMessage, SensorKind};
use crate::state::CtrvState;

/// What a single call to [`StateEstimator::process`] did with its measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessOutcome {
    /// First measurement: the belief was seeded directly from the raw reading.
    Initialized,
    /// The belief was advanced to the measurement time but the sensor is
    /// disabled, so no correction was applied.
    Predicted,
    /// Predict and correct both ran; `nis` is the consistency score of the update.
    Updated { sensor: SensorKind, nis: f64 },
}

/// The contract for any algorithm that performs the "State Estimator" role.
/// Its sole responsibility is to estimate the state of a single target.
pub trait StateEstimator: Send + Sync {
    /// Consumes one measurement to completion (initialize, or predict then update).
    ///
    /// On error the estimator keeps its last good belief.
    fn process(&mut self, message: &MeasurementMessage) -> Result<ProcessOutcome, FilterError>;

    /// Returns a reference to the current best estimate of the state.
    fn get_state(&self) -> &CtrvState;

    /// Whether a first measurement has been seen.
    fn is_initialized(&self) -> bool;
}

pub mod filters;
pub mod unscented;
