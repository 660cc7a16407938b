// tracklet_core/src/estimation/filters/ukf.rs

use nalgebra::SVector;
use tracing::{debug, error, info, warn};

// --- Core Library Imports ---
use crate::config::UkfConfig;
use crate::error::FilterError;
use crate::estimation::unscented::{
    augmented_sigma_points, reconstruct_state, sigma_weights, unscented_update, UpdateResult,
    LAMBDA,
};
use crate::estimation::{ProcessOutcome, StateEstimator};
use crate::messages::{MeasurementData, MeasurementMessage, SensorKind};
use crate::models::dynamics::ctrv::CtrvModel;
use crate::models::measurement::lidar::LidarModel;
use crate::models::measurement::radar::RadarModel;
use crate::models::measurement::MeasurementModel;
use crate::state::CtrvState;
use crate::types::{
    elapsed_seconds, PredictedSigmaPoints, StateCovariance, StateVector, Timestamp, Weights,
};

/// Variance seeded for state components the first measurement cannot observe.
const UNOBSERVED_VARIANCE: f64 = 5.0;

/// The belief advanced to a new time, plus the sigma points it was built from.
///
/// The sigma points are kept so the measurement update of the same cycle can
/// project them instead of drawing a fresh set.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub state: CtrvState,
    pub sigma_points: PredictedSigmaPoints,
}

/// An Unscented Kalman Filter for a single target under the CTRV motion model,
/// fusing lidar (linear) and radar (nonlinear) measurements.
#[derive(Debug, Clone)]
pub struct UnscentedKalmanFilter {
    state: CtrvState,
    is_initialized: bool,
    config: UkfConfig,

    dynamics_model: CtrvModel,
    lidar_model: LidarModel,
    radar_model: RadarModel,

    // --- UKF-specific internal state ---
    /// Weights for reconstructing mean and covariance from sigma points.
    weights: Weights,
    nis_lidar: Option<f64>,
    nis_radar: Option<f64>,
}

impl UnscentedKalmanFilter {
    pub fn new(config: UkfConfig) -> Result<Self, FilterError> {
        config.validate()?;

        Ok(Self {
            state: CtrvState::default(),
            is_initialized: false,
            dynamics_model: CtrvModel,
            lidar_model: LidarModel::from_noise(&config.noise),
            radar_model: RadarModel::from_noise(&config.noise),
            weights: sigma_weights(LAMBDA),
            nis_lidar: None,
            nis_radar: None,
            config,
        })
    }

    pub fn config(&self) -> &UkfConfig {
        &self.config
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Timestamp (us) of the current belief.
    pub fn timestamp_us(&self) -> Timestamp {
        self.state.last_update_timestamp
    }

    /// Consistency score of the most recent update from `sensor`, if any.
    pub fn nis(&self, sensor: SensorKind) -> Option<f64> {
        match sensor {
            SensorKind::Lidar => self.nis_lidar,
            SensorKind::Radar => self.nis_radar,
        }
    }

    /// Consumes one measurement: seeds the belief on the first call, otherwise
    /// predicts to the measurement time and corrects with the matching sensor.
    ///
    /// If any stage fails, the previous belief, timestamp and NIS values are kept.
    pub fn process_measurement(
        &mut self,
        message: &MeasurementMessage,
    ) -> Result<ProcessOutcome, FilterError> {
        if !self.is_initialized {
            self.initialize(message);
            return Ok(ProcessOutcome::Initialized);
        }

        self.run_cycle(message).inspect_err(|e| {
            error!(
                "Dropping {} measurement at t={}us, keeping last good state: {}",
                message.sensor(),
                message.timestamp,
                e
            );
        })
    }

    /// Seeds mean and covariance directly from the first reading.
    fn initialize(&mut self, message: &MeasurementMessage) {
        let noise = &self.config.noise;
        let (vector, diagonal) = match message.data {
            MeasurementData::Lidar(z) => {
                let (px, py) = (z[0], z[1]);
                (
                    StateVector::new(px, py, 0.0, py.atan2(px), 0.0),
                    StateVector::new(
                        noise.std_laspx.powi(2),
                        noise.std_laspy.powi(2),
                        UNOBSERVED_VARIANCE,
                        UNOBSERVED_VARIANCE,
                        UNOBSERVED_VARIANCE,
                    ),
                )
            }
            MeasurementData::Radar(z) => {
                let (range, bearing, range_rate) = (z[0], z[1], z[2]);
                let (sin_b, cos_b) = bearing.sin_cos();
                // First-order spread of range and bearing noise into x and y.
                let dx = cos_b * noise.std_radr - range * sin_b * noise.std_radphi;
                let dy = sin_b * noise.std_radr + range * cos_b * noise.std_radphi;
                (
                    StateVector::new(range * cos_b, range * sin_b, range_rate, bearing, 0.0),
                    StateVector::new(
                        dx * dx,
                        dy * dy,
                        noise.std_radrd,
                        noise.std_radphi.powi(2),
                        UNOBSERVED_VARIANCE,
                    ),
                )
            }
        };

        self.state = CtrvState::new(
            vector,
            StateCovariance::from_diagonal(&diagonal),
            message.timestamp,
        );
        self.is_initialized = true;
        info!(
            "Filter initialized from {} at t={}us: x = {:?}",
            message.sensor(),
            message.timestamp,
            self.state.vector.as_slice()
        );
    }

    /// Predict then update, touching `self` only once every stage has succeeded.
    fn run_cycle(&mut self, message: &MeasurementMessage) -> Result<ProcessOutcome, FilterError> {
        let last = self.state.last_update_timestamp;
        if message.timestamp < last {
            return Err(FilterError::NegativeTimeStep {
                dt_us: last - message.timestamp,
            });
        }
        let dt = elapsed_seconds(last, message.timestamp);

        let prediction = self.predict(dt, message.timestamp)?;
        debug!("Predicted {:.6}s ahead to t={}us", dt, message.timestamp);

        let outcome = match message.data {
            MeasurementData::Lidar(z) if self.config.sensors.use_lidar => {
                let result = self.update(&self.lidar_model, &prediction, &z)?;
                self.commit(
                    prediction.state.last_update_timestamp,
                    result.vector,
                    result.covariance,
                )?;
                self.nis_lidar = Some(result.nis);
                ProcessOutcome::Updated {
                    sensor: SensorKind::Lidar,
                    nis: result.nis,
                }
            }
            MeasurementData::Radar(z) if self.config.sensors.use_radar => {
                let result = self.update(&self.radar_model, &prediction, &z)?;
                self.commit(
                    prediction.state.last_update_timestamp,
                    result.vector,
                    result.covariance,
                )?;
                self.nis_radar = Some(result.nis);
                ProcessOutcome::Updated {
                    sensor: SensorKind::Radar,
                    nis: result.nis,
                }
            }
            _ => {
                warn!(
                    "{} updates are disabled; applying prediction only",
                    message.sensor()
                );
                let Prediction { state, .. } = prediction;
                self.commit(state.last_update_timestamp, state.vector, state.covariance)?;
                ProcessOutcome::Predicted
            }
        };

        if let ProcessOutcome::Updated { sensor, nis } = outcome {
            debug!("{} update applied, NIS = {:.4}", sensor, nis);
        }
        Ok(outcome)
    }

    /// Advances the current belief by `dt` seconds through the CTRV model.
    ///
    /// Pure: the filter's own state is left as it is.
    pub fn predict(&self, dt: f64, timestamp: Timestamp) -> Result<Prediction, FilterError> {
        // --- 1. Generate augmented sigma points ---
        let aug_points = augmented_sigma_points(&self.state, &self.config.noise, LAMBDA)?;

        // --- 2. Propagate each point through the NON-LINEAR process model ---
        let sigma_points = self.dynamics_model.predict_sigma_points(&aug_points, dt);

        // --- 3. Recover the predicted mean and covariance ---
        let moments = reconstruct_state(&sigma_points, &self.weights);

        Ok(Prediction {
            state: CtrvState::new(moments.mean, moments.covariance, timestamp),
            sigma_points,
        })
    }

    fn update<const M: usize>(
        &self,
        model: &dyn MeasurementModel<M>,
        prediction: &Prediction,
        z: &SVector<f64, M>,
    ) -> Result<UpdateResult<M>, FilterError> {
        unscented_update(
            model,
            &prediction.sigma_points,
            &prediction.state.vector,
            &prediction.state.covariance,
            &self.weights,
            z,
        )
    }

    /// Installs a new belief after checking it is finite.
    fn commit(
        &mut self,
        timestamp: Timestamp,
        vector: StateVector,
        covariance: StateCovariance,
    ) -> Result<(), FilterError> {
        let mut next = CtrvState::new(vector, covariance, timestamp);
        next.symmetrize();
        if !next.is_finite() {
            return Err(FilterError::NonFiniteState {
                stage: "state commit",
            });
        }
        self.state = next;
        Ok(())
    }
}

// --- The Public Trait Implementation ---
impl StateEstimator for UnscentedKalmanFilter {
    fn process(&mut self, message: &MeasurementMessage) -> Result<ProcessOutcome, FilterError> {
        self.process_measurement(message)
    }

    fn get_state(&self) -> &CtrvState {
        &self.state
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorToggles;
    use approx::assert_abs_diff_eq;

    fn filter() -> UnscentedKalmanFilter {
        UnscentedKalmanFilter::new(UkfConfig::default()).unwrap()
    }

    #[test]
    fn test_first_lidar_measurement_initializes() {
        let mut ukf = filter();
        let outcome = ukf.process(&MeasurementMessage::lidar(1.0, 2.0, 0)).unwrap();
        assert_eq!(outcome, ProcessOutcome::Initialized);
        assert!(ukf.is_initialized());

        let x = ukf.get_state().vector;
        assert_abs_diff_eq!(x[0], 1.0);
        assert_abs_diff_eq!(x[1], 2.0);
        assert_abs_diff_eq!(x[2], 0.0);
        assert_abs_diff_eq!(x[3], 2.0_f64.atan2(1.0));
        assert_abs_diff_eq!(x[4], 0.0);

        let p = ukf.get_state().covariance;
        assert_abs_diff_eq!(p[(0, 0)], 0.0225, epsilon = 1e-12);
        assert_abs_diff_eq!(p[(4, 4)], 5.0);
        assert!(ukf.nis(SensorKind::Lidar).is_none());
    }

    #[test]
    fn test_first_radar_measurement_initializes_from_polar() {
        let mut ukf = filter();
        let bearing = 0.3_f64;
        ukf.process(&MeasurementMessage::radar(10.0, bearing, 1.5, 42)).unwrap();

        let x = ukf.get_state().vector;
        assert_abs_diff_eq!(x[0], 10.0 * bearing.cos(), epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 10.0 * bearing.sin(), epsilon = 1e-12);
        assert_abs_diff_eq!(x[2], 1.5);
        assert_abs_diff_eq!(x[3], bearing);
        assert_eq!(ukf.timestamp_us(), 42);
        let p = ukf.get_state().covariance;
        assert!(p[(0, 0)] > 0.0 && p[(1, 1)] > 0.0);
        assert_abs_diff_eq!(p[(3, 3)], 0.03 * 0.03, epsilon = 1e-15);
    }

    #[test]
    fn test_second_lidar_measurement_partially_corrects() {
        let mut ukf = filter();
        ukf.process(&MeasurementMessage::lidar(1.0, 2.0, 0)).unwrap();
        let outcome = ukf
            .process(&MeasurementMessage::lidar(1.1, 2.1, 1_000_000))
            .unwrap();

        let nis = match outcome {
            ProcessOutcome::Updated { sensor, nis } => {
                assert_eq!(sensor, SensorKind::Lidar);
                nis
            }
            other => panic!("expected an update, got {:?}", other),
        };
        assert!(nis >= 0.0);
        assert_eq!(ukf.nis(SensorKind::Lidar), Some(nis));

        let x = ukf.get_state().vector;
        let before = ((1.1_f64 - 1.0).powi(2) + (2.1_f64 - 2.0).powi(2)).sqrt();
        let after = ((1.1 - x[0]).powi(2) + (2.1 - x[1]).powi(2)).sqrt();
        assert!(after < before, "estimate did not move toward the measurement");
        assert!(after > 1e-9, "estimate snapped exactly onto the measurement");
        assert_eq!(ukf.timestamp_us(), 1_000_000);
    }

    #[test]
    fn test_radar_update_records_nis() {
        let mut ukf = filter();
        ukf.process(&MeasurementMessage::radar(5.0, 0.4, 1.0, 0)).unwrap();
        let outcome = ukf
            .process(&MeasurementMessage::radar(5.1, 0.41, 1.0, 100_000))
            .unwrap();
        assert!(matches!(
            outcome,
            ProcessOutcome::Updated {
                sensor: SensorKind::Radar,
                ..
            }
        ));
        assert!(ukf.nis(SensorKind::Radar).unwrap() >= 0.0);
        assert!(ukf.nis(SensorKind::Lidar).is_none());
    }

    #[test]
    fn test_disabled_sensor_still_advances_time() {
        let config = UkfConfig {
            sensors: SensorToggles {
                use_lidar: true,
                use_radar: false,
            },
            ..UkfConfig::default()
        };
        let mut ukf = UnscentedKalmanFilter::new(config).unwrap();
        ukf.process(&MeasurementMessage::lidar(1.0, 1.0, 0)).unwrap();
        let outcome = ukf
            .process(&MeasurementMessage::radar(1.5, 0.7, 0.0, 50_000))
            .unwrap();
        assert_eq!(outcome, ProcessOutcome::Predicted);
        assert_eq!(ukf.timestamp_us(), 50_000);
        assert!(ukf.nis(SensorKind::Radar).is_none());
    }

    #[test]
    fn test_backwards_timestamp_keeps_last_good_state() {
        let mut ukf = filter();
        ukf.process(&MeasurementMessage::lidar(1.0, 2.0, 1_000)).unwrap();
        let before = ukf.get_state().clone();

        let err = ukf
            .process(&MeasurementMessage::lidar(3.0, 3.0, 500))
            .unwrap_err();
        assert_eq!(err, FilterError::NegativeTimeStep { dt_us: 500 });
        assert_eq!(ukf.get_state(), &before);
    }

    #[test]
    fn test_diverged_covariance_keeps_last_good_state() {
        let mut ukf = filter();
        ukf.process(&MeasurementMessage::lidar(1.0, 2.0, 0)).unwrap();
        ukf.state.covariance[(2, 2)] = -3.0;
        let before = ukf.get_state().clone();

        let err = ukf
            .process(&MeasurementMessage::lidar(1.1, 2.1, 100_000))
            .unwrap_err();
        assert!(matches!(err, FilterError::CovarianceNotPositiveDefinite { .. }));
        assert_eq!(ukf.get_state(), &before);
        assert!(ukf.nis(SensorKind::Lidar).is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected_at_construction() {
        let mut config = UkfConfig::default();
        config.noise.std_laspx = -1.0;
        assert!(matches!(
            UnscentedKalmanFilter::new(config),
            Err(FilterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_covariance_stays_symmetric_over_a_track() {
        let mut ukf = filter();
        let mut t = 0;
        ukf.process(&MeasurementMessage::lidar(0.5, 0.5, t)).unwrap();
        for k in 1..40 {
            t += 50_000;
            let s = k as f64 * 0.05;
            let msg = if k % 2 == 0 {
                MeasurementMessage::lidar(0.5 + 2.0 * s, 0.5 + 0.5 * s, t)
            } else {
                let (px, py) = (0.5 + 2.0 * s, 0.5 + 0.5 * s);
                let range = px.hypot(py);
                let rate = (px * 2.0 + py * 0.5) / range;
                MeasurementMessage::radar(range, py.atan2(px), rate, t)
            };
            ukf.process(&msg).unwrap();
            let p = ukf.get_state().covariance;
            assert_abs_diff_eq!(p, p.transpose(), epsilon = 1e-12);
            for i in 0..5 {
                assert!(p[(i, i)] > 0.0, "variance {} went non-positive", i);
            }
        }
        let x = ukf.get_state().vector;
        assert_abs_diff_eq!(x[0], 0.5 + 2.0 * 39.0 * 0.05, epsilon = 0.5);
    }
}
