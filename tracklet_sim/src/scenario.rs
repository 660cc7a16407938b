// tracklet_sim/src/scenario.rs

//! Synthetic measurement logs: a CTRV target driven by random accelerations,
//! observed by noisy lidar and radar sensors.

use nalgebra::SVector;
use rand_distr::{Distribution, Normal};
use tracing::{debug, info, warn};
use tracklet_core::config::NoiseParams;
use tracklet_core::messages::{MeasurementMessage, SensorKind};
use tracklet_core::models::dynamics::ctrv::CtrvModel;
use tracklet_core::models::measurement::lidar::LidarModel;
use tracklet_core::models::measurement::radar::{RadarModel, BEARING_IDX};
use tracklet_core::models::measurement::MeasurementModel;
use tracklet_core::state::CtrvState;
use tracklet_core::types::{
    elapsed_seconds, AugmentedVector, StateCovariance, StateVector, Timestamp, N_X,
};
use tracklet_core::utils::angles::normalize_angle;

use crate::config::{ScenarioConfig, SensorConfig, TargetConfig};
use crate::error::SimError;
use crate::ingest::MeasurementRecord;
use crate::prng::SimulationRng;

const US_PER_S: f64 = 1e6;

fn normal(std_dev: f64, what: &str) -> Result<Normal<f64>, SimError> {
    Normal::new(0.0, std_dev).map_err(|e| SimError::InvalidScenario(format!("{what} noise: {e}")))
}

/// Adds one draw per channel to an ideal reading. `noise` holds one
/// distribution per measurement channel.
fn sample_into<const M: usize>(
    ideal: SVector<f64, M>,
    noise: &[Normal<f64>],
    rng: &mut SimulationRng,
) -> SVector<f64, M> {
    ideal + SVector::<f64, M>::from_fn(|i, _| noise[i].sample(&mut rng.0))
}

/// One simulated sensor: a fixed-rate schedule plus per-reading noise.
struct SimulatedSensor {
    kind: SensorKind,
    period_us: u64,
    next_due: Timestamp,
    noise: Vec<Normal<f64>>,
}

impl SimulatedSensor {
    fn new(config: &SensorConfig, params: &NoiseParams) -> Result<Self, SimError> {
        let period_us = ((US_PER_S / config.rate_hz).round() as u64).max(1);
        let noise = match config.kind {
            SensorKind::Lidar => vec![
                normal(params.std_laspx, "lidar px")?,
                normal(params.std_laspy, "lidar py")?,
            ],
            SensorKind::Radar => vec![
                normal(params.std_radr, "radar range")?,
                normal(params.std_radphi, "radar bearing")?,
                normal(params.std_radrd, "radar range rate")?,
            ],
        };
        Ok(Self {
            kind: config.kind,
            period_us,
            next_due: config.offset_us,
            noise,
        })
    }
}

/// Generates a time-ordered measurement log with ground truth attached.
///
/// The truth is integrated with the same CTRV equations the filter uses, with
/// fresh accelerations drawn every `step_us`. Sensor noise uses the filter's
/// configured standard deviations, so a well-tuned filter should see NIS
/// values near the chi-square expectation.
pub struct ScenarioGenerator {
    config: ScenarioConfig,
    dynamics: CtrvModel,
    lidar: LidarModel,
    radar: RadarModel,
}

impl ScenarioGenerator {
    pub fn new(config: ScenarioConfig) -> Result<Self, SimError> {
        config.validate()?;
        let noise = config.filter.noise;
        Ok(Self {
            config,
            dynamics: CtrvModel,
            lidar: LidarModel::from_noise(&noise),
            radar: RadarModel::from_noise(&noise),
        })
    }

    pub fn generate(&self, rng: &mut SimulationRng) -> Result<Vec<MeasurementRecord>, SimError> {
        let sim = &self.config.simulation;
        let target = &self.config.target;
        let accel = normal(target.std_a, "target acceleration")?;
        let yaw_accel = normal(target.std_yawdd, "target yaw acceleration")?;

        let mut sensors = self
            .config
            .sensors
            .iter()
            .map(|s| SimulatedSensor::new(s, &self.config.filter.noise))
            .collect::<Result<Vec<_>, _>>()?;
        for sensor in &sensors {
            if sensor.period_us < sim.step_us {
                warn!(
                    "{} rate exceeds the truth step; readings will be limited to one per {} us",
                    sensor.kind, sim.step_us
                );
            }
        }

        let end_us = (sim.duration_s * US_PER_S).round() as u64;
        let mut truth = CtrvState::new(initial_truth(target), StateCovariance::zeros(), 0);
        let mut records = Vec::new();

        loop {
            let now = truth.last_update_timestamp;
            for sensor in sensors.iter_mut() {
                if now < sensor.next_due {
                    continue;
                }
                records.push(MeasurementRecord {
                    message: self.observe(sensor, &truth.vector, now, rng),
                    ground_truth: Some(truth.to_cartesian()),
                });
                while sensor.next_due <= now {
                    sensor.next_due += sensor.period_us;
                }
            }

            if now >= end_us {
                break;
            }
            let next = (now + sim.step_us).min(end_us);
            let mut point = AugmentedVector::zeros();
            point.fixed_rows_mut::<N_X>(0).copy_from(&truth.vector);
            point[N_X] = accel.sample(&mut rng.0);
            point[N_X + 1] = yaw_accel.sample(&mut rng.0);
            truth.vector = self.dynamics.propagate(&point, elapsed_seconds(now, next));
            truth.last_update_timestamp = next;
        }

        info!(
            "Generated {} measurements over {:.1} s",
            records.len(),
            sim.duration_s
        );
        Ok(records)
    }

    fn observe(
        &self,
        sensor: &SimulatedSensor,
        truth: &StateVector,
        timestamp: Timestamp,
        rng: &mut SimulationRng,
    ) -> MeasurementMessage {
        match sensor.kind {
            SensorKind::Lidar => {
                let ideal = self.lidar.predict_measurement(truth);
                let z = sample_into(ideal, &sensor.noise, rng);
                MeasurementMessage::lidar(z[0], z[1], timestamp)
            }
            SensorKind::Radar => {
                let ideal = self.radar.predict_measurement(truth);
                let z = sample_into(ideal, &sensor.noise, rng);
                // Range noise that dips below zero pins the reading to the origin.
                let message = MeasurementMessage::radar(
                    z[0].max(0.0),
                    normalize_angle(z[BEARING_IDX]),
                    z[2],
                    timestamp,
                );
                debug!("radar reading at {} us: {:?}", timestamp, message.data);
                message
            }
        }
    }
}

fn initial_truth(target: &TargetConfig) -> StateVector {
    StateVector::new(target.px, target.py, target.v, target.yaw, target.yaw_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tracklet_core::messages::MeasurementData;

    fn seeded_config(seed: u64) -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config.simulation.seed = Some(seed);
        config.simulation.duration_s = 2.0;
        config
    }

    fn generate(config: ScenarioConfig) -> Vec<MeasurementRecord> {
        let mut rng = SimulationRng::from_seed(config.simulation.seed);
        ScenarioGenerator::new(config).unwrap().generate(&mut rng).unwrap()
    }

    #[test]
    fn test_same_seed_same_log() {
        assert_eq!(generate(seeded_config(11)), generate(seeded_config(11)));
        assert_ne!(generate(seeded_config(11)), generate(seeded_config(12)));
    }

    #[test]
    fn test_schedule_interleaves_sensors_in_time_order() {
        let records = generate(seeded_config(3));
        // 20 Hz lidar from t=0 and 20 Hz radar from t=25 ms over 2 s.
        let lidar = records.iter().filter(|r| r.message.sensor() == SensorKind::Lidar).count();
        let radar = records.iter().filter(|r| r.message.sensor() == SensorKind::Radar).count();
        assert_eq!(lidar, 41);
        assert_eq!(radar, 40);
        assert!(records
            .windows(2)
            .all(|w| w[0].message.timestamp < w[1].message.timestamp));
        assert_eq!(records[0].message.sensor(), SensorKind::Lidar);
        assert_eq!(records[1].message.timestamp, 25_000);
    }

    #[test]
    fn test_noise_free_target_follows_straight_line() {
        let mut config = seeded_config(5);
        config.target = TargetConfig {
            px: 1.0,
            py: 0.0,
            v: 2.0,
            yaw: 0.0,
            yaw_rate: 0.0,
            std_a: 0.0,
            std_yawdd: 0.0,
        };
        let records = generate(config);
        for record in &records {
            let t = record.message.timestamp as f64 / US_PER_S;
            let gt = record.ground_truth.unwrap();
            assert_abs_diff_eq!(gt[0], 1.0 + 2.0 * t, epsilon = 1e-9);
            assert_abs_diff_eq!(gt[1], 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(gt[2], 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_readings_stay_close_to_truth() {
        let records = generate(seeded_config(9));
        for record in &records {
            let gt = record.ground_truth.unwrap();
            match record.message.data {
                MeasurementData::Lidar(z) => {
                    // 0.15 m noise; 10 sigma is never reached with a fixed seed.
                    assert!((z[0] - gt[0]).abs() < 1.5);
                    assert!((z[1] - gt[1]).abs() < 1.5);
                }
                MeasurementData::Radar(z) => {
                    assert!(z[0] >= 0.0);
                    assert!(z[1] > -std::f64::consts::PI && z[1] <= std::f64::consts::PI);
                    assert!((z[0] - gt[0].hypot(gt[1])).abs() < 3.0);
                }
            }
        }
    }

    #[test]
    fn test_radar_range_never_negative_at_origin() {
        let mut config = seeded_config(21);
        config.target = TargetConfig {
            px: 0.0,
            py: 0.0,
            v: 0.0,
            yaw: 0.0,
            yaw_rate: 0.0,
            std_a: 0.0,
            std_yawdd: 0.0,
        };
        let ranges: Vec<f64> = generate(config)
            .iter()
            .filter_map(|r| match r.message.data {
                MeasurementData::Radar(z) => Some(z[0]),
                MeasurementData::Lidar(_) => None,
            })
            .collect();
        assert_eq!(ranges.len(), 40);
        assert!(ranges.iter().all(|&range| range >= 0.0));
        // Roughly half of the zero-mean draws fall below zero and are clamped.
        assert!(ranges.iter().any(|&range| range == 0.0));
        assert!(ranges.iter().any(|&range| range > 0.0));
    }

    #[test]
    fn test_negative_target_noise_is_rejected() {
        let mut config = seeded_config(1);
        config.target.std_a = -1.0;
        assert!(matches!(
            ScenarioGenerator::new(config),
            Err(SimError::InvalidScenario(_))
        ));
    }
}
