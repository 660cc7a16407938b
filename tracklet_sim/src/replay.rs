// tracklet_sim/src/replay.rs

//! Drives an estimator through a measurement log and scores the result.

use nalgebra::Vector4;
use tracing::{info, warn};
use tracklet_core::estimation::{ProcessOutcome, StateEstimator};
use tracklet_core::evaluation::calculate_rmse;
use tracklet_core::messages::SensorKind;
use tracklet_core::state;
use tracklet_core::types::{StateVector, Timestamp};

use crate::ingest::MeasurementRecord;

/// The filter's belief right after one measurement was consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateRecord {
    pub timestamp_us: Timestamp,
    pub sensor: SensorKind,
    pub state: StateVector,
    /// Only present when the measurement produced a correction.
    pub nis: Option<f64>,
    pub ground_truth: Option<Vector4<f64>>,
}

impl EstimateRecord {
    /// The estimate as `[px, py, vx, vy]`.
    pub fn cartesian(&self) -> Vector4<f64> {
        state::cartesian(&self.state)
    }
}

/// Running NIS consistency statistics for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NisStats {
    pub count: usize,
    pub sum: f64,
    pub above_95: usize,
}

impl NisStats {
    pub fn push(&mut self, nis: f64, threshold: f64) {
        self.count += 1;
        self.sum += nis;
        if nis > threshold {
            self.above_95 += 1;
        }
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Share of updates whose NIS exceeded the 95% chi-square bound. A
    /// consistent filter sits near 0.05.
    pub fn fraction_above_95(&self) -> Option<f64> {
        (self.count > 0).then(|| self.above_95 as f64 / self.count as f64)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub estimates: Vec<EstimateRecord>,
    /// `None` when no measurement carried ground truth.
    pub rmse: Option<Vector4<f64>>,
    pub nis_lidar: NisStats,
    pub nis_radar: NisStats,
    /// Measurements the estimator refused.
    pub rejected: usize,
}

impl RunReport {
    pub fn nis(&self, sensor: SensorKind) -> &NisStats {
        match sensor {
            SensorKind::Lidar => &self.nis_lidar,
            SensorKind::Radar => &self.nis_radar,
        }
    }

    pub fn log_summary(&self, label: &str) {
        info!(
            "[{}] {} estimates, {} rejected measurements",
            label,
            self.estimates.len(),
            self.rejected
        );
        match self.rmse {
            Some(rmse) => info!(
                "[{}] RMSE px={:.4} py={:.4} vx={:.4} vy={:.4}",
                label, rmse[0], rmse[1], rmse[2], rmse[3]
            ),
            None => info!("[{}] no ground truth, RMSE not computed", label),
        }
        for sensor in [SensorKind::Lidar, SensorKind::Radar] {
            let stats = self.nis(sensor);
            if let (Some(mean), Some(frac)) = (stats.mean(), stats.fraction_above_95()) {
                info!(
                    "[{}] {} NIS: {} updates, mean {:.3}, {:.1}% above {:.3}",
                    label,
                    sensor,
                    stats.count,
                    mean,
                    100.0 * frac,
                    sensor.nis_threshold_95()
                );
            }
        }
    }
}

/// Feeds every record to `estimator` in order.
///
/// A rejected measurement is counted and skipped; the estimator keeps its
/// last good belief and the run continues.
pub fn run<E: StateEstimator + ?Sized>(
    estimator: &mut E,
    records: &[MeasurementRecord],
) -> RunReport {
    let mut report = RunReport::default();

    for record in records {
        let message = &record.message;
        let nis = match estimator.process(message) {
            Ok(ProcessOutcome::Updated { sensor, nis }) => {
                let stats = match sensor {
                    SensorKind::Lidar => &mut report.nis_lidar,
                    SensorKind::Radar => &mut report.nis_radar,
                };
                stats.push(nis, sensor.nis_threshold_95());
                Some(nis)
            }
            Ok(ProcessOutcome::Initialized | ProcessOutcome::Predicted) => None,
            Err(_) => {
                report.rejected += 1;
                continue;
            }
        };

        report.estimates.push(EstimateRecord {
            timestamp_us: message.timestamp,
            sensor: message.sensor(),
            state: estimator.get_state().vector,
            nis,
            ground_truth: record.ground_truth,
        });
    }

    let (estimated, truth): (Vec<_>, Vec<_>) = report
        .estimates
        .iter()
        .filter_map(|e| e.ground_truth.map(|gt| (e.cartesian(), gt)))
        .unzip();
    if truth.is_empty() {
        warn!("No ground truth in the log; skipping RMSE");
    } else {
        report.rmse = Some(calculate_rmse(&estimated, &truth));
    }

    report
}
