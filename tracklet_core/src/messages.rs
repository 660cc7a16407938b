use crate::types::Timestamp;
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

// =========================================================================
// == Sensor Identification ==
// =========================================================================

/// The two sensor modalities the filter knows how to fuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Linear positional sensor reporting `[px, py]`.
    Lidar,
    /// Nonlinear sensor reporting `[range, bearing, range_rate]`.
    Radar,
}

impl SensorKind {
    /// Number of readings a measurement of this kind carries.
    pub fn measurement_dim(self) -> usize {
        match self {
            SensorKind::Lidar => crate::types::N_Z_LIDAR,
            SensorKind::Radar => crate::types::N_Z_RADAR,
        }
    }

    /// 95% chi-square threshold for the NIS of this sensor's measurement dimension.
    pub fn nis_threshold_95(self) -> f64 {
        match self {
            SensorKind::Lidar => 5.991,
            SensorKind::Radar => 7.815,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Lidar => write!(f, "lidar"),
            SensorKind::Radar => write!(f, "radar"),
        }
    }
}

// =========================================================================
// == Core Message and Data Enums ==
// =========================================================================

/// A self-describing container for raw sensor readings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeasurementData {
    /// `[px, py]` in meters.
    Lidar(Vector2<f64>),
    /// `[range (m), bearing (rad), range_rate (m/s)]`.
    Radar(Vector3<f64>),
}

impl MeasurementData {
    pub fn kind(&self) -> SensorKind {
        match self {
            MeasurementData::Lidar(_) => SensorKind::Lidar,
            MeasurementData::Radar(_) => SensorKind::Radar,
        }
    }
}

/// The message that carries one observation into the filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasurementMessage {
    /// Time of the observation in microseconds. Must be non-decreasing per filter.
    pub timestamp: Timestamp,
    pub data: MeasurementData,
}

impl MeasurementMessage {
    pub fn lidar(px: f64, py: f64, timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            data: MeasurementData::Lidar(Vector2::new(px, py)),
        }
    }

    pub fn radar(range: f64, bearing: f64, range_rate: f64, timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            data: MeasurementData::Radar(Vector3::new(range, bearing, range_rate)),
        }
    }

    pub fn sensor(&self) -> SensorKind {
        self.data.kind()
    }
}
