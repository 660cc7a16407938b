// tracklet_sim/src/prelude.rs

// Re-export the entire tracklet_core prelude so the filter types are at hand.
pub use tracklet_core::prelude::*;

// Re-export common simulation-specific types for easy access.
pub use crate::config::{ScenarioConfig, SensorConfig, Simulation, TargetConfig};
pub use crate::error::SimError;
pub use crate::ingest::MeasurementRecord;
pub use crate::prng::SimulationRng;
pub use crate::replay::{EstimateRecord, NisStats, RunReport};
