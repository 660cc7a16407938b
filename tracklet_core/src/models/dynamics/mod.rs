// tracklet_core/src/models/dynamics/mod.rs

//! Process models used to propagate sigma points between measurements.

pub mod ctrv;
