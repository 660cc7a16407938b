// tracklet_sim/src/lib.rs

// Everything that touches the outside world lives here: files, CLI, config,
// synthetic data. The filter itself stays in `tracklet_core`.

// This prelude is for convenience for the binary and the integration tests.
pub mod prelude;

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod prng;
pub mod replay;
pub mod scenario;
