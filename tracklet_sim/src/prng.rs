// tracklet_sim/src/prng.rs

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// A newtype wrapper around `ChaCha8Rng`.
/// This is the central, deterministic pseudo-random number generator for the simulation.
pub struct SimulationRng(pub ChaCha8Rng);

impl SimulationRng {
    /// Seeds from `seed`, or from fresh entropy when none is given. The seed
    /// in use is always logged so a run can be reproduced.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        info!("Simulation RNG seed: {}", seed);
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}
