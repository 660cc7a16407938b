// tracklet_sim/src/error.rs

use thiserror::Error;
use tracklet_core::error::FilterError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A measurement log line could not be understood. `line` is 1-based.
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}
