//! Error types for the fiber tracker simulation.

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised by the simulation core.
///
/// Configuration errors are fatal for a run. Sampling failures and
/// out-of-domain inputs are raised per photon or per fiber and are absorbed
/// by the event driver, which counts them in the event record.
#[derive(Debug, Error)]
pub enum SimError {
    /// Missing or invalid geometry, detector or distribution parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The rejection sampler ran out of candidates before accepting one.
    #[error("rejection sampling gave up after {attempts} attempts on [{low}, {high}]")]
    SamplingFailure {
        attempts: usize,
        low: f64,
        high: f64,
    },

    /// A bucket key fell outside every configured bucket.
    #[error("{quantity} = {value} is outside every configured bucket")]
    OutOfDomain { quantity: &'static str, value: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
