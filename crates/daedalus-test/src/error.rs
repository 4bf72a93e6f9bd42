//! Test error types.

use daedalus_core::DaedalusError;
use thiserror::Error;

/// Errors that can occur while building fixtures or running them.
#[derive(Debug, Error)]
pub enum TestError {
    /// A fixture could not be turned into a document.
    #[error("Fixture error: {0}")]
    Fixture(String),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Simulation, validation or code generation failed.
    #[error("Engine error: {0}")]
    Engine(#[from] DaedalusError),
}

impl TestError {
    /// Creates a fixture error.
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture(message.into())
    }
}
