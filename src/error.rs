// Error taxonomy shared by the engine, the lifecycle controller and presets

use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required identity field (image, name or id) is missing.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The engine refused to create a container because the name is taken.
    #[error("container name already in use: {0}")]
    Conflict(String),

    /// The engine has no matching container.
    #[error("container not found: {0}")]
    NotFound(String),

    /// Readiness polling ran out of attempts.
    #[error("container {container} not ready after {waited:?}")]
    Timeout { container: String, waited: Duration },

    /// Malformed declarative input: port strings, preset documents, env values.
    #[error("configuration error: {0}")]
    Config(String),

    /// Any other engine failure, passed through unchanged.
    #[error("engine error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    pub fn transport(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Transport(source.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
