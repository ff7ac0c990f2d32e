//! Errors surfaced by the cave generators.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The configuration cannot produce a cave; nothing was generated.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A generation run is already in flight on this generator.
    #[error("a generation run is already in progress")]
    ReentrantCallRejected,

    /// The generator gave up after its retry or step budget.
    #[error("generation gave up after {attempts} attempts")]
    GenerationExhausted { attempts: usize },
}

pub type Result<T> = std::result::Result<T, GenerationError>;

impl GenerationError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        GenerationError::InvalidConfiguration(message.into())
    }
}
