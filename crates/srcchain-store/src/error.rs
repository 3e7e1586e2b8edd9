/// Errors from source chain operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The chain was assembled with an invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A key or value could not be converted between layer types.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Failure reported by a backing store. Layers pass it through unchanged.
    #[error("backend error: {0}")]
    Backend(String),

    /// An internal lock was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl SourceError {
    /// Shorthand for a [`SourceError::Serialization`] built from any error.
    pub fn serialization(err: impl std::fmt::Display) -> Self {
        Self::Serialization(err.to_string())
    }

    pub(crate) fn poisoned(err: impl std::fmt::Display) -> Self {
        Self::LockPoisoned(err.to_string())
    }
}

/// Result alias for source operations.
pub type SourceResult<T> = Result<T, SourceError>;
