//! Cache error types

/// Errors from the asset cache
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Backing store could not serve the request
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    /// Backing store rejected a bulk invalidation
    #[error("cache invalidation failed: {0}")]
    Invalidation(String),
}

impl CacheError {
    /// Create unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
