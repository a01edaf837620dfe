//! Error types for sitegen core
//!
//! [`GenerationError`] is what the request pipeline hands to the HTTP
//! boundary. Each variant maps to a suggested status code; nothing is retried
//! automatically.

use crate::phase::GenerationPhase;
use crate::provider::ProviderError;
use sitegen_asset::{AssetPath, PathError, TenantId};
use sitegen_cache::CacheError;
use sitegen_stream::StreamError;
use sitegen_tenant::TenantError;

/// Pipeline-level error
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Host does not route to any tenant
    #[error("site not found for host: {0}")]
    TenantNotFound(String),

    /// Image requested with no recorded directive for its path
    #[error("no image context for {path} on {tenant}")]
    NoImageContext {
        /// Requesting tenant
        tenant: TenantId,
        /// Image path
        path: AssetPath,
    },

    /// Path names a media type the generator cannot produce
    #[error("unsupported content type for {0}")]
    UnsupportedContentType(AssetPath),

    /// Request path rejected
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// Model output had no usable fenced block
    #[error("extraction failed: {0}")]
    Extraction(#[from] StreamError),

    /// Provider call or stream failed
    #[error("provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// Tenant store rejected or could not serve a request
    #[error("tenant store error: {0}")]
    Tenant(#[from] TenantError),

    /// Cache backend failure
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Illegal phase transition
    #[error("illegal phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: GenerationPhase,
        to: GenerationPhase,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl GenerationError {
    /// Create missing-image-context error
    pub fn no_image_context(tenant: &TenantId, path: &AssetPath) -> Self {
        Self::NoImageContext {
            tenant: tenant.clone(),
            path: path.clone(),
        }
    }

    /// Check if error means "nothing here"
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::TenantNotFound(_) | Self::NoImageContext { .. } => true,
            Self::Tenant(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Check if the same request might succeed later
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_transient(),
            Self::Cache(_) | Self::Extraction(_) => true,
            Self::Tenant(e) => matches!(e, TenantError::Unavailable(_)),
            _ => false,
        }
    }

    /// Suggested HTTP status code
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::TenantNotFound(_) | Self::NoImageContext { .. } => 404,
            Self::UnsupportedContentType(_) => 415,
            Self::InvalidPath(_) => 400,
            Self::Extraction(_) | Self::Provider(_) => 502,
            Self::Tenant(e) if e.is_not_found() => 404,
            Self::Tenant(e) if e.is_conflict() => 409,
            Self::Tenant(TenantError::InvalidHost(_)) => 400,
            Self::Tenant(TenantError::Unauthorized { .. }) => 403,
            Self::Tenant(_) | Self::Cache(_) | Self::InvalidTransition { .. } | Self::Config(_) => 500,
        }
    }
}
