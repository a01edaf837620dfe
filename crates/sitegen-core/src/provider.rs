//! Generation collaborator interfaces
//!
//! Providers are constructed once at startup and injected as
//! `Arc<dyn LlmProvider>` / `Arc<dyn ImageProvider>`; concrete HTTP clients
//! live outside this crate.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use sitegen_asset::{ContentType, ImageDirective};
use std::fmt::Debug;

/// Provider error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("stream interrupted: {0}")]
    Stream(String),

    #[error("timeout after {0}ms")]
    Timeout(u64),
}

impl ProviderError {
    /// Whether the failure is likely to clear on its own
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::RateLimited { .. } | Self::Stream(_) | Self::Timeout(_)
        )
    }
}

/// Text chunks as produced by the model
pub type TextStream = BoxStream<'static, Result<String, ProviderError>>;

/// Image bytes as produced by the image model
pub type ByteStream = BoxStream<'static, Result<Bytes, ProviderError>>;

/// Image attached to a generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptImage {
    /// Stable image id
    pub id: String,
    /// MIME type of `data`
    pub media_type: String,
    /// Raw image bytes
    pub data: Bytes,
}

/// One text generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Requested asset type
    pub content_type: ContentType,
    /// Language tag the output must be fenced with
    pub fence_tag: String,
    /// System prompt parts
    pub system_parts: Vec<String>,
    /// Rendered `<file>` excerpts of previously generated assets
    pub prior_assets: Vec<String>,
    /// Rendered `<context>` entries of imported URLs
    pub imported_context: Vec<String>,
    /// User turn
    pub user_prompt: String,
    /// Reference images
    pub images: Vec<PromptImage>,
}

impl GenerationRequest {
    /// System prompt parts joined with newlines
    #[must_use]
    pub fn system_text(&self) -> String {
        self.system_parts.join("\n")
    }
}

/// Text generation collaborator
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Start a streaming generation
    async fn generate(&self, request: GenerationRequest) -> Result<TextStream, ProviderError>;
}

/// Image generation collaborator
#[async_trait]
pub trait ImageProvider: Send + Sync + Debug {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Start a streaming image generation at `(width, height)`
    async fn generate_image(&self, directive: &ImageDirective, size: (u32, u32)) -> Result<ByteStream, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_display() {
        let err = ProviderError::RateLimited { retry_after_ms: 5000 };
        assert!(err.to_string().contains("5000"));
        assert!(err.is_transient());
        assert!(!ProviderError::InvalidResponse("x".into()).is_transient());
    }
}
