//! Core types for sitegen
//!
//! Configuration and the values handed across the HTTP boundary.

mod config;

pub use config::GeneratorConfig;

use bytes::Bytes;
use sitegen_asset::{ContentHash, ContentType, GeneratedAsset, VersionToken};

/// Asset ready to be served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Classified content type
    pub content_type: ContentType,
    /// MIME type for the `Content-Type` header
    pub mime: &'static str,
    /// Asset bytes
    pub body: Bytes,
    /// Hash of `body`, used for the `ETag`
    pub hash: ContentHash,
    /// Version the asset was generated under
    pub version: VersionToken,
    /// Served from cache without generation
    pub cache_hit: bool,
}

impl ResolvedAsset {
    /// Build from a generated asset
    #[must_use]
    pub fn from_asset(asset: &GeneratedAsset, version: VersionToken, cache_hit: bool) -> Self {
        Self {
            content_type: asset.content_type(),
            mime: asset.mime(),
            body: asset.body().clone(),
            hash: *asset.hash(),
            version,
            cache_hit,
        }
    }

    /// Entity tag for the response
    #[inline]
    #[must_use]
    pub fn etag(&self) -> String {
        self.hash.etag()
    }

    /// Body as UTF-8 text, if it is text
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        if self.content_type.is_text() {
            std::str::from_utf8(&self.body).ok()
        } else {
            None
        }
    }
}
