//! Generated asset values
//!
//! A [`GeneratedAsset`] is the value half of a cache line: the bytes produced
//! for one path plus their content type and creation time.

use crate::content_type::{mime_for_path, ContentType};
use crate::hash::ContentHash;
use crate::path::AssetPath;
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Immutable generated asset
///
/// # Invariants
/// - `hash` is always `ContentHash::compute(&body)`
/// - Never mutated after construction; cheap to clone (`Bytes` is refcounted)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAsset {
    content_type: ContentType,
    mime: &'static str,
    body: Bytes,
    hash: ContentHash,
    created_at: DateTime<Utc>,
}

impl GeneratedAsset {
    /// Create asset for a path, timestamped now
    #[must_use]
    pub fn new(path: &AssetPath, body: impl Into<Bytes>) -> Self {
        Self::with_timestamp(path, body, Utc::now())
    }

    /// Create asset with an explicit creation time
    #[must_use]
    pub fn with_timestamp(path: &AssetPath, body: impl Into<Bytes>, created_at: DateTime<Utc>) -> Self {
        let body = body.into();
        Self {
            content_type: path.content_type(),
            mime: mime_for_path(path),
            hash: ContentHash::compute(&body),
            body,
            created_at,
        }
    }

    /// Content type
    #[inline]
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// MIME type for the response header
    #[inline]
    #[must_use]
    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text, if it is text
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        if self.content_type.is_text() {
            std::str::from_utf8(&self.body).ok()
        } else {
            None
        }
    }

    /// Content hash of the body
    #[inline]
    #[must_use]
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Creation time
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Body length in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Verify integrity
    #[inline]
    #[must_use]
    pub fn verify(&self) -> bool {
        self.hash == ContentHash::compute(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_derives_type_and_mime_from_path() {
        let path = AssetPath::parse("/site.css").unwrap();
        let asset = GeneratedAsset::new(&path, "body{}");
        assert_eq!(asset.content_type(), ContentType::Css);
        assert_eq!(asset.mime(), "text/css");
        assert_eq!(asset.text(), Some("body{}"));
        assert!(asset.verify());
    }

    #[test]
    fn binary_asset_has_no_text() {
        let path = AssetPath::parse("/hero.png").unwrap();
        let asset = GeneratedAsset::new(&path, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(asset.content_type(), ContentType::Image);
        assert_eq!(asset.text(), None);
        assert_eq!(asset.len(), 4);
    }

    #[test]
    fn clone_shares_body() {
        let path = AssetPath::parse("/index.html").unwrap();
        let asset = GeneratedAsset::new(&path, "<p>hi</p>");
        let cloned = asset.clone();
        assert_eq!(asset.hash(), cloned.hash());
        assert_eq!(asset.body().as_ptr(), cloned.body().as_ptr());
    }
}
