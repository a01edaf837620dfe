//! Request paths for addressing assets within a site
//!
//! Provides [`AssetPath`], the normalized URL path used as the third component
//! of every cache key and as the key of recorded image directives.

use crate::content_type::{ContentType, MEDIA_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Normalized asset path within a site
///
/// Always starts with `/`, never carries a query string or fragment, and never
/// contains `.` / `..` / empty segments (`/` alone is the site root).
///
/// # Examples
/// - `index.html` → `/index.html`
/// - `/css/site.css?v=2` → `/css/site.css`
/// - `/a//b` → rejected
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetPath(String);

impl AssetPath {
    /// Site root (`/`)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse and normalize a raw request path
    ///
    /// # Errors
    /// Returns error on traversal segments, empty segments or control characters
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let end = raw.find(['?', '#']).unwrap_or(raw.len());
        let trimmed = raw[..end].trim();

        if trimmed.chars().any(char::is_control) {
            return Err(PathError::InvalidCharacter(trimmed.to_string()));
        }

        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
        if body.is_empty() {
            return Ok(Self::root());
        }

        // A single trailing slash is tolerated (directory style URLs)
        let body = body.strip_suffix('/').unwrap_or(body);
        for segment in body.split('/') {
            match segment {
                "" => return Err(PathError::EmptySegment(trimmed.to_string())),
                "." | ".." => return Err(PathError::Traversal(trimmed.to_string())),
                _ => {}
            }
        }

        Ok(Self(format!("/{body}")))
    }

    /// Path as string (with leading slash)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path without the leading slash
    #[inline]
    #[must_use]
    pub fn relative(&self) -> &str {
        &self.0[1..]
    }

    /// Whether this is the site root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path segments from root to leaf
    #[inline]
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.relative().split('/').filter(|s| !s.is_empty())
    }

    /// Last segment (file name), if not root
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Lowercased extension of the file name, without the dot
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Whether the path names a media (binary) file
    #[must_use]
    pub fn is_media(&self) -> bool {
        self.extension()
            .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Content type implied by the extension
    #[inline]
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        ContentType::from_path(self)
    }
}

impl Default for AssetPath {
    fn default() -> Self {
        Self::root()
    }
}

impl Display for AssetPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AssetPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssetPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssetPath> for String {
    fn from(path: AssetPath) -> Self {
        path.0
    }
}

impl AsRef<str> for AssetPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors related to asset paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path (`//`)
    #[error("path contains empty segment: '{0}'")]
    EmptySegment(String),

    /// `.` or `..` segment
    #[error("path traversal is not allowed: '{0}'")]
    Traversal(String),

    /// Control characters in path
    #[error("path contains invalid characters: '{0:?}'")]
    InvalidCharacter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_adds_leading_slash() {
        let path = AssetPath::parse("hero.jpg").unwrap();
        assert_eq!(path.as_str(), "/hero.jpg");
        assert_eq!(path.relative(), "hero.jpg");
    }

    #[test]
    fn path_strips_query_and_fragment() {
        assert_eq!(AssetPath::parse("/css/site.css?v=2").unwrap().as_str(), "/css/site.css");
        assert_eq!(AssetPath::parse("/about#team").unwrap().as_str(), "/about");
    }

    #[test]
    fn path_root_forms() {
        assert!(AssetPath::parse("").unwrap().is_root());
        assert!(AssetPath::parse("/").unwrap().is_root());
        assert!(AssetPath::parse("/?q=1").unwrap().is_root());
        assert_eq!(AssetPath::root().file_name(), None);
    }

    #[test]
    fn path_trailing_slash_tolerated() {
        assert_eq!(AssetPath::parse("/blog/").unwrap().as_str(), "/blog");
    }

    #[test]
    fn path_rejects_traversal_and_empty_segments() {
        assert!(matches!(AssetPath::parse("/../etc/passwd"), Err(PathError::Traversal(_))));
        assert!(matches!(AssetPath::parse("/a/./b"), Err(PathError::Traversal(_))));
        assert!(matches!(AssetPath::parse("/a//b"), Err(PathError::EmptySegment(_))));
        assert!(matches!(AssetPath::parse("/a\nb"), Err(PathError::InvalidCharacter(_))));
    }

    #[test]
    fn path_extension_is_lowercased() {
        assert_eq!(AssetPath::parse("/IMG/Hero.JPG").unwrap().extension().as_deref(), Some("jpg"));
        assert_eq!(AssetPath::parse("/about").unwrap().extension(), None);
        assert_eq!(AssetPath::parse("/.hidden").unwrap().extension(), None);
    }

    #[test]
    fn path_media_detection() {
        assert!(AssetPath::parse("/hero.jpg").unwrap().is_media());
        assert!(AssetPath::parse("/intro.mp4").unwrap().is_media());
        assert!(!AssetPath::parse("/index.html").unwrap().is_media());
        assert!(!AssetPath::parse("/app.js").unwrap().is_media());
    }

    #[test]
    fn path_serde_roundtrip_normalizes() {
        let path: AssetPath = serde_json::from_str("\"hero.jpg\"").unwrap();
        assert_eq!(path.as_str(), "/hero.jpg");
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"/hero.jpg\"");
        assert!(serde_json::from_str::<AssetPath>("\"/../x\"").is_err());
    }
}
