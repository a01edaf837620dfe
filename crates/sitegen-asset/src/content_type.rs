//! Asset content types
//!
//! Classifies request paths into the content types the generator knows how to
//! produce, and maps extensions to MIME types.

use crate::path::AssetPath;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Extensions treated as media (binary) files
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "ico", "svg", "mp4", "webm", "ogg", "mp3", "wav",
];

/// Media extensions that the image collaborator can synthesize
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Kind of asset produced for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// HTML document (default for extensionless paths)
    Html,
    /// Stylesheet
    Css,
    /// Script
    Js,
    /// Raster image synthesized from a recorded directive
    Image,
    /// Any other media file (audio, video, icons, vector art)
    Media,
}

impl ContentType {
    /// Classify a path by its extension
    #[must_use]
    pub fn from_path(path: &AssetPath) -> Self {
        match path.extension().as_deref() {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Self::Image,
            Some(ext) if MEDIA_EXTENSIONS.contains(&ext) => Self::Media,
            Some("css") => Self::Css,
            Some("js") => Self::Js,
            _ => Self::Html,
        }
    }

    /// Fence tag the model is asked to wrap its output in
    ///
    /// `None` for binary types, which never go through the text provider.
    #[inline]
    #[must_use]
    pub const fn fence_tag(self) -> Option<&'static str> {
        match self {
            Self::Html => Some("html"),
            Self::Css => Some("css"),
            Self::Js => Some("js"),
            Self::Image | Self::Media => None,
        }
    }

    /// Whether the asset body is text that can be fed back as context
    #[inline]
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Html | Self::Css | Self::Js)
    }

    /// Whether generated output may embed image directives
    #[inline]
    #[must_use]
    pub const fn embeds_directives(self) -> bool {
        matches!(self, Self::Html)
    }

    /// Lowercase name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Css => "css",
            Self::Js => "js",
            Self::Image => "image",
            Self::Media => "media",
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MIME type for a path, defaulting to `text/html`
#[must_use]
pub fn mime_for_path(path: &AssetPath) -> &'static str {
    match path.extension().as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("svg") => "image/svg+xml",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg") => "video/ogg",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        _ => "text/html",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> AssetPath {
        AssetPath::parse(s).unwrap()
    }

    #[test]
    fn classification_by_extension() {
        assert_eq!(ContentType::from_path(&path("/index.html")), ContentType::Html);
        assert_eq!(ContentType::from_path(&path("/about")), ContentType::Html);
        assert_eq!(ContentType::from_path(&path("/")), ContentType::Html);
        assert_eq!(ContentType::from_path(&path("/notes.txt")), ContentType::Html);
        assert_eq!(ContentType::from_path(&path("/site.CSS")), ContentType::Css);
        assert_eq!(ContentType::from_path(&path("/app.js")), ContentType::Js);
        assert_eq!(ContentType::from_path(&path("/hero.jpeg")), ContentType::Image);
        assert_eq!(ContentType::from_path(&path("/logo.svg")), ContentType::Media);
        assert_eq!(ContentType::from_path(&path("/theme.mp3")), ContentType::Media);
    }

    #[test]
    fn fence_tags_only_for_text() {
        assert_eq!(ContentType::Html.fence_tag(), Some("html"));
        assert_eq!(ContentType::Js.fence_tag(), Some("js"));
        assert_eq!(ContentType::Image.fence_tag(), None);
        assert!(!ContentType::Media.is_text());
        assert!(ContentType::Html.embeds_directives());
        assert!(!ContentType::Css.embeds_directives());
    }

    #[test]
    fn mime_mapping() {
        assert_eq!(mime_for_path(&path("/a.jpg")), "image/jpeg");
        assert_eq!(mime_for_path(&path("/a.js")), "application/javascript");
        assert_eq!(mime_for_path(&path("/a.wav")), "audio/wav");
        assert_eq!(mime_for_path(&path("/a")), "text/html");
    }
}
