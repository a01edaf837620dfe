//! Image generation directives
//!
//! Structured "generate this image" requests discovered in generated markup
//! and recorded per (tenant, path) for later synthesis.

use crate::path::AssetPath;
use serde::{Deserialize, Serialize};

/// Image generation directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDirective {
    /// Description of the image to generate
    pub prompt: String,
    /// Alt text of the embedding tag
    pub alt: String,
    /// Path the image will be requested at
    pub path: AssetPath,
    /// Optional style hint (photo, illustration, watercolor, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Optional width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Optional height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageDirective {
    /// Create directive with required fields
    #[must_use]
    pub fn new(prompt: impl Into<String>, alt: impl Into<String>, path: AssetPath) -> Self {
        Self {
            prompt: prompt.into(),
            alt: alt.into(),
            path,
            style: None,
            width: None,
            height: None,
        }
    }

    /// With style hint
    #[inline]
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// With explicit dimensions
    #[inline]
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Dimensions, falling back to `default` for missing values
    #[inline]
    #[must_use]
    pub fn dimensions_or(&self, default: (u32, u32)) -> (u32, u32) {
        (self.width.unwrap_or(default.0), self.height.unwrap_or(default.1))
    }

    /// Full text prompt for the image collaborator (prompt plus style)
    #[must_use]
    pub fn full_prompt(&self) -> String {
        match &self.style {
            Some(style) => format!("{} (style: {style})", self.prompt),
            None => self.prompt.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_fallback() {
        let path = AssetPath::parse("/hero.jpg").unwrap();
        let directive = ImageDirective::new("a hero", "hero", path.clone());
        assert_eq!(directive.dimensions_or((512, 512)), (512, 512));

        let sized = directive.with_size(800, 600);
        assert_eq!(sized.dimensions_or((512, 512)), (800, 600));
    }

    #[test]
    fn full_prompt_includes_style() {
        let path = AssetPath::parse("/hero.jpg").unwrap();
        let directive = ImageDirective::new("a lighthouse", "lighthouse", path).with_style("watercolor");
        assert_eq!(directive.full_prompt(), "a lighthouse (style: watercolor)");
    }

    #[test]
    fn serde_omits_absent_options() {
        let path = AssetPath::parse("/hero.jpg").unwrap();
        let json = serde_json::to_string(&ImageDirective::new("p", "a", path)).unwrap();
        assert!(!json.contains("style"));
        let back: ImageDirective = serde_json::from_str(&json).unwrap();
        assert_eq!(back.path.as_str(), "/hero.jpg");
    }
}
