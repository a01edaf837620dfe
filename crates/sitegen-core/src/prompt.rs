//! Provider request construction
//!
//! Turns a tenant, a target path and its consistency context into a
//! [`GenerationRequest`].

use crate::context::ConsistencyContext;
use crate::provider::{GenerationRequest, PromptImage};
use chrono::NaiveDate;
use sitegen_asset::{AssetPath, ContentType};
use sitegen_stream::MARKER_ATTRIBUTE;
use sitegen_tenant::{ReferenceImage, Tenant};

const ROLE: &str = "You are an expert web developer that creates unique beautiful, fast, accessible web sites.

Your task will be create a website and ensure that the design is visually appealing, responsive, and user-friendly. The site's requirements be defined in a <prompt> tag.";

const CONSISTENCY: &str = "You MUST ensure that the site is consistent. To ensure consistency you MUST use the content of previous requests defined in <files>. Each <file> in <files> relates to a previous request and contains important content and context that should be used to generate your response.";

const IMPORTED: &str = "Use the extracted data from the imported URLs in a <context> tag. Each <context> tag represents a different URL that the user would like you to reference or include in the site.";

const NO_EXPLANATION: &str = "Don't explain your output, just return the required code.";

const RIGHTS: &str = "**The user has confirmed that they own all of the rights to the content and images used.**";

const CSS_RULES: &str = "Generate clean, modern (e.g use flex-box and grid), responsive CSS (mobile, desktop and tablet). Include light and dark mode. Use the uploaded images as color inspiration, layout design that is suitable for the provided HTML.";

const JS_RULES: &str = "Generate clean JavaScript code. Use modern ES6+ syntax. Ensure error handling and browser compatibility.";

/// Rules block for an HTML page
fn html_rules() -> String {
    format!(
        "+ Generate valid accessible semantic HTML5 markup
+ <meta name=\"generator\" content=\"sitegen\" />
+ Use the attached images to guide your layout and design choices.
+ The user may include a link to an image URL directly.
+ The user may ask you to generate or include an image without a URL. You MUST ALWAYS use the following image format: <img {MARKER_ATTRIBUTE}=\"true\" data-context=\"[description of the image to generate]\" data-style=\"[optional style: photo, illustration, watercolor, etc]\" data-width=\"[optional width in pixels]\" data-height=\"[optional height in pixels]\" alt=\"[descriptive alt text]\" src=\"/[descriptive-file-name-for-the-image].jpg\">. Never ever use the <img> tag without the {MARKER_ATTRIBUTE} attribute.
+ NEVER use the <img> tag with a src pointing an external URL that is not provided in the <prompt>
+ You MAY use inline CSS and <style> blocks, but you must keep all the page styles consistent.
+ You SHOULD prefer not to use JavaScript in the HTML content. If you need to include JavaScript, link to an external file with a descriptive name."
    )
}

/// Per-type rules, `None` for types the model never writes
#[must_use]
pub fn rules_for(content_type: ContentType) -> Option<String> {
    match content_type {
        ContentType::Html => Some(html_rules()),
        ContentType::Css => Some(CSS_RULES.to_string()),
        ContentType::Js => Some(JS_RULES.to_string()),
        ContentType::Image | ContentType::Media => None,
    }
}

/// Render one prior asset as a `<file>` entry
#[must_use]
pub fn render_file(path: &AssetPath, content: &str) -> String {
    format!("\t<file name=\"{path}\">{content}</file>")
}

/// Render one imported URL as a `<context>` entry
#[must_use]
pub fn render_context(url: &str, markdown: &str) -> String {
    format!("\t<context name=\"@url {url}\" url=\"{url}\">{markdown}</context>")
}

/// Builds provider requests
///
/// The dated line reads the clock on every call unless a date is pinned.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    pinned: Option<NaiveDate>,
}

impl PromptBuilder {
    /// Builder dated by the current UTC day
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with a fixed date
    #[inline]
    #[must_use]
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.pinned = Some(today);
        self
    }

    /// Date written into the next system prompt
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.pinned.unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    /// System prompt for `content_type` at `path`
    ///
    /// Returns `None` for image and media types.
    #[must_use]
    pub fn system_prompt(&self, content_type: ContentType, path: &AssetPath) -> Option<String> {
        let rules = rules_for(content_type)?;
        let upper = content_type.as_str().to_uppercase();
        let date = self.today().format("%a %b %d %Y");
        Some(format!(
            "{ROLE}

When creating an {upper} file for this site and you MUST ALWAYS follow these rules:

{rules}

Only output a single {upper} file for the path '{path}'.

{CONSISTENCY}

{IMPORTED}

{NO_EXPLANATION}

If you need to use the date, today's date is: {date}

{RIGHTS}"
        ))
    }

    /// User turn for `tenant` at `path`
    #[must_use]
    pub fn user_prompt(tenant: &Tenant, content_type: ContentType, path: &AssetPath) -> String {
        format!(
            "<prompt>{}</prompt>\n\nCreate a {} file for the path '{}' based on the content in <prompt>",
            tenant.prompt,
            content_type.as_str().to_uppercase(),
            path
        )
    }

    /// Full provider request, `None` when the type is not model-generated
    #[must_use]
    pub fn build(
        &self,
        tenant: &Tenant,
        path: &AssetPath,
        context: &ConsistencyContext,
        images: &[ReferenceImage],
    ) -> Option<GenerationRequest> {
        let content_type = path.content_type();
        let fence_tag = content_type.fence_tag()?;
        let system = self.system_prompt(content_type, path)?;

        Some(GenerationRequest {
            content_type,
            fence_tag: fence_tag.to_string(),
            system_parts: vec![system],
            prior_assets: context
                .siblings
                .iter()
                .map(|s| render_file(&s.path, &s.content))
                .collect(),
            imported_context: context
                .imported
                .iter()
                .map(|m| render_context(&m.url, &m.markdown))
                .collect(),
            user_prompt: Self::user_prompt(tenant, content_type, path),
            images: images
                .iter()
                .map(|img| PromptImage {
                    id: img.id.clone(),
                    media_type: img.media_type.clone(),
                    data: img.data.clone(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SiblingAsset;
    use sitegen_asset::TenantId;
    use sitegen_tenant::{ExtractedMarkdown, UserId};

    fn tenant() -> Tenant {
        Tenant::new(TenantId::parse("otters").unwrap(), UserId::new("u1"), "a fan site about otters")
    }

    fn builder() -> PromptBuilder {
        PromptBuilder::new().with_date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
    }

    #[test]
    fn html_system_prompt_carries_image_format() {
        let path = AssetPath::parse("/index.html").unwrap();
        let system = builder().system_prompt(ContentType::Html, &path).unwrap();
        assert!(system.contains("<img data-gen-image=\"true\" data-context="));
        assert!(system.contains("Only output a single HTML file for the path '/index.html'."));
        assert!(system.contains("today's date is: Tue Mar 05 2024"));
    }

    #[test]
    fn unpinned_builder_uses_current_day() {
        let before = chrono::Utc::now().date_naive();
        let system = PromptBuilder::new()
            .system_prompt(ContentType::Css, &AssetPath::parse("/site.css").unwrap())
            .unwrap();
        let after = chrono::Utc::now().date_naive();

        let dated = |d: NaiveDate| format!("today's date is: {}", d.format("%a %b %d %Y"));
        assert!(system.contains(&dated(before)) || system.contains(&dated(after)));
        assert_ne!(PromptBuilder::new().today(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(builder().today(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn no_prompt_for_images() {
        let path = AssetPath::parse("/hero.jpg").unwrap();
        assert!(builder().system_prompt(ContentType::Image, &path).is_none());
        let ctx = ConsistencyContext::default();
        assert!(builder().build(&tenant(), &path, &ctx, &[]).is_none());
    }

    #[test]
    fn request_renders_context() {
        let path = AssetPath::parse("/style.css").unwrap();
        let ctx = ConsistencyContext {
            siblings: vec![SiblingAsset {
                path: AssetPath::parse("/index.html").unwrap(),
                content: "<h1>Otters</h1>".into(),
                generated_at: chrono::Utc::now(),
            }],
            imported: vec![ExtractedMarkdown {
                url: "https://example.com".into(),
                markdown: "# Otters".into(),
            }],
        };

        let request = builder().build(&tenant(), &path, &ctx, &[]).unwrap();
        assert_eq!(request.fence_tag, "css");
        assert_eq!(request.prior_assets, vec!["\t<file name=\"/index.html\"><h1>Otters</h1></file>".to_string()]);
        assert_eq!(
            request.imported_context,
            vec!["\t<context name=\"@url https://example.com\" url=\"https://example.com\"># Otters</context>".to_string()]
        );
        assert_eq!(
            request.user_prompt,
            "<prompt>a fan site about otters</prompt>\n\nCreate a CSS file for the path '/style.css' based on the content in <prompt>"
        );
    }
}
