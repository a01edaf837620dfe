//! Generator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generator configuration
///
/// Deserializable from TOML; every field has a default so partial files work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Maximum cached assets
    pub cache_capacity: u64,
    /// Optional cache entry lifetime in seconds
    pub cache_ttl_secs: Option<u64>,
    /// Maximum imported URL entries fed to one generation
    pub max_imported_context: usize,
    /// Maximum total bytes of sibling assets fed to one generation
    pub max_context_bytes: usize,
    /// Maximum byte length of one `img` tag before it is abandoned
    pub max_directive_tag_len: usize,
    /// Superseded versions kept per tenant after a prompt edit; `None` never reclaims
    pub reclaim_keep_versions: Option<usize>,
    /// Platform apex domains whose first-level subdomains are tenant handles
    pub apex_domains: Vec<String>,
    /// Image width when a directive gives none
    pub default_image_width: u32,
    /// Image height when a directive gives none
    pub default_image_height: u32,
    /// Record every provider call in the prompt log
    pub log_prompts: bool,
}

impl GeneratorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// With cache TTL
    #[inline]
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = Some(ttl.as_secs());
        self
    }

    /// With imported context limit
    #[inline]
    #[must_use]
    pub fn with_max_imported_context(mut self, max: usize) -> Self {
        self.max_imported_context = max;
        self
    }

    /// With sibling context byte budget
    #[inline]
    #[must_use]
    pub fn with_max_context_bytes(mut self, max: usize) -> Self {
        self.max_context_bytes = max;
        self
    }

    /// With directive tag length cap
    #[inline]
    #[must_use]
    pub fn with_max_directive_tag_len(mut self, max: usize) -> Self {
        self.max_directive_tag_len = max;
        self
    }

    /// With reclamation of superseded versions
    #[inline]
    #[must_use]
    pub fn with_reclaim_keep_versions(mut self, keep: Option<usize>) -> Self {
        self.reclaim_keep_versions = keep;
        self
    }

    /// With an apex domain
    #[inline]
    #[must_use]
    pub fn with_apex_domain(mut self, domain: impl Into<String>) -> Self {
        self.apex_domains.push(domain.into());
        self
    }

    /// With default image size
    #[inline]
    #[must_use]
    pub fn with_default_image_size(mut self, width: u32, height: u32) -> Self {
        self.default_image_width = width;
        self.default_image_height = height;
        self
    }

    /// With prompt logging on or off
    #[inline]
    #[must_use]
    pub fn with_prompt_logging(mut self, enabled: bool) -> Self {
        self.log_prompts = enabled;
        self
    }

    /// Cache TTL as a duration
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    /// Default image size
    #[inline]
    #[must_use]
    pub fn default_image_size(&self) -> (u32, u32) {
        (self.default_image_width, self.default_image_height)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 10_000,
            cache_ttl_secs: None,
            max_imported_context: 16,
            max_context_bytes: 256 * 1024,
            max_directive_tag_len: 4096,
            reclaim_keep_versions: Some(1),
            apex_domains: Vec::new(),
            default_image_width: 512,
            default_image_height: 512,
            log_prompts: true,
        }
    }
}
