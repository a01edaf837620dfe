//! Consistency context assembly
//!
//! Collects previously generated assets of a tenant so the model can keep a
//! site visually and structurally coherent. The known-path index only says
//! *which* paths to look at; every body is re-read from the versioned cache
//! under the tenant's current version, so a version bump empties the context
//! with no extra bookkeeping.
//!
//! Assembly never fails: lookup errors are logged and the entry is skipped.

use chrono::{DateTime, Utc};
use sitegen_asset::AssetPath;
use sitegen_cache::VersionedAssetCache;
use sitegen_tenant::{ExtractedMarkdown, Tenant, TenantStore};
use std::sync::Arc;

/// One previously generated asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingAsset {
    /// Sibling path
    pub path: AssetPath,
    /// Text as cached under the current version
    pub content: String,
    /// When the sibling was generated
    pub generated_at: DateTime<Utc>,
}

/// Context handed to prompt construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyContext {
    /// Prior assets, oldest first
    pub siblings: Vec<SiblingAsset>,
    /// Imported URL extracts
    pub imported: Vec<ExtractedMarkdown>,
}

impl ConsistencyContext {
    /// Whether there is nothing to feed the model
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty() && self.imported.is_empty()
    }

    /// Total sibling content bytes
    #[must_use]
    pub fn sibling_bytes(&self) -> usize {
        self.siblings.iter().map(|s| s.content.len()).sum()
    }
}

/// Assembles [`ConsistencyContext`] values
#[derive(Debug, Clone)]
pub struct ConsistencyContextAssembler {
    cache: VersionedAssetCache,
    tenants: Arc<dyn TenantStore>,
    max_context_bytes: usize,
    max_imported: usize,
}

impl ConsistencyContextAssembler {
    /// Create assembler with no size limits
    pub fn new(cache: VersionedAssetCache, tenants: Arc<dyn TenantStore>) -> Self {
        Self {
            cache,
            tenants,
            max_context_bytes: usize::MAX,
            max_imported: usize::MAX,
        }
    }

    /// Cap total sibling content bytes
    #[must_use]
    pub fn with_max_context_bytes(mut self, max: usize) -> Self {
        self.max_context_bytes = max;
        self
    }

    /// Cap imported URL entries
    #[must_use]
    pub fn with_max_imported(mut self, max: usize) -> Self {
        self.max_imported = max;
        self
    }

    /// Context for generating `target` for `tenant`
    pub async fn assemble(&self, tenant: &Tenant, target: &AssetPath) -> ConsistencyContext {
        let siblings = self.siblings(tenant, target).await;
        let imported = self.imported(tenant).await;
        tracing::debug!(
            "context for {}{}: {} siblings, {} imported",
            tenant.id,
            target,
            siblings.len(),
            imported.len()
        );
        ConsistencyContext { siblings, imported }
    }

    async fn siblings(&self, tenant: &Tenant, target: &AssetPath) -> Vec<SiblingAsset> {
        let mut out = Vec::new();
        let mut budget = self.max_context_bytes;

        for path in self.cache.known_paths(&tenant.id) {
            if &path == target || !path.content_type().is_text() {
                continue;
            }

            let asset = match self.cache.peek(&tenant.id, tenant.version, &path).await {
                Ok(Some(asset)) => asset,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("context lookup failed for {}{}: {}", tenant.id, path, e);
                    continue;
                }
            };

            let Some(content) = asset.text().filter(|t| !t.is_empty()) else {
                continue;
            };
            if content.len() > budget {
                tracing::debug!("context budget reached at {}", path);
                break;
            }
            budget -= content.len();

            out.push(SiblingAsset {
                path,
                content: content.to_string(),
                generated_at: asset.created_at(),
            });
        }
        out
    }

    async fn imported(&self, tenant: &Tenant) -> Vec<ExtractedMarkdown> {
        match self.tenants.get_extracted_markdown(&tenant.id).await {
            Ok(mut entries) => {
                entries.retain(|m| !m.markdown.is_empty());
                entries.truncate(self.max_imported);
                entries
            }
            Err(e) => {
                tracing::warn!("imported context unavailable for {}: {}", tenant.id, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegen_asset::{GeneratedAsset, TenantId, VersionToken};
    use sitegen_tenant::{InMemoryTenantStore, UserId};

    async fn setup() -> (VersionedAssetCache, Arc<InMemoryTenantStore>, Tenant) {
        let store = Arc::new(InMemoryTenantStore::new());
        let tenant = Tenant::new(TenantId::parse("otters").unwrap(), UserId::new("u1"), "otters");
        let tenant = store.create_tenant(tenant).await.unwrap();
        (VersionedAssetCache::in_memory(100), store, tenant)
    }

    async fn put(cache: &VersionedAssetCache, tenant: &Tenant, version: VersionToken, path: &str, body: &str) {
        let path = AssetPath::parse(path).unwrap();
        cache
            .put(&tenant.id, version, &path, GeneratedAsset::new(&path, body.to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn excludes_target_media_and_empty() {
        let (cache, store, tenant) = setup().await;
        put(&cache, &tenant, tenant.version, "/index.html", "<h1>Home</h1>").await;
        put(&cache, &tenant, tenant.version, "/about", "<h1>About</h1>").await;
        put(&cache, &tenant, tenant.version, "/hero.jpg", "binary").await;
        put(&cache, &tenant, tenant.version, "/empty.css", "").await;

        let assembler = ConsistencyContextAssembler::new(cache, store);
        let target = AssetPath::parse("/about").unwrap();
        let ctx = assembler.assemble(&tenant, &target).await;

        let paths: Vec<&str> = ctx.siblings.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["/index.html"]);
    }

    #[tokio::test]
    async fn context_reads_leave_hit_ratio_alone() {
        let (cache, store, tenant) = setup().await;
        put(&cache, &tenant, tenant.version, "/index.html", "<h1>Home</h1>").await;

        let assembler = ConsistencyContextAssembler::new(cache.clone(), store);
        let ctx = assembler.assemble(&tenant, &AssetPath::parse("/about").unwrap()).await;
        assert_eq!(ctx.siblings.len(), 1);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (0, 0));
    }

    #[tokio::test]
    async fn superseded_versions_are_ignored() {
        let (cache, store, tenant) = setup().await;
        put(&cache, &tenant, tenant.version, "/index.html", "<h1>v1</h1>").await;

        let bumped = store.update_prompt(&tenant.id, "sea otters").await.unwrap();
        let assembler = ConsistencyContextAssembler::new(cache.clone(), store);
        let target = AssetPath::parse("/about").unwrap();
        assert!(assembler.assemble(&bumped, &target).await.siblings.is_empty());

        put(&cache, &bumped, bumped.version, "/index.html", "<h1>v2</h1>").await;
        let ctx = assembler.assemble(&bumped, &target).await;
        assert_eq!(ctx.siblings[0].content, "<h1>v2</h1>");
    }

    #[tokio::test]
    async fn oldest_first_within_budget() {
        let (cache, store, tenant) = setup().await;
        put(&cache, &tenant, tenant.version, "/a", "aaaa").await;
        put(&cache, &tenant, tenant.version, "/b", "bbbb").await;
        put(&cache, &tenant, tenant.version, "/c", "cccc").await;

        let assembler = ConsistencyContextAssembler::new(cache, store).with_max_context_bytes(9);
        let ctx = assembler.assemble(&tenant, &AssetPath::parse("/d").unwrap()).await;
        let paths: Vec<&str> = ctx.siblings.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/b"]);
        assert_eq!(ctx.sibling_bytes(), 8);
    }

    #[tokio::test]
    async fn imported_context_is_capped() {
        let (cache, store, tenant) = setup().await;
        store.set_extracted_markdown(&tenant.id, "https://a.example", "# A").await.unwrap();
        store.set_extracted_markdown(&tenant.id, "https://b.example", "# B").await.unwrap();

        let assembler = ConsistencyContextAssembler::new(cache, store).with_max_imported(1);
        let ctx = assembler.assemble(&tenant, &AssetPath::root()).await;
        assert_eq!(ctx.imported.len(), 1);
        assert!(!ctx.is_empty());
    }
}
