//! Request pipeline
//!
//! `resolve_asset(host, path)` runs an ordered list of stages over one
//! [`RequestContext`]:
//!
//! 1. `parse-request`: normalize the path and classify its content type
//! 2. `resolve-tenant`: map the host to a tenant record
//! 3. `cache-lookup`: read `(tenant, current version, path)`
//! 4. `generate`: run the orchestrator on a miss
//! 5. `cache-store`: write the generated asset
//!
//! Each stage is a plain function; a stage may finish the request early by
//! returning [`StageFlow::Done`].

use crate::error::GenerationError;
use crate::orchestrator::{Generated, GenerationOrchestrator};
use crate::phase::PhaseTracker;
use crate::provider::{ImageProvider, LlmProvider};
use crate::types::{GeneratorConfig, ResolvedAsset};
use futures::future::BoxFuture;
use futures::FutureExt;
use sitegen_asset::{AssetPath, ContentType, GeneratedAsset, ImageDirective, TenantId, VersionToken};
use sitegen_cache::{MokaAssetStore, VersionedAssetCache};
use sitegen_tenant::{first_label, HostResolver, HostTarget, Tenant, TenantStore};
use std::sync::Arc;

/// State carried through the stages of one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// `Host` header as received
    pub host: String,
    /// Request path before parsing
    pub raw_path: String,
    /// Parsed path, set by `parse-request`
    pub path: Option<AssetPath>,
    /// Classified type of `path`
    pub content_type: Option<ContentType>,
    /// Site the host routes to, set by `resolve-tenant`
    pub tenant: Option<Tenant>,
    /// Cached or freshly generated asset
    pub asset: Option<GeneratedAsset>,
    /// Asset came from the cache
    pub cache_hit: bool,
    /// Directives found while generating this request
    pub directives: Vec<ImageDirective>,
    /// Generation phases walked so far
    pub phases: PhaseTracker,
}

impl RequestContext {
    /// Fresh context for a request
    #[must_use]
    pub fn new(host: impl Into<String>, raw_path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            raw_path: raw_path.into(),
            path: None,
            content_type: None,
            tenant: None,
            asset: None,
            cache_hit: false,
            directives: Vec::new(),
            phases: PhaseTracker::new(),
        }
    }

    fn path(&self) -> Result<&AssetPath, GenerationError> {
        self.path
            .as_ref()
            .ok_or_else(|| GenerationError::Config("path not parsed".into()))
    }

    fn tenant(&self) -> Result<&Tenant, GenerationError> {
        self.tenant
            .as_ref()
            .ok_or_else(|| GenerationError::TenantNotFound(self.host.clone()))
    }
}

/// Whether the pipeline continues after a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFlow {
    Continue,
    Done,
}

/// One pipeline stage
pub type StageFn =
    for<'a> fn(&'a AssetService, &'a mut RequestContext) -> BoxFuture<'a, Result<StageFlow, GenerationError>>;

/// Stages in execution order
pub const STAGES: &[(&str, StageFn)] = &[
    ("parse-request", parse_request),
    ("resolve-tenant", resolve_tenant),
    ("cache-lookup", cache_lookup),
    ("generate", generate),
    ("cache-store", cache_store),
];

fn parse_request<'a>(
    _service: &'a AssetService,
    ctx: &'a mut RequestContext,
) -> BoxFuture<'a, Result<StageFlow, GenerationError>> {
    async move {
        let path = AssetPath::parse(&ctx.raw_path)?;
        let content_type = path.content_type();
        if content_type == ContentType::Media {
            return Err(GenerationError::UnsupportedContentType(path));
        }
        ctx.content_type = Some(content_type);
        ctx.path = Some(path);
        Ok(StageFlow::Continue)
    }
    .boxed()
}

fn resolve_tenant<'a>(
    service: &'a AssetService,
    ctx: &'a mut RequestContext,
) -> BoxFuture<'a, Result<StageFlow, GenerationError>> {
    async move {
        let tenant = service.find_tenant(&ctx.host).await?;
        tracing::debug!("host {} -> tenant {} at {}", ctx.host, tenant.id, tenant.version.short());
        ctx.tenant = Some(tenant);
        Ok(StageFlow::Continue)
    }
    .boxed()
}

fn cache_lookup<'a>(
    service: &'a AssetService,
    ctx: &'a mut RequestContext,
) -> BoxFuture<'a, Result<StageFlow, GenerationError>> {
    async move {
        let tenant = ctx.tenant()?.clone();
        let path = ctx.path()?.clone();
        match service.cache.get(&tenant.id, tenant.version, &path).await {
            Ok(Some(asset)) => {
                ctx.asset = Some(asset);
                ctx.cache_hit = true;
                Ok(StageFlow::Done)
            }
            Ok(None) => Ok(StageFlow::Continue),
            Err(e) => {
                tracing::warn!("cache read failed, regenerating: {}", e);
                Ok(StageFlow::Continue)
            }
        }
    }
    .boxed()
}

fn generate<'a>(
    service: &'a AssetService,
    ctx: &'a mut RequestContext,
) -> BoxFuture<'a, Result<StageFlow, GenerationError>> {
    async move {
        let tenant = ctx.tenant()?.clone();
        let path = ctx.path()?.clone();
        let Generated { asset, directives } = service
            .orchestrator
            .generate(&tenant, &path, &mut ctx.phases)
            .await?;
        ctx.asset = Some(asset);
        ctx.directives = directives;
        Ok(StageFlow::Continue)
    }
    .boxed()
}

fn cache_store<'a>(
    service: &'a AssetService,
    ctx: &'a mut RequestContext,
) -> BoxFuture<'a, Result<StageFlow, GenerationError>> {
    async move {
        let tenant = ctx.tenant()?.clone();
        let path = ctx.path()?.clone();
        let Some(asset) = ctx.asset.clone() else {
            return Ok(StageFlow::Done);
        };
        let generated = Generated {
            asset,
            directives: std::mem::take(&mut ctx.directives),
        };
        service
            .orchestrator
            .store(&tenant, &path, &generated, &mut ctx.phases)
            .await?;
        ctx.directives = generated.directives;
        Ok(StageFlow::Done)
    }
    .boxed()
}

/// HTTP-facing asset service
#[derive(Debug, Clone)]
pub struct AssetService {
    config: GeneratorConfig,
    tenants: Arc<dyn TenantStore>,
    cache: VersionedAssetCache,
    orchestrator: GenerationOrchestrator,
    hosts: HostResolver,
}

impl AssetService {
    /// Create service over injected collaborators
    pub fn new(
        config: GeneratorConfig,
        tenants: Arc<dyn TenantStore>,
        cache: VersionedAssetCache,
        llm: Arc<dyn LlmProvider>,
        images: Arc<dyn ImageProvider>,
    ) -> Self {
        let orchestrator = GenerationOrchestrator::new(config.clone(), llm, images, tenants.clone(), cache.clone());
        let hosts = HostResolver::new(config.apex_domains.clone());
        Self {
            config,
            tenants,
            cache,
            orchestrator,
            hosts,
        }
    }

    /// Create service with an in-memory cache sized from `config`
    pub fn in_memory(
        config: GeneratorConfig,
        tenants: Arc<dyn TenantStore>,
        llm: Arc<dyn LlmProvider>,
        images: Arc<dyn ImageProvider>,
    ) -> Self {
        let store = match config.cache_ttl() {
            Some(ttl) => MokaAssetStore::with_ttl(config.cache_capacity, ttl),
            None => MokaAssetStore::new(config.cache_capacity),
        };
        let cache = VersionedAssetCache::new(Arc::new(store));
        Self::new(config, tenants, cache, llm, images)
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Tenant store
    #[inline]
    #[must_use]
    pub fn tenants(&self) -> &Arc<dyn TenantStore> {
        &self.tenants
    }

    /// Versioned cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &VersionedAssetCache {
        &self.cache
    }

    /// Orchestrator
    #[inline]
    #[must_use]
    pub fn orchestrator(&self) -> &GenerationOrchestrator {
        &self.orchestrator
    }

    /// Resolve `path` on `host`, generating it on a miss
    ///
    /// # Errors
    /// Not found, unsupported type, provider or extraction failure; see
    /// [`GenerationError::status_code`]
    pub async fn resolve_asset(&self, host: &str, path: &str) -> Result<ResolvedAsset, GenerationError> {
        let ctx = self.run(RequestContext::new(host, path)).await?;
        let tenant = ctx.tenant()?;
        let asset = ctx
            .asset
            .as_ref()
            .ok_or_else(|| GenerationError::Config("pipeline produced no asset".into()))?;
        tracing::info!(
            "served {}{} ({}, {} bytes, {})",
            tenant.id,
            asset_path_str(&ctx),
            asset.content_type(),
            asset.len(),
            if ctx.cache_hit { "hit" } else { "generated" }
        );
        Ok(ResolvedAsset::from_asset(asset, tenant.version, ctx.cache_hit))
    }

    /// Run every stage over `ctx`
    ///
    /// # Errors
    /// The first stage error
    pub async fn run(&self, mut ctx: RequestContext) -> Result<RequestContext, GenerationError> {
        for (name, stage) in STAGES {
            match stage(self, &mut ctx).await {
                Ok(StageFlow::Continue) => {}
                Ok(StageFlow::Done) => {
                    tracing::trace!("pipeline done after {}", name);
                    return Ok(ctx);
                }
                Err(e) => {
                    tracing::debug!("stage {} failed: {}", name, e);
                    return Err(e);
                }
            }
        }
        Ok(ctx)
    }

    /// Tenant for a request host
    ///
    /// Custom domains are looked up first; a host with no mapping falls back
    /// to its first label as a handle.
    ///
    /// # Errors
    /// Returns `TenantNotFound` when nothing matches
    pub async fn find_tenant(&self, host: &str) -> Result<Tenant, GenerationError> {
        let handle = match self.hosts.resolve(host)? {
            HostTarget::Handle(handle) => handle,
            HostTarget::Apex => return Err(GenerationError::TenantNotFound(host.to_string())),
            HostTarget::CustomDomain(domain) => {
                if let Some(tenant) = self.tenants.get_tenant_by_domain(&domain).await? {
                    return Ok(tenant);
                }
                first_label(&domain).ok_or_else(|| GenerationError::TenantNotFound(host.to_string()))?
            }
        };
        self.tenants
            .get_tenant(&handle)
            .await?
            .ok_or_else(|| GenerationError::TenantNotFound(host.to_string()))
    }

    /// Change a tenant's prompt
    ///
    /// A changed prompt moves the tenant to a new version, so every cached
    /// asset is regenerated on next request. Superseded versions beyond the
    /// configured retention are reclaimed.
    ///
    /// # Errors
    /// Tenant store errors
    pub async fn update_prompt(&self, tenant: &TenantId, prompt: &str) -> Result<Tenant, GenerationError> {
        let updated = self.tenants.update_prompt(tenant, prompt).await?;
        self.reclaim(&updated.id, updated.version).await;
        Ok(updated)
    }

    /// Invalidate every cached asset of a tenant
    ///
    /// # Errors
    /// Tenant store errors
    pub async fn invalidate_all(&self, tenant: &TenantId) -> Result<VersionToken, GenerationError> {
        let version = self.tenants.bump_version(tenant).await?;
        self.reclaim(tenant, version).await;
        Ok(version)
    }

    async fn reclaim(&self, tenant: &TenantId, current: VersionToken) {
        let Some(keep) = self.config.reclaim_keep_versions else {
            return;
        };
        if let Err(e) = self.cache.reclaim(tenant, current, keep).await {
            tracing::warn!("reclaim failed for {}: {}", tenant, e);
        }
    }
}

fn asset_path_str(ctx: &RequestContext) -> &str {
    ctx.path.as_ref().map_or(ctx.raw_path.as_str(), AssetPath::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order() {
        let names: Vec<&str> = STAGES.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec!["parse-request", "resolve-tenant", "cache-lookup", "generate", "cache-store"]
        );
    }

    #[test]
    fn fresh_context() {
        let ctx = RequestContext::new("otters.localhost", "/about");
        assert!(ctx.path.is_none());
        assert!(!ctx.cache_hit);
        assert_eq!(asset_path_str(&ctx), "/about");
    }
}
