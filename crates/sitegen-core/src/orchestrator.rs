//! Generation orchestrator
//!
//! Drives one cache miss through the phase machine in [`crate::phase`]:
//! gathers consistency context, calls the text or image provider, runs the
//! response filter over the stream and persists discovered directives.
//! Writing the result to the cache is a separate step ([`GenerationOrchestrator::store`])
//! so the request pipeline can keep it as its own stage.

use crate::context::ConsistencyContextAssembler;
use crate::error::GenerationError;
use crate::phase::{GenerationPhase, PhaseTracker};
use crate::prompt::PromptBuilder;
use crate::provider::{GenerationRequest, ImageProvider, LlmProvider, ProviderError};
use crate::types::GeneratorConfig;
use bytes::BytesMut;
use chrono::Utc;
use futures::StreamExt;
use sitegen_asset::{AssetPath, ContentType, GeneratedAsset, ImageDirective};
use sitegen_cache::VersionedAssetCache;
use sitegen_stream::{FilterOutput, ResponseFilter};
use sitegen_tenant::{PromptLogEntry, Tenant, TenantStore};
use std::sync::Arc;

/// Result of one generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Extracted asset, not yet cached
    pub asset: GeneratedAsset,
    /// Directives found in the page, in document order
    pub directives: Vec<ImageDirective>,
}

/// Generation orchestrator
#[derive(Debug, Clone)]
pub struct GenerationOrchestrator {
    config: GeneratorConfig,
    llm: Arc<dyn LlmProvider>,
    images: Arc<dyn ImageProvider>,
    tenants: Arc<dyn TenantStore>,
    cache: VersionedAssetCache,
    context: ConsistencyContextAssembler,
    prompts: PromptBuilder,
}

impl GenerationOrchestrator {
    /// Create orchestrator over injected collaborators
    pub fn new(
        config: GeneratorConfig,
        llm: Arc<dyn LlmProvider>,
        images: Arc<dyn ImageProvider>,
        tenants: Arc<dyn TenantStore>,
        cache: VersionedAssetCache,
    ) -> Self {
        let context = ConsistencyContextAssembler::new(cache.clone(), tenants.clone())
            .with_max_context_bytes(config.max_context_bytes)
            .with_max_imported(config.max_imported_context);
        Self {
            config,
            llm,
            images,
            tenants,
            cache,
            context,
            prompts: PromptBuilder::new(),
        }
    }

    /// Use a fixed prompt builder
    #[must_use]
    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Context assembler in use
    #[inline]
    #[must_use]
    pub fn context(&self) -> &ConsistencyContextAssembler {
        &self.context
    }

    /// Generate `path` for `tenant`
    ///
    /// Leaves `tracker` in `Cached` on success and `Failed` on error. Nothing
    /// is written to the cache here.
    ///
    /// # Errors
    /// Unsupported media, missing image directive, provider failure or a
    /// response with no usable fenced block
    pub async fn generate(
        &self,
        tenant: &Tenant,
        path: &AssetPath,
        tracker: &mut PhaseTracker,
    ) -> Result<Generated, GenerationError> {
        let result = self.generate_inner(tenant, path, tracker).await;
        match &result {
            Ok(generated) => tracing::debug!(
                "generated {}{}: {} bytes, {} directives",
                tenant.id,
                path,
                generated.asset.len(),
                generated.directives.len()
            ),
            Err(e) => {
                tracing::warn!("generation failed for {}{}: {}", tenant.id, path, e);
                tracker.fail();
            }
        }
        result
    }

    async fn generate_inner(
        &self,
        tenant: &Tenant,
        path: &AssetPath,
        tracker: &mut PhaseTracker,
    ) -> Result<Generated, GenerationError> {
        match path.content_type() {
            ContentType::Media => Err(GenerationError::UnsupportedContentType(path.clone())),
            ContentType::Image => {
                tracker.advance(GenerationPhase::ContextGathering)?;
                self.generate_image(tenant, path, tracker).await
            }
            ContentType::Html | ContentType::Css | ContentType::Js => {
                tracker.advance(GenerationPhase::ContextGathering)?;
                self.generate_text(tenant, path, tracker).await
            }
        }
    }

    async fn generate_image(
        &self,
        tenant: &Tenant,
        path: &AssetPath,
        tracker: &mut PhaseTracker,
    ) -> Result<Generated, GenerationError> {
        let directive = self
            .tenants
            .get_image_directive(&tenant.id, path)
            .await?
            .ok_or_else(|| GenerationError::no_image_context(&tenant.id, path))?;
        let size = directive.dimensions_or(self.config.default_image_size());

        tracing::info!(
            "generating image {}{} ({}x{}) via {}",
            tenant.id,
            path,
            size.0,
            size.1,
            self.images.name()
        );
        let mut stream = self.images.generate_image(&directive, size).await?;
        let mut body = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }
        if body.is_empty() {
            return Err(ProviderError::InvalidResponse(format!("empty image for {path}")).into());
        }

        tracker.advance(GenerationPhase::Cached)?;
        Ok(Generated {
            asset: GeneratedAsset::new(path, body.freeze()),
            directives: Vec::new(),
        })
    }

    async fn generate_text(
        &self,
        tenant: &Tenant,
        path: &AssetPath,
        tracker: &mut PhaseTracker,
    ) -> Result<Generated, GenerationError> {
        let context = self.context.assemble(tenant, path).await;
        let references = match self.tenants.reference_images(&tenant.id).await {
            Ok(images) => images,
            Err(e) => {
                tracing::warn!("reference images unavailable for {}: {}", tenant.id, e);
                Vec::new()
            }
        };
        let request = self
            .prompts
            .build(tenant, path, &context, &references)
            .ok_or_else(|| GenerationError::UnsupportedContentType(path.clone()))?;

        tracker.advance(GenerationPhase::Requesting)?;
        tracing::info!(
            "generating {}{} via {} ({} siblings, {} imported)",
            tenant.id,
            path,
            self.llm.name(),
            context.siblings.len(),
            context.imported.len()
        );
        let mut filter = if request.content_type.embeds_directives() {
            ResponseFilter::with_scanner_limit(request.fence_tag.clone(), self.config.max_directive_tag_len)
        } else {
            ResponseFilter::new(request.fence_tag.clone())
        };
        let log_entry = self.config.log_prompts.then(|| prompt_log_entry(tenant, &request));
        let mut stream = self.llm.generate(request).await?;
        if let Some(entry) = log_entry {
            if let Err(e) = self.tenants.log_prompt(entry).await {
                tracing::warn!("prompt log write failed for {}: {}", tenant.id, e);
            }
        }

        tracker.advance(GenerationPhase::Extracting)?;
        let mut body = String::new();
        let mut directives = Vec::new();
        while let Some(chunk) = stream.next().await {
            let output = filter.push(&chunk?);
            self.absorb(tenant, output, &mut body, &mut directives, tracker).await?;
            if filter.fence().is_closed() {
                break;
            }
        }
        drop(stream);
        let output = filter.finish()?;
        self.absorb(tenant, output, &mut body, &mut directives, tracker).await?;

        if let Some(scanner) = filter.scanner() {
            if scanner.skipped() > 0 {
                tracing::warn!("{} malformed image directives skipped in {}{}", scanner.skipped(), tenant.id, path);
            }
        }

        tracker.advance(GenerationPhase::Cached)?;
        Ok(Generated {
            asset: GeneratedAsset::new(path, body),
            directives,
        })
    }

    async fn absorb(
        &self,
        tenant: &Tenant,
        output: FilterOutput,
        body: &mut String,
        directives: &mut Vec<ImageDirective>,
        tracker: &mut PhaseTracker,
    ) -> Result<(), GenerationError> {
        body.push_str(&output.text);
        if output.directives.is_empty() {
            return Ok(());
        }

        tracker.advance(GenerationPhase::DirectiveScanning)?;
        for directive in output.directives {
            if let Err(e) = self.tenants.record_image_directive(&tenant.id, directive.clone()).await {
                tracing::warn!("directive for {} not recorded: {}", directive.path, e);
            }
            directives.push(directive);
        }
        tracker.advance(GenerationPhase::Extracting)
    }

    /// Write a generated asset under the tenant's version and mark it served
    ///
    /// A cache write failure is logged; the asset is still served.
    ///
    /// # Errors
    /// Returns error only on an illegal phase transition
    pub async fn store(
        &self,
        tenant: &Tenant,
        path: &AssetPath,
        generated: &Generated,
        tracker: &mut PhaseTracker,
    ) -> Result<(), GenerationError> {
        if let Err(e) = self
            .cache
            .put(&tenant.id, tenant.version, path, generated.asset.clone())
            .await
        {
            tracing::warn!("cache write failed for {}{}: {}", tenant.id, path, e);
        }
        tracker.advance(GenerationPhase::Served)
    }

    /// Generate and store in one call
    ///
    /// # Errors
    /// See [`Self::generate`]
    pub async fn render(&self, tenant: &Tenant, path: &AssetPath) -> Result<Generated, GenerationError> {
        let mut tracker = PhaseTracker::new();
        let generated = self.generate(tenant, path, &mut tracker).await?;
        self.store(tenant, path, &generated, &mut tracker).await?;
        Ok(generated)
    }
}

fn prompt_log_entry(tenant: &Tenant, request: &GenerationRequest) -> PromptLogEntry {
    PromptLogEntry {
        tenant: tenant.id.clone(),
        system: request.system_text(),
        prompt: request.user_prompt.clone(),
        image_ids: request.images.iter().map(|i| i.id.clone()).collect(),
        timestamp: Utc::now(),
    }
}
