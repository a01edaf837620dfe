//! Tenant store abstraction
//!
//! [`TenantStore`] is the authoritative home of tenant, user and domain
//! records plus the small per-tenant side tables the generator reads
//! (image directives, imported markdown, reference images, prompt log).
//!
//! Every mutating method is one all-or-nothing transaction.

use crate::error::TenantError;
use crate::model::{CustomDomain, DomainStatus, ExtractedMarkdown, PromptLogEntry, ReferenceImage, Tenant, User, UserId};
use async_trait::async_trait;
use sitegen_asset::{AssetPath, ImageDirective, TenantId, VersionToken};
use std::fmt::Debug;

/// Result alias for store operations
pub type TenantResult<T> = Result<T, TenantError>;

/// Authoritative store of tenants and their side tables
#[async_trait]
pub trait TenantStore: Send + Sync + Debug {
    /// Tenant by handle
    async fn get_tenant(&self, id: &TenantId) -> TenantResult<Option<Tenant>>;

    /// Tenant routed from a custom-domain host
    async fn get_tenant_by_domain(&self, host: &str) -> TenantResult<Option<Tenant>>;

    /// Insert a new tenant together with its domain mappings
    async fn create_tenant(&self, tenant: Tenant) -> TenantResult<Tenant>;

    /// Insert, or replace the prompt and domains of an existing tenant
    ///
    /// A prompt change mints a fresh version token; the incoming `version`
    /// field is ignored for existing tenants.
    async fn create_or_update_tenant(&self, tenant: Tenant) -> TenantResult<Tenant>;

    /// Replace the prompt, bumping the version if it changed
    async fn update_prompt(&self, id: &TenantId, prompt: &str) -> TenantResult<Tenant>;

    /// Advance the version token unconditionally
    async fn bump_version(&self, id: &TenantId) -> TenantResult<VersionToken>;

    /// Attach a custom domain
    async fn add_custom_domain(&self, id: &TenantId, host: &str) -> TenantResult<CustomDomain>;

    /// Update a custom domain's verification state
    async fn set_domain_status(&self, id: &TenantId, host: &str, status: DomainStatus) -> TenantResult<()>;

    /// Detach a custom domain
    async fn remove_custom_domain(&self, id: &TenantId, host: &str) -> TenantResult<()>;

    /// Delete a tenant owned by `owner` and everything hanging off it
    async fn delete_tenant(&self, id: &TenantId, owner: &UserId) -> TenantResult<Tenant>;

    /// Tenants owned by a user
    async fn list_by_owner(&self, owner: &UserId) -> TenantResult<Vec<Tenant>>;

    /// Whether a handle is free
    async fn handle_available(&self, id: &TenantId) -> TenantResult<bool>;

    /// Register a user (username and email must be unused)
    async fn create_user(&self, user: User) -> TenantResult<User>;

    /// User by id
    async fn get_user(&self, id: &UserId) -> TenantResult<Option<User>>;

    /// User by username
    async fn get_user_by_username(&self, username: &str) -> TenantResult<Option<User>>;

    /// User by email
    async fn get_user_by_email(&self, email: &str) -> TenantResult<Option<User>>;

    /// Remember the directive for an image path
    async fn record_image_directive(&self, id: &TenantId, directive: ImageDirective) -> TenantResult<()>;

    /// Directive recorded for exactly this path
    async fn get_image_directive(&self, id: &TenantId, path: &AssetPath) -> TenantResult<Option<ImageDirective>>;

    /// Add a URL to monitor for imported context (set semantics)
    async fn add_monitored_url(&self, id: &TenantId, url: &str) -> TenantResult<()>;

    /// Stop monitoring a URL
    async fn remove_monitored_url(&self, id: &TenantId, url: &str) -> TenantResult<()>;

    /// URLs monitored for a tenant, in insertion order
    async fn monitored_urls(&self, id: &TenantId) -> TenantResult<Vec<String>>;

    /// Monitored URLs of every tenant
    async fn all_monitored_urls(&self) -> TenantResult<Vec<(TenantId, Vec<String>)>>;

    /// Store markdown extracted from a URL
    async fn set_extracted_markdown(&self, id: &TenantId, url: &str, markdown: &str) -> TenantResult<()>;

    /// All markdown extracted for a tenant
    async fn get_extracted_markdown(&self, id: &TenantId) -> TenantResult<Vec<ExtractedMarkdown>>;

    /// Store a reference image
    async fn save_reference_image(&self, image: ReferenceImage) -> TenantResult<()>;

    /// Reference images of a tenant, newest first
    async fn reference_images(&self, id: &TenantId) -> TenantResult<Vec<ReferenceImage>>;

    /// Delete a reference image (missing images are ignored)
    async fn delete_reference_image(&self, id: &TenantId, image_id: &str) -> TenantResult<()>;

    /// Append to the prompt log
    async fn log_prompt(&self, entry: PromptLogEntry) -> TenantResult<()>;

    /// Unexpired prompt log entries, newest first
    async fn prompt_logs(&self, id: Option<&TenantId>) -> TenantResult<Vec<PromptLogEntry>>;
}
