//! In-process transactional tenant store
//!
//! All records live in one [`State`] behind a single `parking_lot::RwLock`.
//! Each operation validates every invariant first and only then mutates, so a
//! rejected transaction leaves no trace. The lock is never held across an
//! await point.

use crate::error::TenantError;
use crate::host::normalize_host;
use crate::model::{CustomDomain, DomainStatus, ExtractedMarkdown, PromptLogEntry, ReferenceImage, Tenant, User, UserId};
use crate::store::{TenantResult, TenantStore};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use sitegen_asset::{AssetPath, ImageDirective, TenantId, VersionToken};
use std::collections::HashMap;

/// Default prompt log retention
pub const PROMPT_LOG_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Default)]
struct State {
    tenants: IndexMap<TenantId, Tenant>,
    /// host → tenant
    domains: HashMap<String, TenantId>,
    users: HashMap<UserId, User>,
    usernames: HashMap<String, UserId>,
    /// lowercased email → user
    emails: HashMap<String, UserId>,
    directives: HashMap<TenantId, HashMap<AssetPath, ImageDirective>>,
    urls: IndexMap<TenantId, IndexSet<String>>,
    markdown: HashMap<TenantId, IndexMap<String, String>>,
    images: HashMap<TenantId, Vec<ReferenceImage>>,
    prompt_log: Vec<PromptLogEntry>,
}

impl State {
    fn tenant(&self, id: &TenantId) -> TenantResult<&Tenant> {
        self.tenants.get(id).ok_or_else(|| TenantError::NotFound(id.clone()))
    }

    fn tenant_mut(&mut self, id: &TenantId) -> TenantResult<&mut Tenant> {
        self.tenants.get_mut(id).ok_or_else(|| TenantError::NotFound(id.clone()))
    }

    /// Check that every host is free or already owned by `id`
    fn check_hosts<'a>(&self, id: &TenantId, hosts: impl IntoIterator<Item = &'a String>) -> TenantResult<()> {
        let mut seen = IndexSet::new();
        for host in hosts {
            if let Some(owner) = self.domains.get(host) {
                if owner != id {
                    return Err(TenantError::DuplicateDomain {
                        host: host.clone(),
                        owner: owner.clone(),
                    });
                }
            }
            if !seen.insert(host) {
                return Err(TenantError::DuplicateDomain {
                    host: host.clone(),
                    owner: id.clone(),
                });
            }
        }
        Ok(())
    }

    fn insert_tenant(&mut self, mut tenant: Tenant) -> TenantResult<Tenant> {
        if self.tenants.contains_key(&tenant.id) {
            return Err(TenantError::DuplicateHandle(tenant.id));
        }
        tenant.custom_domains = normalize_domains(tenant.custom_domains)?;
        self.check_hosts(&tenant.id, tenant.custom_domains.iter().map(|d| &d.host))?;

        for domain in &tenant.custom_domains {
            self.domains.insert(domain.host.clone(), tenant.id.clone());
        }
        self.tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(tenant)
    }
}

fn normalize_domains(domains: Vec<CustomDomain>) -> TenantResult<Vec<CustomDomain>> {
    domains
        .into_iter()
        .map(|mut d| {
            d.host = normalize_host(&d.host)?;
            Ok(d)
        })
        .collect()
}

/// In-memory [`TenantStore`]
#[derive(Debug)]
pub struct InMemoryTenantStore {
    state: RwLock<State>,
    retention: Duration,
}

impl Default for InMemoryTenantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTenantStore {
    /// Create empty store with 30 day prompt log retention
    #[must_use]
    pub fn new() -> Self {
        Self::with_retention(Duration::days(PROMPT_LOG_RETENTION_DAYS))
    }

    /// Create empty store with custom prompt log retention
    #[must_use]
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            state: RwLock::new(State::default()),
            retention,
        }
    }

    /// Number of tenants
    #[must_use]
    pub fn tenant_count(&self) -> usize {
        self.state.read().tenants.len()
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn get_tenant(&self, id: &TenantId) -> TenantResult<Option<Tenant>> {
        Ok(self.state.read().tenants.get(id).cloned())
    }

    async fn get_tenant_by_domain(&self, host: &str) -> TenantResult<Option<Tenant>> {
        let Ok(host) = normalize_host(host) else {
            return Ok(None);
        };
        let state = self.state.read();
        Ok(state.domains.get(&host).and_then(|id| state.tenants.get(id)).cloned())
    }

    async fn create_tenant(&self, tenant: Tenant) -> TenantResult<Tenant> {
        let created = self.state.write().insert_tenant(tenant)?;
        tracing::info!("created site {} at {}", created.id, created.version.short());
        Ok(created)
    }

    async fn create_or_update_tenant(&self, tenant: Tenant) -> TenantResult<Tenant> {
        let mut state = self.state.write();
        if !state.tenants.contains_key(&tenant.id) {
            let created = state.insert_tenant(tenant)?;
            tracing::info!("created site {} at {}", created.id, created.version.short());
            return Ok(created);
        }

        let incoming = normalize_domains(tenant.custom_domains)?;
        let existing = state.tenant(&tenant.id)?;
        if existing.owner != tenant.owner {
            return Err(TenantError::Unauthorized {
                tenant: tenant.id,
                user: tenant.owner,
            });
        }
        state.check_hosts(&tenant.id, incoming.iter().map(|d| &d.host))?;

        // Validation done; apply
        let dropped: Vec<String> = existing
            .custom_domains
            .iter()
            .filter(|d| !incoming.iter().any(|n| n.host == d.host))
            .map(|d| d.host.clone())
            .collect();
        let merged: Vec<CustomDomain> = incoming
            .into_iter()
            .map(|n| {
                existing
                    .custom_domains
                    .iter()
                    .find(|d| d.host == n.host)
                    .cloned()
                    .unwrap_or(n)
            })
            .collect();

        for host in &dropped {
            state.domains.remove(host);
        }
        for domain in &merged {
            state.domains.insert(domain.host.clone(), tenant.id.clone());
        }

        let record = state.tenant_mut(&tenant.id)?;
        record.custom_domains = merged;
        if record.prompt != tenant.prompt {
            record.prompt = tenant.prompt;
            let version = record.bump_version();
            tracing::info!("prompt changed for {}, now at {}", record.id, version.short());
        } else {
            record.updated_at = Utc::now();
        }
        Ok(record.clone())
    }

    async fn update_prompt(&self, id: &TenantId, prompt: &str) -> TenantResult<Tenant> {
        let mut state = self.state.write();
        let tenant = state.tenant_mut(id)?;
        if tenant.prompt != prompt {
            tenant.prompt = prompt.to_string();
            let version = tenant.bump_version();
            tracing::info!("prompt changed for {}, now at {}", id, version.short());
        }
        Ok(tenant.clone())
    }

    async fn bump_version(&self, id: &TenantId) -> TenantResult<VersionToken> {
        let mut state = self.state.write();
        let version = state.tenant_mut(id)?.bump_version();
        tracing::info!("version bumped for {} to {}", id, version.short());
        Ok(version)
    }

    async fn add_custom_domain(&self, id: &TenantId, host: &str) -> TenantResult<CustomDomain> {
        let host = normalize_host(host)?;
        let mut state = self.state.write();
        let tenant = state.tenant(id)?;
        if let Some(existing) = tenant.custom_domains.iter().find(|d| d.host == host) {
            return Ok(existing.clone());
        }
        state.check_hosts(id, [&host])?;

        let domain = CustomDomain::new(host.clone());
        state.domains.insert(host, id.clone());
        state.tenant_mut(id)?.custom_domains.push(domain.clone());
        tracing::info!("domain {} added to {}", domain.host, id);
        Ok(domain)
    }

    async fn set_domain_status(&self, id: &TenantId, host: &str, status: DomainStatus) -> TenantResult<()> {
        let host = normalize_host(host)?;
        let mut state = self.state.write();
        let domain = state
            .tenant_mut(id)?
            .custom_domains
            .iter_mut()
            .find(|d| d.host == host)
            .ok_or_else(|| TenantError::DomainNotFound {
                host: host.clone(),
                tenant: id.clone(),
            })?;
        domain.status = status;
        Ok(())
    }

    async fn remove_custom_domain(&self, id: &TenantId, host: &str) -> TenantResult<()> {
        let host = normalize_host(host)?;
        let mut state = self.state.write();
        let tenant = state.tenant(id)?;
        if !tenant.has_domain(&host) {
            return Err(TenantError::DomainNotFound {
                host,
                tenant: id.clone(),
            });
        }

        state.domains.remove(&host);
        state.tenant_mut(id)?.custom_domains.retain(|d| d.host != host);
        tracing::info!("domain {} removed from {}", host, id);
        Ok(())
    }

    async fn delete_tenant(&self, id: &TenantId, owner: &UserId) -> TenantResult<Tenant> {
        let mut state = self.state.write();
        let tenant = state.tenant(id)?;
        if &tenant.owner != owner {
            return Err(TenantError::Unauthorized {
                tenant: id.clone(),
                user: owner.clone(),
            });
        }

        let Some(tenant) = state.tenants.shift_remove(id) else {
            return Err(TenantError::NotFound(id.clone()));
        };
        for domain in &tenant.custom_domains {
            state.domains.remove(&domain.host);
        }
        state.urls.shift_remove(id);
        state.markdown.remove(id);
        state.images.remove(id);
        state.directives.remove(id);
        tracing::info!("deleted site {}", id);
        Ok(tenant)
    }

    async fn list_by_owner(&self, owner: &UserId) -> TenantResult<Vec<Tenant>> {
        Ok(self
            .state
            .read()
            .tenants
            .values()
            .filter(|t| &t.owner == owner)
            .cloned()
            .collect())
    }

    async fn handle_available(&self, id: &TenantId) -> TenantResult<bool> {
        Ok(!self.state.read().tenants.contains_key(id))
    }

    async fn create_user(&self, user: User) -> TenantResult<User> {
        let email = user.email.trim().to_ascii_lowercase();
        let mut state = self.state.write();
        if state.usernames.contains_key(&user.username) {
            return Err(TenantError::DuplicateUsername(user.username));
        }
        if state.emails.contains_key(&email) {
            return Err(TenantError::DuplicateEmail(user.email));
        }

        state.usernames.insert(user.username.clone(), user.id.clone());
        state.emails.insert(email, user.id.clone());
        state.users.insert(user.id.clone(), user.clone());
        tracing::info!("created user {}", user.username);
        Ok(user)
    }

    async fn get_user(&self, id: &UserId) -> TenantResult<Option<User>> {
        Ok(self.state.read().users.get(id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> TenantResult<Option<User>> {
        let state = self.state.read();
        Ok(state.usernames.get(username).and_then(|id| state.users.get(id)).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> TenantResult<Option<User>> {
        let state = self.state.read();
        let email = email.trim().to_ascii_lowercase();
        Ok(state.emails.get(&email).and_then(|id| state.users.get(id)).cloned())
    }

    async fn record_image_directive(&self, id: &TenantId, directive: ImageDirective) -> TenantResult<()> {
        let mut state = self.state.write();
        state.tenant(id)?;
        tracing::debug!("image directive recorded for {}{}", id, directive.path);
        state
            .directives
            .entry(id.clone())
            .or_default()
            .insert(directive.path.clone(), directive);
        Ok(())
    }

    async fn get_image_directive(&self, id: &TenantId, path: &AssetPath) -> TenantResult<Option<ImageDirective>> {
        let state = self.state.read();
        state.tenant(id)?;
        Ok(state.directives.get(id).and_then(|d| d.get(path)).cloned())
    }

    async fn add_monitored_url(&self, id: &TenantId, url: &str) -> TenantResult<()> {
        let mut state = self.state.write();
        state.tenant(id)?;
        state.urls.entry(id.clone()).or_default().insert(url.to_string());
        Ok(())
    }

    async fn remove_monitored_url(&self, id: &TenantId, url: &str) -> TenantResult<()> {
        let mut state = self.state.write();
        let now_empty = match state.urls.get_mut(id) {
            Some(urls) => {
                urls.shift_remove(url);
                urls.is_empty()
            }
            None => false,
        };
        if now_empty {
            state.urls.shift_remove(id);
        }
        Ok(())
    }

    async fn monitored_urls(&self, id: &TenantId) -> TenantResult<Vec<String>> {
        Ok(self
            .state
            .read()
            .urls
            .get(id)
            .map(|urls| urls.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn all_monitored_urls(&self) -> TenantResult<Vec<(TenantId, Vec<String>)>> {
        Ok(self
            .state
            .read()
            .urls
            .iter()
            .map(|(id, urls)| (id.clone(), urls.iter().cloned().collect()))
            .collect())
    }

    async fn set_extracted_markdown(&self, id: &TenantId, url: &str, markdown: &str) -> TenantResult<()> {
        let mut state = self.state.write();
        state.tenant(id)?;
        state
            .markdown
            .entry(id.clone())
            .or_default()
            .insert(url.to_string(), markdown.to_string());
        Ok(())
    }

    async fn get_extracted_markdown(&self, id: &TenantId) -> TenantResult<Vec<ExtractedMarkdown>> {
        Ok(self
            .state
            .read()
            .markdown
            .get(id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(url, markdown)| ExtractedMarkdown {
                        url: url.clone(),
                        markdown: markdown.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save_reference_image(&self, image: ReferenceImage) -> TenantResult<()> {
        let mut state = self.state.write();
        state.tenant(&image.tenant)?;
        let images = state.images.entry(image.tenant.clone()).or_default();
        images.retain(|existing| existing.id != image.id);
        images.push(image);
        Ok(())
    }

    async fn reference_images(&self, id: &TenantId) -> TenantResult<Vec<ReferenceImage>> {
        let mut images = self.state.read().images.get(id).cloned().unwrap_or_default();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(images)
    }

    async fn delete_reference_image(&self, id: &TenantId, image_id: &str) -> TenantResult<()> {
        if let Some(images) = self.state.write().images.get_mut(id) {
            images.retain(|image| image.id != image_id);
        }
        Ok(())
    }

    async fn log_prompt(&self, entry: PromptLogEntry) -> TenantResult<()> {
        let cutoff = Utc::now() - self.retention;
        let mut state = self.state.write();
        state.prompt_log.retain(|e| e.timestamp > cutoff);
        state.prompt_log.push(entry);
        Ok(())
    }

    async fn prompt_logs(&self, id: Option<&TenantId>) -> TenantResult<Vec<PromptLogEntry>> {
        let cutoff = Utc::now() - self.retention;
        let mut logs: Vec<PromptLogEntry> = self
            .state
            .read()
            .prompt_log
            .iter()
            .filter(|e| e.timestamp > cutoff)
            .filter(|e| id.map_or(true, |id| &e.tenant == id))
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(logs)
    }
}
