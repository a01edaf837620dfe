//! Known-path index
//!
//! Remembers, per tenant, which paths have ever been generated and in which
//! order. The index says *what* to look up; content always comes from the
//! versioned store, so a stale entry costs one cache miss and nothing else.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use indexmap::IndexMap;
use sitegen_asset::{AssetPath, TenantId};

/// Per-tenant record of generated paths in discovery order
#[derive(Debug, Default)]
pub struct KnownPathIndex {
    tenants: DashMap<TenantId, IndexMap<AssetPath, DateTime<Utc>>>,
}

impl KnownPathIndex {
    /// Create empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path; the first discovery time is kept
    pub fn record(&self, tenant: &TenantId, path: &AssetPath, at: DateTime<Utc>) {
        self.tenants
            .entry(tenant.clone())
            .or_default()
            .entry(path.clone())
            .or_insert(at);
    }

    /// Known paths for a tenant, oldest first
    #[must_use]
    pub fn paths(&self, tenant: &TenantId) -> Vec<AssetPath> {
        self.tenants
            .get(tenant)
            .map(|paths| paths.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Known paths with their first discovery time, oldest first
    #[must_use]
    pub fn entries(&self, tenant: &TenantId) -> Vec<(AssetPath, DateTime<Utc>)> {
        self.tenants
            .get(tenant)
            .map(|paths| paths.iter().map(|(p, t)| (p.clone(), *t)).collect())
            .unwrap_or_default()
    }

    /// Whether a path is known for a tenant
    #[must_use]
    pub fn contains(&self, tenant: &TenantId, path: &AssetPath) -> bool {
        self.tenants
            .get(tenant)
            .is_some_and(|paths| paths.contains_key(path))
    }

    /// Forget one path, keeping the order of the rest
    pub fn remove(&self, tenant: &TenantId, path: &AssetPath) {
        if let Some(mut paths) = self.tenants.get_mut(tenant) {
            paths.shift_remove(path);
        }
    }

    /// Forget a tenant entirely
    pub fn forget(&self, tenant: &TenantId) {
        self.tenants.remove(tenant);
    }

    /// Number of tenants tracked
    #[must_use]
    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }
}
