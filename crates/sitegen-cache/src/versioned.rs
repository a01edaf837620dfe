//! Version-partitioned asset cache
//!
//! Every entry is keyed by (tenant, version, path). Advancing a tenant's
//! version token makes its whole previous epoch unreachable without touching a
//! single entry; [`VersionedAssetCache::reclaim`] frees superseded epochs when
//! asked to.

use crate::error::CacheError;
use crate::index::KnownPathIndex;
use crate::key::CacheKey;
use crate::store::{AssetStore, MokaAssetStore};
use dashmap::DashMap;
use sitegen_asset::{AssetPath, GeneratedAsset, TenantId, VersionToken};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in the backing store (approximate)
    pub entry_count: u64,
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Writes
    pub writes: u64,
    /// Superseded versions reclaimed
    pub reclaimed_versions: u64,
}

impl CacheStats {
    /// Hit ratio in `[0, 1]`, zero before any lookup
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    reclaimed: AtomicU64,
}

/// Tenant-scoped, version-partitioned cache of generated assets
///
/// The orchestrator is the only writer; reads may run concurrently. Two
/// racing misses on one key may both write, and the later write wins.
#[derive(Debug, Clone)]
pub struct VersionedAssetCache {
    store: Arc<dyn AssetStore>,
    index: Arc<KnownPathIndex>,
    /// Versions written per tenant, in first-write order
    history: Arc<DashMap<TenantId, Vec<VersionToken>>>,
    counters: Arc<Counters>,
}

impl VersionedAssetCache {
    /// Create cache over a backing store
    #[must_use]
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self {
            store,
            index: Arc::new(KnownPathIndex::new()),
            history: Arc::new(DashMap::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Create cache over an in-memory moka store
    #[must_use]
    pub fn in_memory(max_capacity: u64) -> Self {
        Self::new(Arc::new(MokaAssetStore::new(max_capacity)))
    }

    /// Known-path index
    #[inline]
    #[must_use]
    pub fn index(&self) -> &KnownPathIndex {
        &self.index
    }

    /// Look up an asset
    ///
    /// # Errors
    /// Returns error if the backing store is unavailable
    pub async fn get(
        &self,
        tenant: &TenantId,
        version: VersionToken,
        path: &AssetPath,
    ) -> Result<Option<GeneratedAsset>, CacheError> {
        let key = CacheKey::new(tenant.clone(), version, path.clone());
        let found = self.store.get(&key).await?;
        if found.is_some() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("cache hit: {}", key);
        } else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("cache miss: {}", key);
        }
        Ok(found)
    }

    /// Look up an asset without touching the hit and miss counters
    ///
    /// For internal reads such as consistency context, so the counters keep
    /// describing request traffic only.
    ///
    /// # Errors
    /// Returns error if the backing store is unavailable
    pub async fn peek(
        &self,
        tenant: &TenantId,
        version: VersionToken,
        path: &AssetPath,
    ) -> Result<Option<GeneratedAsset>, CacheError> {
        self.store
            .get(&CacheKey::new(tenant.clone(), version, path.clone()))
            .await
    }

    /// Store an asset and remember its path for the tenant
    ///
    /// # Errors
    /// Returns error if the backing store is unavailable
    pub async fn put(
        &self,
        tenant: &TenantId,
        version: VersionToken,
        path: &AssetPath,
        asset: GeneratedAsset,
    ) -> Result<(), CacheError> {
        let created_at = asset.created_at();
        let key = CacheKey::new(tenant.clone(), version, path.clone());
        self.store.put(key, asset).await?;

        {
            let mut versions = self.history.entry(tenant.clone()).or_default();
            if !versions.contains(&version) {
                versions.push(version);
            }
        }
        self.index.record(tenant, path, created_at);
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("cached {} for {} at {}", path, tenant, version.short());
        Ok(())
    }

    /// Paths ever generated for a tenant, oldest first
    ///
    /// Cheap and possibly stale: resolve each path with [`Self::get`] under the
    /// current version before using it.
    #[must_use]
    pub fn known_paths(&self, tenant: &TenantId) -> Vec<AssetPath> {
        self.index.paths(tenant)
    }

    /// Versions a tenant has written under, oldest first
    #[must_use]
    pub fn versions(&self, tenant: &TenantId) -> Vec<VersionToken> {
        self.history
            .get(tenant)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Reclaim superseded epochs of a tenant
    ///
    /// Keeps `current` and the `keep` most recently written superseded
    /// versions; everything older is removed from the store. Returns the number
    /// of versions reclaimed.
    ///
    /// # Errors
    /// Returns error if the backing store rejects the invalidation; the
    /// version history is left untouched in that case
    pub async fn reclaim(&self, tenant: &TenantId, current: VersionToken, keep: usize) -> Result<usize, CacheError> {
        let doomed: Vec<VersionToken> = {
            let Some(versions) = self.history.get(tenant) else {
                return Ok(0);
            };
            let superseded: Vec<VersionToken> = versions.iter().copied().filter(|v| *v != current).collect();
            let cut = superseded.len().saturating_sub(keep);
            superseded[..cut].to_vec()
        };

        if doomed.is_empty() {
            return Ok(0);
        }

        self.store.remove_versions(tenant, &doomed).await?;
        if let Some(mut versions) = self.history.get_mut(tenant) {
            versions.retain(|v| !doomed.contains(v));
        }
        self.counters
            .reclaimed
            .fetch_add(doomed.len() as u64, Ordering::Relaxed);
        tracing::info!("reclaimed {} superseded versions for {}", doomed.len(), tenant);
        Ok(doomed.len())
    }

    /// Drop everything held for a tenant
    ///
    /// # Errors
    /// Returns error if the backing store rejects the invalidation
    pub async fn forget_tenant(&self, tenant: &TenantId) -> Result<(), CacheError> {
        let versions = self.versions(tenant);
        self.store.remove_versions(tenant, &versions).await?;
        self.history.remove(tenant);
        self.index.forget(tenant);
        tracing::info!("forgot cached assets for {}", tenant);
        Ok(())
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.store.entry_count(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            reclaimed_versions: self.counters.reclaimed.load(Ordering::Relaxed),
        }
    }
}

impl Default for VersionedAssetCache {
    /// In-memory cache with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(Arc::new(MokaAssetStore::default()))
    }
}
