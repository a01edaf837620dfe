//! Asset storage backends
//!
//! [`AssetStore`] is the seam between the versioned cache logic and wherever
//! bytes actually live. [`MokaAssetStore`] keeps them in a bounded in-process
//! moka cache.

use crate::error::CacheError;
use crate::key::CacheKey;
use async_trait::async_trait;
use moka::future::Cache;
use sitegen_asset::{GeneratedAsset, TenantId, VersionToken};
use std::fmt::Debug;
use std::time::Duration;

/// Storage of generated assets by composite key
///
/// Values are immutable: a `get` observes either nothing or exactly what one
/// `put` wrote.
#[async_trait]
pub trait AssetStore: Send + Sync + Debug {
    /// Read the asset at `key`
    async fn get(&self, key: &CacheKey) -> Result<Option<GeneratedAsset>, CacheError>;

    /// Write the asset at `key` (last writer wins)
    async fn put(&self, key: CacheKey, asset: GeneratedAsset) -> Result<(), CacheError>;

    /// Drop every entry of `tenant` written under one of `versions`
    async fn remove_versions(&self, tenant: &TenantId, versions: &[VersionToken]) -> Result<(), CacheError>;

    /// Approximate number of stored entries
    fn entry_count(&self) -> u64;
}

/// Bounded in-memory store backed by moka
#[derive(Debug, Clone)]
pub struct MokaAssetStore {
    inner: Cache<CacheKey, GeneratedAsset>,
}

impl MokaAssetStore {
    /// Create store with max entry capacity
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .support_invalidation_closures()
                .build(),
        }
    }

    /// Create store with time-based expiration
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .support_invalidation_closures()
                .build(),
        }
    }

    /// Apply pending evictions and invalidations
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }
}

impl Default for MokaAssetStore {
    /// Create store with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl AssetStore for MokaAssetStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<GeneratedAsset>, CacheError> {
        Ok(self.inner.get(key).await)
    }

    async fn put(&self, key: CacheKey, asset: GeneratedAsset) -> Result<(), CacheError> {
        self.inner.insert(key, asset).await;
        Ok(())
    }

    async fn remove_versions(&self, tenant: &TenantId, versions: &[VersionToken]) -> Result<(), CacheError> {
        if versions.is_empty() {
            return Ok(());
        }
        let tenant = tenant.clone();
        let versions = versions.to_vec();
        self.inner
            .invalidate_entries_if(move |key, _| key.tenant() == &tenant && versions.contains(&key.version()))
            .map(|_| ())
            .map_err(|e| CacheError::Invalidation(e.to_string()))
    }

    fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegen_asset::AssetPath;

    fn key(tenant: &str, version: VersionToken, path: &str) -> CacheKey {
        CacheKey::new(TenantId::parse(tenant).unwrap(), version, AssetPath::parse(path).unwrap())
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = MokaAssetStore::new(100);
        let v1 = VersionToken::fresh();
        let path = AssetPath::parse("/index.html").unwrap();
        let asset = GeneratedAsset::new(&path, "<h1>hi</h1>");

        store.put(key("demo", v1, "/index.html"), asset.clone()).await.unwrap();
        let got = store.get(&key("demo", v1, "/index.html")).await.unwrap();
        assert_eq!(got, Some(asset));
        assert!(store.get(&key("demo", VersionToken::fresh(), "/index.html")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_versions_is_scoped() {
        let store = MokaAssetStore::new(100);
        let (v1, v2) = (VersionToken::fresh(), VersionToken::fresh());
        let path = AssetPath::parse("/").unwrap();

        store.put(key("a", v1, "/"), GeneratedAsset::new(&path, "a1")).await.unwrap();
        store.put(key("a", v2, "/"), GeneratedAsset::new(&path, "a2")).await.unwrap();
        store.put(key("b", v1, "/"), GeneratedAsset::new(&path, "b1")).await.unwrap();

        store.remove_versions(&TenantId::parse("a").unwrap(), &[v1]).await.unwrap();
        store.sync().await;

        assert!(store.get(&key("a", v1, "/")).await.unwrap().is_none());
        assert!(store.get(&key("a", v2, "/")).await.unwrap().is_some());
        assert!(store.get(&key("b", v1, "/")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn entry_count_after_sync() {
        let store = MokaAssetStore::default();
        let v = VersionToken::fresh();
        for i in 0..5 {
            let path = format!("/p{i}");
            let asset = GeneratedAsset::new(&AssetPath::parse(&path).unwrap(), "x");
            store.put(key("demo", v, &path), asset).await.unwrap();
        }
        store.sync().await;
        assert_eq!(store.entry_count(), 5);
    }
}
