//! Composite cache keys

use sitegen_asset::{AssetPath, TenantId, VersionToken};
use std::fmt::{self, Display, Formatter};

/// (tenant, version, path) triple addressing one generated asset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    tenant: TenantId,
    version: VersionToken,
    path: AssetPath,
}

impl CacheKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(tenant: TenantId, version: VersionToken, path: AssetPath) -> Self {
        Self { tenant, version, path }
    }

    /// Tenant component
    #[inline]
    #[must_use]
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Version component
    #[inline]
    #[must_use]
    pub fn version(&self) -> VersionToken {
        self.version
    }

    /// Path component
    #[inline]
    #[must_use]
    pub fn path(&self) -> &AssetPath {
        &self.path
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.tenant, self.version.short(), self.path)
    }
}
