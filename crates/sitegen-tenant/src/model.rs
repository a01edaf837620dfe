//! Tenant, user and domain records

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitegen_asset::{TenantId, VersionToken};
use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

/// Opaque user identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an existing id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a random id
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Id as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Unique across all users
    pub username: String,
    /// Unique across all users (compared case-insensitively)
    pub email: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create user with a fresh id
    #[must_use]
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            username: username.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }
}

/// Verification state of a custom domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    /// Added, not yet verified
    #[default]
    Pending,
    /// DNS verified; requests are routed
    Verified,
    /// Verification failed
    Failed,
}

/// Custom domain attached to a tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDomain {
    /// Normalized host (lowercase, no port, no trailing dot)
    pub host: String,
    /// Verification state
    pub status: DomainStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl CustomDomain {
    /// Create pending domain for an already-normalized host
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            status: DomainStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// One generated site
///
/// # Invariants
/// - `id` maps to at most one tenant
/// - every `custom_domains[i].host` maps to this tenant only
/// - `version` changes on every prompt edit and is never reused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Site handle, also the subdomain
    pub id: TenantId,
    /// Owning user
    pub owner: UserId,
    /// Site prompt every asset is generated from
    pub prompt: String,
    /// Current cache version
    pub version: VersionToken,
    /// Attached custom domains
    #[serde(default)]
    pub custom_domains: Vec<CustomDomain>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last prompt or version change
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create tenant with a fresh version token
    #[must_use]
    pub fn new(id: TenantId, owner: UserId, prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner,
            prompt: prompt.into(),
            version: VersionToken::fresh(),
            custom_domains: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// With a custom domain
    #[must_use]
    pub fn with_domain(mut self, domain: CustomDomain) -> Self {
        self.custom_domains.push(domain);
        self
    }

    /// Whether a host is one of this tenant's custom domains
    #[must_use]
    pub fn has_domain(&self, host: &str) -> bool {
        self.custom_domains.iter().any(|d| d.host == host)
    }

    /// Advance to a fresh version token
    pub(crate) fn bump_version(&mut self) -> VersionToken {
        self.version = VersionToken::fresh();
        self.updated_at = Utc::now();
        self.version
    }
}

/// Markdown extracted from a URL the tenant's prompt references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMarkdown {
    /// Source URL
    pub url: String,
    /// Extracted page content
    pub markdown: String,
}

/// Image uploaded by the tenant owner and attached to every generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    /// Image id, unique per tenant
    pub id: String,
    /// Owning tenant
    pub tenant: TenantId,
    /// Uploaded file name
    pub filename: String,
    /// `image/png`, `image/jpeg`, ...
    pub media_type: String,
    /// Raw image bytes
    pub data: Bytes,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl ReferenceImage {
    /// Create image record
    #[must_use]
    pub fn new(
        tenant: TenantId,
        filename: impl Into<String>,
        media_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let filename = filename.into();
        Self {
            id: filename.clone(),
            tenant,
            filename,
            media_type: media_type.into(),
            data: data.into(),
            created_at: Utc::now(),
        }
    }
}

/// Record of one provider call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptLogEntry {
    /// Tenant the call was made for
    pub tenant: TenantId,
    /// System prompt sent
    pub system: String,
    /// User prompt sent
    pub prompt: String,
    /// Reference images attached
    #[serde(default)]
    pub image_ids: Vec<String>,
    /// When the call was made
    pub timestamp: DateTime<Utc>,
}
