//! Error types for the tenant store
//!
//! Every invariant violation aborts the whole transaction; no partial state
//! is ever written.

use crate::model::UserId;
use sitegen_asset::TenantId;

/// Errors from tenant, user and domain operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantError {
    /// No tenant with this handle
    #[error("site not found: {0}")]
    NotFound(TenantId),

    /// Handle already taken
    #[error("site handle already exists: {0}")]
    DuplicateHandle(TenantId),

    /// Host already routed to a tenant
    #[error("domain {host} already belongs to {owner}")]
    DuplicateDomain {
        /// Requested host
        host: String,
        /// Tenant already holding it
        owner: TenantId,
    },

    /// Host not attached to the tenant
    #[error("domain {host} not found on {tenant}")]
    DomainNotFound {
        /// Requested host
        host: String,
        /// Tenant searched
        tenant: TenantId,
    },

    /// Host is not a usable domain name
    #[error("invalid host: '{0}'")]
    InvalidHost(String),

    /// Caller does not own the tenant
    #[error("site {tenant} is not owned by {user}")]
    Unauthorized {
        /// Target tenant
        tenant: TenantId,
        /// Caller
        user: UserId,
    },

    /// Username already registered
    #[error("username already exists: {0}")]
    DuplicateUsername(String),

    /// Email already registered
    #[error("email already exists: {0}")]
    DuplicateEmail(String),

    /// No user with this id
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Could not find a free handle
    #[error("no free site handle after {0} attempts")]
    HandlesExhausted(usize),

    /// Store backend unreachable
    #[error("tenant store unavailable: {0}")]
    Unavailable(String),
}

impl TenantError {
    /// Whether this is a missing-record error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::DomainNotFound { .. } | Self::UserNotFound(_)
        )
    }

    /// Whether this is a uniqueness conflict
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateHandle(_)
                | Self::DuplicateDomain { .. }
                | Self::DuplicateUsername(_)
                | Self::DuplicateEmail(_)
        )
    }
}
