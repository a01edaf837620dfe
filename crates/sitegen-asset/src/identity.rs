//! Tenant identity and version tokens
//!
//! The first two components of every cache key.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Maximum length of a subdomain label
pub const MAX_HANDLE_LEN: usize = 63;

/// Tenant identity: the site's subdomain handle
///
/// Lowercase ASCII letters, digits and inner hyphens, 1–63 characters
/// (a single DNS label).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Validate and normalize (lowercase) a handle
    ///
    /// # Errors
    /// Returns error if the handle is not a valid DNS label
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let handle = raw.trim().to_ascii_lowercase();
        if handle.is_empty() || handle.len() > MAX_HANDLE_LEN {
            return Err(IdentityError::InvalidHandle(raw.to_string()));
        }
        if handle.starts_with('-') || handle.ends_with('-') {
            return Err(IdentityError::InvalidHandle(raw.to_string()));
        }
        if !handle
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(IdentityError::InvalidHandle(raw.to_string()));
        }
        Ok(Self(handle))
    }

    /// Handle as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TenantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TenantId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TenantId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

/// Opaque version token partitioning a tenant's cache into epochs
///
/// A fresh random token is minted on every content-affecting edit; tokens are
/// never derived from a counter, so an in-flight generation under an old token
/// can never collide with a later epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(Uuid);

impl VersionToken {
    /// Mint a fresh random token
    #[inline]
    #[must_use]
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    #[inline]
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex characters, for logs
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Display for VersionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionToken {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| IdentityError::InvalidVersion(s.to_string()))
    }
}

/// Errors related to tenant identity values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// Handle is not a valid subdomain label
    #[error("invalid site handle: '{0}'")]
    InvalidHandle(String),

    /// Version token could not be parsed
    #[error("invalid version token: '{0}'")]
    InvalidVersion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_lowercased() {
        let id = TenantId::parse("Fan-Site-42").unwrap();
        assert_eq!(id.as_str(), "fan-site-42");
    }

    #[test]
    fn handle_rejects_invalid_labels() {
        assert!(TenantId::parse("").is_err());
        assert!(TenantId::parse("-leading").is_err());
        assert!(TenantId::parse("trailing-").is_err());
        assert!(TenantId::parse("has.dot").is_err());
        assert!(TenantId::parse("under_score").is_err());
        assert!(TenantId::parse(&"a".repeat(64)).is_err());
        assert!(TenantId::parse(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn version_tokens_never_repeat() {
        let tokens: std::collections::HashSet<_> = (0..1000).map(|_| VersionToken::fresh()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn version_token_parse_and_short() {
        let token = VersionToken::fresh();
        let parsed: VersionToken = token.to_string().parse().unwrap();
        assert_eq!(token, parsed);
        assert_eq!(token.short().len(), 8);
        assert!("not-a-uuid".parse::<VersionToken>().is_err());
    }
}
