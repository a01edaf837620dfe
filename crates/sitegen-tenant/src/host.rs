//! Request host → tenant routing

use crate::error::TenantError;
use sitegen_asset::TenantId;

/// Handle used for local development hosts
pub const LOCAL_HANDLE: &str = "localhost";

/// Where a request host points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTarget {
    /// Subdomain of a platform apex domain, or a local host
    Handle(TenantId),
    /// Any other host; resolved through the custom-domain mapping
    CustomDomain(String),
    /// A platform apex domain itself (no tenant)
    Apex,
}

/// Maps request hosts to tenants
///
/// ```rust
/// use sitegen_tenant::{HostResolver, HostTarget};
///
/// let resolver = HostResolver::new(vec!["sitegen.dev".into()]);
/// assert!(matches!(resolver.resolve("fan-site.sitegen.dev").unwrap(), HostTarget::Handle(_)));
/// assert!(matches!(resolver.resolve("www.example.com").unwrap(), HostTarget::CustomDomain(_)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HostResolver {
    apex_domains: Vec<String>,
}

impl HostResolver {
    /// Create resolver for the given apex domains
    #[must_use]
    pub fn new(apex_domains: Vec<String>) -> Self {
        Self {
            apex_domains: apex_domains
                .into_iter()
                .filter_map(|d| normalize_host(&d).ok())
                .collect(),
        }
    }

    /// Configured apex domains
    #[inline]
    #[must_use]
    pub fn apex_domains(&self) -> &[String] {
        &self.apex_domains
    }

    /// Classify a request host
    ///
    /// # Errors
    /// Returns [`TenantError::InvalidHost`] for empty or malformed hosts
    pub fn resolve(&self, raw: &str) -> Result<HostTarget, TenantError> {
        let host = normalize_host(raw)?;
        if host == "localhost" || host == "0.0.0.0" || host == "127.0.0.1" {
            return TenantId::parse(LOCAL_HANDLE)
                .map(HostTarget::Handle)
                .map_err(|_| TenantError::InvalidHost(raw.to_string()));
        }

        for apex in &self.apex_domains {
            if host == *apex {
                return Ok(HostTarget::Apex);
            }
            if let Some(label) = host.strip_suffix(apex.as_str()).and_then(|h| h.strip_suffix('.')) {
                if label.contains('.') {
                    // a.b.apex: only one level of subdomain is routed
                    return Ok(HostTarget::CustomDomain(host));
                }
                return TenantId::parse(label)
                    .map(HostTarget::Handle)
                    .map_err(|_| TenantError::InvalidHost(raw.to_string()));
            }
        }

        Ok(HostTarget::CustomDomain(host))
    }
}

/// First DNS label of a host, as a tenant handle
#[must_use]
pub fn first_label(host: &str) -> Option<TenantId> {
    let host = normalize_host(host).ok()?;
    host.split('.').next().and_then(|label| TenantId::parse(label).ok())
}

/// Lowercase, strip port and trailing dot, validate characters
///
/// # Errors
/// Returns [`TenantError::InvalidHost`] if the host is empty or has invalid characters
pub fn normalize_host(raw: &str) -> Result<String, TenantError> {
    let trimmed = raw.trim();
    let without_port = match trimmed.rsplit_once(':') {
        Some((host, port)) if port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => trimmed,
    };
    let host = without_port.trim_end_matches('.').to_ascii_lowercase();

    let valid = !host.is_empty()
        && host
            .split('.')
            .all(|label| !label.is_empty() && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-'));
    if valid {
        Ok(host)
    } else {
        Err(TenantError::InvalidHost(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(s: &str) -> HostTarget {
        HostTarget::Handle(TenantId::parse(s).unwrap())
    }

    #[test]
    fn local_hosts() {
        let resolver = HostResolver::default();
        assert_eq!(resolver.resolve("localhost:8000").unwrap(), handle("localhost"));
        assert_eq!(resolver.resolve("0.0.0.0").unwrap(), handle("localhost"));
    }

    #[test]
    fn apex_subdomains() {
        let resolver = HostResolver::new(vec!["SiteGen.dev.".into()]);
        assert_eq!(resolver.resolve("Fan-Site.sitegen.dev").unwrap(), handle("fan-site"));
        assert_eq!(resolver.resolve("sitegen.dev").unwrap(), HostTarget::Apex);
        assert_eq!(
            resolver.resolve("a.b.sitegen.dev").unwrap(),
            HostTarget::CustomDomain("a.b.sitegen.dev".into())
        );
        assert_eq!(
            resolver.resolve("notsitegen.dev").unwrap(),
            HostTarget::CustomDomain("notsitegen.dev".into())
        );
    }

    #[test]
    fn custom_domains_normalized() {
        let resolver = HostResolver::new(vec!["sitegen.dev".into()]);
        assert_eq!(
            resolver.resolve("WWW.Example.com.:443").unwrap(),
            HostTarget::CustomDomain("www.example.com".into())
        );
    }

    #[test]
    fn invalid_hosts() {
        let resolver = HostResolver::default();
        assert!(resolver.resolve("").is_err());
        assert!(resolver.resolve("bad host").is_err());
        assert!(resolver.resolve("a..b").is_err());
    }

    #[test]
    fn first_label_fallback() {
        assert_eq!(first_label("demo.example.com"), TenantId::parse("demo").ok());
        assert_eq!(first_label("no_underscores.example.com"), None);
    }
}
