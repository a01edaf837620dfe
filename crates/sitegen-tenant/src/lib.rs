//! sitegen tenant store
//!
//! Authoritative tenant, user and custom-domain records, plus the per-tenant
//! side tables read during generation.
//!
//! # Invariants
//!
//! - a handle maps to at most one tenant
//! - a custom-domain host maps to at most one tenant
//! - a tenant's version token changes on every prompt edit and never repeats
//! - every mutation is all-or-nothing
//!
//! # Example
//!
//! ```rust
//! use sitegen_asset::TenantId;
//! use sitegen_tenant::{InMemoryTenantStore, Tenant, TenantStore, UserId};
//!
//! # async fn example() -> Result<(), sitegen_tenant::TenantError> {
//! let store = InMemoryTenantStore::new();
//! let id = TenantId::parse("otters").unwrap();
//! let created = store.create_tenant(Tenant::new(id.clone(), UserId::new("u1"), "otter facts")).await?;
//!
//! let edited = store.update_prompt(&id, "otter facts, with pictures").await?;
//! assert_ne!(created.version, edited.version);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod host;
pub mod memory;
pub mod model;
pub mod names;
pub mod store;

pub use error::TenantError;
pub use host::{first_label, normalize_host, HostResolver, HostTarget, LOCAL_HANDLE};
pub use memory::{InMemoryTenantStore, PROMPT_LOG_RETENTION_DAYS};
pub use model::{CustomDomain, DomainStatus, ExtractedMarkdown, PromptLogEntry, ReferenceImage, Tenant, User, UserId};
pub use names::{random_handle, unique_handle, DEFAULT_HANDLE_ATTEMPTS};
pub use store::{TenantResult, TenantStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
