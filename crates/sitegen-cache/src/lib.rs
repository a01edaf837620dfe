//! sitegen versioned asset cache
//!
//! Generated assets are stored under (tenant, version, path). A tenant's
//! version token changes whenever its prompt does, so one token bump makes the
//! whole previous epoch unreachable.
//!
//! # Architecture
//!
//! ```text
//! VersionedAssetCache ──▶ dyn AssetStore (MokaAssetStore)
//!        │
//!        └──▶ KnownPathIndex (what to re-resolve, never content)
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod index;
pub mod key;
pub mod store;
pub mod versioned;

pub use error::CacheError;
pub use index::KnownPathIndex;
pub use key::CacheKey;
pub use store::{AssetStore, MokaAssetStore};
pub use versioned::{CacheStats, VersionedAssetCache};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
