//! sitegen asset model
//!
//! Identity and value types shared by every stage of the generation pipeline.
//!
//! # Core Concepts
//!
//! - [`TenantId`] + [`VersionToken`] + [`AssetPath`]: the three components of a cache key
//! - [`ContentType`]: what kind of asset a path names
//! - [`GeneratedAsset`]: immutable bytes produced for one path
//! - [`ImageDirective`]: an image generation request discovered in markup
//! - [`ContentHash`]: Blake3 hash used as the asset's entity tag
//!
//! # Example
//!
//! ```rust
//! use sitegen_asset::{AssetPath, ContentType, GeneratedAsset};
//!
//! let path = AssetPath::parse("about").unwrap();
//! assert_eq!(path.as_str(), "/about");
//! assert_eq!(path.content_type(), ContentType::Html);
//!
//! let asset = GeneratedAsset::new(&path, "<h1>About</h1>");
//! assert_eq!(asset.mime(), "text/html");
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod asset;
mod content_type;
mod directive;
mod hash;
mod identity;
mod path;

pub use asset::GeneratedAsset;
pub use content_type::{mime_for_path, ContentType, IMAGE_EXTENSIONS, MEDIA_EXTENSIONS};
pub use directive::ImageDirective;
pub use hash::ContentHash;
pub use identity::{IdentityError, TenantId, VersionToken, MAX_HANDLE_LEN};
pub use path::{AssetPath, PathError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
