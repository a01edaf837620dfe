//! sitegen stream filters
//!
//! Incremental processing of generative model output.
//!
//! # Components
//!
//! - [`FenceExtractor`]: forwards only the interior of the first `` ```tag `` block
//! - [`DirectiveScanner`]: discovers `<img data-gen-image="true">` directives
//! - [`ResponseFilter`]: both, in one forward pass per chunk
//!
//! ```text
//! provider chunk ─▶ FenceExtractor ─▶ block text ─▶ caller
//!                                        │
//!                                        └─▶ DirectiveScanner ─▶ ImageDirective*
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod attributes;
pub mod directive;
pub mod error;
pub mod fence;
pub mod filter;

pub use directive::{DirectiveScanner, DEFAULT_MAX_TAG_LEN, MARKER_ATTRIBUTE};
pub use error::{DirectiveError, StreamError};
pub use fence::{FenceExtractor, FENCE};
pub use filter::{filter_all, FilterOutput, ResponseFilter};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
