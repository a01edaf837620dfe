//! Error types for stream filtering
//!
//! [`StreamError`] is terminal for a response; [`DirectiveError`] only ever
//! causes one embedded tag to be skipped.

/// Errors that end a filtered response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Stream ended without an opening fence for the requested tag
    #[error("no fenced block of type '{tag}' found")]
    NoFence {
        /// Requested language tag
        tag: String,
    },

    /// Opening fence found but the block had no content
    #[error("fenced block of type '{tag}' is empty")]
    EmptyBlock {
        /// Requested language tag
        tag: String,
    },
}

impl StreamError {
    /// Create no-fence error
    pub fn no_fence(tag: impl Into<String>) -> Self {
        Self::NoFence { tag: tag.into() }
    }

    /// Create empty-block error
    pub fn empty_block(tag: impl Into<String>) -> Self {
        Self::EmptyBlock { tag: tag.into() }
    }
}

/// Reasons a marked `img` tag produced no directive
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    /// Required attribute absent or empty
    #[error("missing required attribute '{0}'")]
    MissingAttribute(&'static str),

    /// `src` is not a usable asset path
    #[error("invalid src '{src}': {reason}")]
    InvalidSource {
        /// Raw `src` value
        src: String,
        /// Why the path was rejected
        reason: String,
    },

    /// Tag grew past the configured maximum without closing
    #[error("tag exceeds {max} bytes without closing")]
    TagTooLong {
        /// Configured limit
        max: usize,
    },
}
