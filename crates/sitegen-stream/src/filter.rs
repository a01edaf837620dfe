//! Single-pass response filter
//!
//! Each chunk of model output goes through the fence state machine first and
//! the released block content then goes through the tag state machine, so
//! extracted bytes and discovered directives stay in lockstep without
//! duplicating the stream.

use crate::directive::{DirectiveScanner, DEFAULT_MAX_TAG_LEN};
use crate::error::StreamError;
use crate::fence::FenceExtractor;
use sitegen_asset::ImageDirective;

/// Output released by one step of the filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutput {
    /// Extracted block content, in provider order
    pub text: String,
    /// Directives completed by this step, in document order
    pub directives: Vec<ImageDirective>,
}

impl FilterOutput {
    /// Whether this step released nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.directives.is_empty()
    }
}

/// Fence extractor with an optional directive scanner behind it
#[derive(Debug, Clone)]
pub struct ResponseFilter {
    fence: FenceExtractor,
    scanner: Option<DirectiveScanner>,
}

impl ResponseFilter {
    /// Extract blocks of `tag` without scanning
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            fence: FenceExtractor::new(tag),
            scanner: None,
        }
    }

    /// Extract blocks of `tag` and scan them for image directives
    #[must_use]
    pub fn with_scanner(tag: impl Into<String>) -> Self {
        Self::with_scanner_limit(tag, DEFAULT_MAX_TAG_LEN)
    }

    /// Like [`Self::with_scanner`] with a custom tag length cap
    #[must_use]
    pub fn with_scanner_limit(tag: impl Into<String>, max_tag_len: usize) -> Self {
        Self {
            fence: FenceExtractor::new(tag),
            scanner: Some(DirectiveScanner::with_max_tag_len(max_tag_len)),
        }
    }

    /// Whether directives are being scanned
    #[inline]
    #[must_use]
    pub fn scans_directives(&self) -> bool {
        self.scanner.is_some()
    }

    /// Underlying extractor
    #[inline]
    #[must_use]
    pub fn fence(&self) -> &FenceExtractor {
        &self.fence
    }

    /// Underlying scanner, if any
    #[inline]
    #[must_use]
    pub fn scanner(&self) -> Option<&DirectiveScanner> {
        self.scanner.as_ref()
    }

    /// Feed one provider chunk
    pub fn push(&mut self, chunk: &str) -> FilterOutput {
        let mut output = FilterOutput::default();
        self.fence.push_into(chunk, &mut output.text);
        if let Some(scanner) = &mut self.scanner {
            if !output.text.is_empty() {
                scanner.push_into(&output.text, &mut output.directives);
            }
        }
        output
    }

    /// End of provider stream
    ///
    /// # Errors
    /// Propagates the extractor's terminal error (no fence, empty block)
    pub fn finish(&mut self) -> Result<FilterOutput, StreamError> {
        let mut output = FilterOutput {
            text: self.fence.finish()?,
            directives: Vec::new(),
        };
        if let Some(scanner) = &mut self.scanner {
            if !output.text.is_empty() {
                scanner.push_into(&output.text, &mut output.directives);
            }
            scanner.finish();
        }
        Ok(output)
    }
}

/// Run a filter over a complete set of chunks
///
/// # Errors
/// Returns the filter's terminal error
pub fn filter_all<'a, I>(mut filter: ResponseFilter, chunks: I) -> Result<FilterOutput, StreamError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut total = FilterOutput::default();
    for chunk in chunks {
        let step = filter.push(chunk);
        total.text.push_str(&step.text);
        total.directives.extend(step.directives);
    }
    let last = filter.finish()?;
    total.text.push_str(&last.text);
    total.directives.extend(last.directives);
    Ok(total)
}
