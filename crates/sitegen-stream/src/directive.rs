//! Streaming image directive scanner
//!
//! [`DirectiveScanner`] watches generated markup for
//! `<img data-gen-image="true" ...>` tags and turns each into an
//! [`ImageDirective`]. It never alters or delays the markup; callers forward
//! the chunk themselves and only receive directives back.
//!
//! Memory is bounded: at most one pending partial tag (capped by
//! `max_tag_len`) or a three byte `<im` prefix is retained between chunks.

use crate::attributes::parse_attributes;
use crate::error::DirectiveError;
use sitegen_asset::{AssetPath, ImageDirective};

/// Marker attribute identifying generation directives
pub const MARKER_ATTRIBUTE: &str = "data-gen-image";

/// Default cap on the byte length of one `img` tag
pub const DEFAULT_MAX_TAG_LEN: usize = 4096;

const TAG_OPEN: &[u8] = b"<img";

/// Streaming scanner for image directives
#[derive(Debug, Clone)]
pub struct DirectiveScanner {
    pending: String,
    max_tag_len: usize,
    found: usize,
    skipped: usize,
}

impl Default for DirectiveScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectiveScanner {
    /// Create scanner with the default tag length cap
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_tag_len(DEFAULT_MAX_TAG_LEN)
    }

    /// Create scanner with a custom tag length cap
    #[must_use]
    pub fn with_max_tag_len(max_tag_len: usize) -> Self {
        Self {
            pending: String::new(),
            max_tag_len: max_tag_len.max(TAG_OPEN.len() + 1),
            found: 0,
            skipped: 0,
        }
    }

    /// Directives emitted so far
    #[inline]
    #[must_use]
    pub fn found(&self) -> usize {
        self.found
    }

    /// Marked tags skipped as malformed
    #[inline]
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Bytes currently retained
    #[inline]
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Scan a chunk, returning directives completed by it in document order
    pub fn push(&mut self, chunk: &str) -> Vec<ImageDirective> {
        let mut directives = Vec::new();
        self.push_into(chunk, &mut directives);
        directives
    }

    /// Scan a chunk, appending completed directives to `out`
    pub fn push_into(&mut self, chunk: &str, out: &mut Vec<ImageDirective>) {
        self.pending.push_str(chunk);

        loop {
            let Some(start) = find_tag_open(&self.pending) else {
                let keep = partial_open_suffix(&self.pending);
                let cut = self.pending.len() - keep;
                self.pending.drain(..cut);
                return;
            };

            let after = start + TAG_OPEN.len();
            match self.pending.as_bytes().get(after) {
                None => {
                    self.pending.drain(..start);
                    return;
                }
                Some(b) if !(b.is_ascii_whitespace() || *b == b'/' || *b == b'>') => {
                    // <imgx is some other element
                    self.pending.drain(..after);
                    continue;
                }
                Some(_) => {}
            }

            match find_tag_end(&self.pending[start..]) {
                Some(len) => {
                    let end = start + len;
                    let tag = self.pending[start..end].to_string();
                    self.handle_tag(&tag, out);
                    self.pending.drain(..end);
                }
                None if self.pending.len() - start > self.max_tag_len => {
                    let tag = &self.pending[start..];
                    if tag.contains(MARKER_ATTRIBUTE) {
                        self.skipped += 1;
                        tracing::warn!(
                            "skipping image directive: {}",
                            DirectiveError::TagTooLong { max: self.max_tag_len }
                        );
                    }
                    self.pending.drain(..after);
                }
                None => {
                    self.pending.drain(..start);
                    return;
                }
            }
        }
    }

    /// End of stream; an unterminated trailing tag is dropped
    pub fn finish(&mut self) {
        if self.pending.contains(MARKER_ATTRIBUTE) {
            self.skipped += 1;
            tracing::warn!("skipping unterminated image directive at end of stream");
        }
        self.pending.clear();
    }

    fn handle_tag(&mut self, tag: &str, out: &mut Vec<ImageDirective>) {
        let attributes = parse_attributes(tag);
        let marked = attributes
            .get(MARKER_ATTRIBUTE)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        if !marked {
            return;
        }

        match directive_from_attributes(&attributes) {
            Ok(directive) => {
                tracing::debug!("image directive found: {}", directive.path);
                self.found += 1;
                out.push(directive);
            }
            Err(e) => {
                self.skipped += 1;
                tracing::warn!("skipping image directive: {}", e);
            }
        }
    }
}

/// Build a directive from parsed attributes
///
/// # Errors
/// Returns error if `data-context`, `alt` or `src` is missing, or `src` is
/// not a valid path
pub fn directive_from_attributes(
    attributes: &indexmap::IndexMap<String, String>,
) -> Result<ImageDirective, DirectiveError> {
    let required = |name: &'static str| {
        attributes
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(DirectiveError::MissingAttribute(name))
    };

    let prompt = required("data-context")?;
    let alt = required("alt")?;
    let src = required("src")?;
    let path = AssetPath::parse(src).map_err(|e| DirectiveError::InvalidSource {
        src: src.to_string(),
        reason: e.to_string(),
    })?;

    let mut directive = ImageDirective::new(prompt, alt, path);
    directive.style = attributes
        .get("data-style")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    directive.width = dimension(attributes, "data-width");
    directive.height = dimension(attributes, "data-height");
    Ok(directive)
}

fn dimension(attributes: &indexmap::IndexMap<String, String>, name: &str) -> Option<u32> {
    let raw = attributes.get(name)?.trim();
    let digits = raw.strip_suffix("px").unwrap_or(raw);
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => {
            tracing::warn!("ignoring unparseable {}: '{}'", name, raw);
            None
        }
        Ok(value) => Some(value),
    }
}

/// Offset of the first case-insensitive `<img`
fn find_tag_open(text: &str) -> Option<usize> {
    text.as_bytes()
        .windows(TAG_OPEN.len())
        .position(|w| w.eq_ignore_ascii_case(TAG_OPEN))
}

/// Length of a trailing `<`, `<i` or `<im`
fn partial_open_suffix(text: &str) -> usize {
    let bytes = text.as_bytes();
    (1..TAG_OPEN.len())
        .rev()
        .find(|&n| bytes.len() >= n && bytes[bytes.len() - n..].eq_ignore_ascii_case(&TAG_OPEN[..n]))
        .unwrap_or(0)
}

/// Length of the tag up to and including its closing `>`, honouring quotes
///
/// A quote only opens a value when it follows `=`; a stray apostrophe in an
/// unquoted value does not hide the rest of the page.
fn find_tag_end(tag: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut after_equals = false;
    for (i, b) in tag.bytes().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' if after_equals => quote = Some(b),
            b'>' => return Some(i + 1),
            b'=' => {
                after_equals = true;
                continue;
            }
            b if b.is_ascii_whitespace() => continue,
            _ => {}
        }
        after_equals = false;
    }
    None
}
