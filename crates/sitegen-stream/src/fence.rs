//! Streaming fenced-block extraction
//!
//! [`FenceExtractor`] forwards only the interior of the first `` ```tag ``
//! block of a text stream, emitting bytes as soon as they are known to belong
//! to the block.
//!
//! # State machine
//!
//! ```text
//! Seeking ──```tag──▶ Opening ──first byte──▶ Inside ──```──▶ Closed
//! ```
//!
//! Only a bounded tail is ever buffered: in `Seeking` the last
//! `marker.len() - 1` bytes (a fence split across chunks), in `Inside` at most
//! two trailing backticks (a closing fence split across chunks).

use crate::error::StreamError;

/// Fence delimiter
pub const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceState {
    /// Looking for the opening fence; nothing is emitted
    Seeking,
    /// Opening fence matched; a line break directly after it is dropped
    Opening,
    /// Forwarding block content
    Inside,
    /// Closing fence seen; everything else is ignored
    Closed,
}

/// Result of searching the buffer for the opening fence
enum OpeningMatch {
    /// Content begins at this offset
    Found(usize),
    /// Marker found at this offset but the following byte is not known yet
    Undecided(usize),
    Absent,
}

/// Streaming extractor for one fenced block
///
/// # Example
///
/// ```rust
/// use sitegen_stream::FenceExtractor;
///
/// let mut fence = FenceExtractor::new("html");
/// let mut out = fence.push("Sure! ``");
/// out += &fence.push("`html\n<p>hi</p>``");
/// out += &fence.push("`\nHope this helps");
/// fence.finish().unwrap();
/// assert_eq!(out, "<p>hi</p>");
/// ```
#[derive(Debug, Clone)]
pub struct FenceExtractor {
    tag: String,
    marker: String,
    state: FenceState,
    buffer: String,
    emitted: usize,
}

impl FenceExtractor {
    /// Create extractor for a language tag (`html`, `css`, `js`)
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let marker = format!("{FENCE}{tag}");
        Self {
            tag,
            marker,
            state: FenceState::Seeking,
            buffer: String::new(),
            emitted: 0,
        }
    }

    /// Requested language tag
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether the opening fence has been seen
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, FenceState::Opening | FenceState::Inside)
    }

    /// Whether the closing fence has been seen
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == FenceState::Closed
    }

    /// Bytes emitted so far
    #[inline]
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Bytes currently withheld
    #[inline]
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a chunk, returning the block content it releases
    pub fn push(&mut self, chunk: &str) -> String {
        let mut out = String::new();
        self.push_into(chunk, &mut out);
        out
    }

    /// Feed a chunk, appending released content to `out`
    pub fn push_into(&mut self, chunk: &str, out: &mut String) {
        if self.state == FenceState::Closed {
            return;
        }
        self.buffer.push_str(chunk);
        let before = out.len();

        loop {
            match self.state {
                FenceState::Seeking => match self.find_opening() {
                    OpeningMatch::Found(start) => {
                        self.buffer.drain(..start);
                        self.state = FenceState::Opening;
                        tracing::debug!("opening fence found: {}", self.tag);
                    }
                    OpeningMatch::Undecided(at) => {
                        self.buffer.drain(..at);
                        break;
                    }
                    OpeningMatch::Absent => {
                        self.retain_tail(self.marker.len() - 1);
                        break;
                    }
                },
                FenceState::Opening => {
                    if self.buffer.is_empty() || self.buffer == "\r" {
                        break;
                    }
                    if self.buffer.starts_with("\r\n") {
                        self.buffer.drain(..2);
                    } else if self.buffer.starts_with('\n') {
                        self.buffer.drain(..1);
                    }
                    self.state = FenceState::Inside;
                }
                FenceState::Inside => {
                    if let Some(end) = self.buffer.find(FENCE) {
                        out.push_str(&self.buffer[..end]);
                        self.buffer.clear();
                        self.state = FenceState::Closed;
                        tracing::debug!("closing fence found: {}", self.tag);
                        break;
                    }
                    // A trailing run of backticks might start the closing fence
                    let held = self.buffer.len() - self.buffer.trim_end_matches('`').len();
                    let split = self.buffer.len() - held;
                    out.push_str(&self.buffer[..split]);
                    self.buffer.drain(..split);
                    break;
                }
                FenceState::Closed => break,
            }
        }

        self.emitted += out.len() - before;
    }

    /// Finish the stream, returning any withheld block content
    ///
    /// A stream that ends inside an open block is accepted and its withheld
    /// bytes are released.
    ///
    /// # Errors
    /// - [`StreamError::NoFence`] if no opening fence was ever seen
    /// - [`StreamError::EmptyBlock`] if the block produced no content
    pub fn finish(&mut self) -> Result<String, StreamError> {
        let rest = match self.state {
            FenceState::Seeking => {
                self.buffer.clear();
                return Err(StreamError::no_fence(&self.tag));
            }
            FenceState::Opening | FenceState::Inside => {
                tracing::warn!("stream ended inside open fence: {}", self.tag);
                let mut rest = std::mem::take(&mut self.buffer);
                // Half of a dropped CRLF line break
                if self.state == FenceState::Opening && rest == "\r" {
                    rest.clear();
                }
                rest
            }
            FenceState::Closed => String::new(),
        };
        self.state = FenceState::Closed;
        self.emitted += rest.len();

        if self.emitted == 0 {
            return Err(StreamError::empty_block(&self.tag));
        }
        Ok(rest)
    }

    fn find_opening(&self) -> OpeningMatch {
        let mut from = 0;
        while let Some(offset) = self.buffer[from..].find(&self.marker) {
            let at = from + offset;
            let after = at + self.marker.len();
            match self.buffer[after..].chars().next() {
                None => return OpeningMatch::Undecided(at),
                // ```json is not a ```js fence
                Some(c) if c.is_alphanumeric() || c == '-' || c == '_' => from = at + 1,
                Some(_) => return OpeningMatch::Found(after),
            }
        }
        OpeningMatch::Absent
    }

    fn retain_tail(&mut self, keep: usize) {
        if self.buffer.len() <= keep {
            return;
        }
        let mut start = self.buffer.len() - keep;
        while !self.buffer.is_char_boundary(start) {
            start -= 1;
        }
        self.buffer.drain(..start);
    }
}
