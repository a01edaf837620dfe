//! Content hashing
//!
//! [`ContentHash`] is a Blake3 digest of an asset body. It backs the entity
//! tag served with every asset and lets a cached entry check its own body.

use std::fmt::{self, Display, Formatter};

/// Blake3 digest of an asset body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash `data`
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Raw digest
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 8 digest bytes as hex
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }

    /// Strong entity tag, quoted
    #[inline]
    #[must_use]
    pub fn etag(&self) -> String {
        format!("\"{}\"", self.short())
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_body_same_hash() {
        let page = ContentHash::compute(b"<h1>hello</h1>");
        assert_eq!(page, ContentHash::compute(b"<h1>hello</h1>"));
        assert_ne!(page, ContentHash::compute(b"<h1>bye</h1>"));
    }

    #[test]
    fn etag_wraps_short_form() {
        let hash = ContentHash::compute(b"body { color: red }");
        let etag = hash.etag();
        assert_eq!(etag, format!("\"{}\"", hash.short()));
        assert_eq!(etag.len(), 18);
        assert!(hash.to_string().starts_with(&hash.short()));
        assert_eq!(hash.to_string().len(), 64);
    }
}
