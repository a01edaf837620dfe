//! HTML start-tag attribute extraction

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// `name="v"`, `name='v'` or `name=v`
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .unwrap_or_else(|e| unreachable!("attribute pattern is valid: {e}"))
});

/// Parse the valued attributes of one start tag
///
/// Names are lowercased; the first occurrence of a name wins, matching how
/// browsers treat duplicates. Valueless attributes are ignored.
#[must_use]
pub fn parse_attributes(tag: &str) -> IndexMap<String, String> {
    let mut attributes = IndexMap::new();
    for capture in ATTRIBUTE.captures_iter(tag) {
        let Some(name) = capture.get(1) else { continue };
        let value = capture
            .get(2)
            .or_else(|| capture.get(3))
            .or_else(|| capture.get(4))
            .map_or("", |m| m.as_str());
        attributes
            .entry(name.as_str().to_ascii_lowercase())
            .or_insert_with(|| decode_entities(value));
    }
    attributes
}

/// Decode the character references models commonly emit in attribute values
#[must_use]
pub fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
