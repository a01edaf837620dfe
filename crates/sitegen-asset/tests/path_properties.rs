//! Property tests for request path normalization

use proptest::prelude::*;
use sitegen_asset::{AssetPath, ContentType};

proptest! {
    #[test]
    fn parse_is_idempotent(raw in "(/[a-z0-9_-]{1,8}){0,4}(\\.(html|css|js|jpg|png|mp4))?") {
        let once = AssetPath::parse(&raw).unwrap();
        let twice = AssetPath::parse(once.as_str()).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.as_str().starts_with('/'));
    }

    #[test]
    fn traversal_never_survives(prefix in "[a-z]{0,6}", suffix in "[a-z]{0,6}") {
        let raw = format!("/{prefix}/../{suffix}");
        prop_assert!(AssetPath::parse(&raw).is_err());
    }

    #[test]
    fn classification_is_total(name in "[a-z]{1,8}", ext in "[a-z]{0,4}") {
        let raw = if ext.is_empty() { format!("/{name}") } else { format!("/{name}.{ext}") };
        let path = AssetPath::parse(&raw).unwrap();
        let content_type = path.content_type();
        prop_assert_eq!(content_type.fence_tag().is_some(), content_type.is_text());
        prop_assert_eq!(content_type, ContentType::from_path(&path));
    }
}
