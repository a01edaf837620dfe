//! End-to-end request tests through `AssetService`

use pretty_assertions::assert_eq;
use sitegen_asset::{AssetPath, ContentType};
use sitegen_cache::VersionedAssetCache;
use sitegen_core::{GenerationError, GeneratorConfig, ProviderError};
use sitegen_tenant::TenantStore;
use sitegen_test_utils::{harness, harness_with, Script, ScriptedProvider, UnavailableAssetStore};
use std::sync::Arc;

const HERO_PAGE: &str =
    "```html<img data-gen-image=\"true\" data-context=\"hero\" alt=\"hero\" src=\"/hero.jpg\">```";
const HERO_TAG: &str = "<img data-gen-image=\"true\" data-context=\"hero\" alt=\"hero\" src=\"/hero.jpg\">";

fn path(raw: &str) -> AssetPath {
    AssetPath::parse(raw).unwrap()
}

#[tokio::test]
async fn fan_site_lifecycle() {
    let mut h = harness("fansite", "fan site about X", ScriptedProvider::replying(HERO_PAGE, 7)).await;
    let host = h.host();
    let v1 = h.tenant.version;

    // first request: empty context, page generated and cached under v1
    let page = h.service.resolve_asset(&host, "/index.html").await.unwrap();
    assert_eq!(page.text(), Some(HERO_TAG));
    assert_eq!(page.content_type, ContentType::Html);
    assert_eq!(page.mime, "text/html");
    assert!(!page.cache_hit);
    assert_eq!(page.version, v1);
    let request = h.llm.last_request().unwrap();
    assert!(request.prior_assets.is_empty());
    assert_eq!(request.fence_tag, "html");

    let directive = h
        .tenants
        .get_image_directive(&h.tenant.id, &path("/hero.jpg"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(directive.prompt, "hero");
    assert_eq!(directive.alt, "hero");

    // second request is a hit
    let again = h.service.resolve_asset(&host, "/index.html").await.unwrap();
    assert!(again.cache_hit);
    assert_eq!(again.body, page.body);
    assert_eq!(h.llm.calls(), 1);

    // the image resolves through its recorded directive
    let hero = h.service.resolve_asset(&host, "/hero.jpg").await.unwrap();
    assert_eq!(hero.content_type, ContentType::Image);
    assert_eq!(hero.mime, "image/jpeg");
    assert_eq!(hero.body.as_ref(), b"\xFF\xD8\xFFfake-jpeg");
    let calls = h.images.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, (512, 512));

    // editing the prompt moves to v2; v1 bytes are still there but unused
    let updated = h.service.update_prompt(&h.tenant.id, "fan site about Y").await.unwrap();
    assert_ne!(updated.version, v1);
    h.refresh().await;
    let old = h.cache.get(&h.tenant.id, v1, &path("/index.html")).await.unwrap();
    assert_eq!(old.map(|a| a.body().clone()), Some(page.body.clone()));

    let fresh = h.service.resolve_asset(&host, "/index.html").await.unwrap();
    assert!(!fresh.cache_hit);
    assert_eq!(fresh.version, updated.version);
    assert_eq!(h.llm.calls(), 2);
    assert!(h.llm.last_request().unwrap().prior_assets.is_empty());
}

#[tokio::test]
async fn context_never_includes_the_target() {
    let llm = Arc::new(ScriptedProvider::new());
    llm.push_reply("```html\n<h1>About</h1>\n```", 5);
    llm.push_reply("```html\n<h1>Home</h1>\n```", 5);
    llm.push_reply("```css\nh1{color:teal}\n```", 5);
    let h = harness("otters", "otters", llm).await;
    let host = h.host();

    h.service.resolve_asset(&host, "/about").await.unwrap();
    h.service.resolve_asset(&host, "/").await.unwrap();
    let home_request = h.llm.last_request().unwrap();
    assert_eq!(home_request.prior_assets, vec!["\t<file name=\"/about\"><h1>About</h1>\n</file>".to_string()]);

    h.service.resolve_asset(&host, "/style.css").await.unwrap();
    let css_request = h.llm.last_request().unwrap();
    assert_eq!(css_request.prior_assets.len(), 2);
    assert!(css_request.prior_assets[0].contains("/about"));

    let ctx = h
        .service
        .orchestrator()
        .context()
        .assemble(&h.tenant, &path("/about"))
        .await;
    assert!(ctx.siblings.iter().all(|s| s.path.as_str() != "/about"));
    assert_eq!(ctx.siblings.len(), 2);
}

#[tokio::test]
async fn provider_failure_caches_nothing() {
    let h = harness(
        "otters",
        "otters",
        ScriptedProvider::failing(ProviderError::Unavailable("overloaded".into())),
    )
    .await;

    let err = h.service.resolve_asset(&h.host(), "/index.html").await.unwrap_err();
    assert!(matches!(err, GenerationError::Provider(_)));
    assert_eq!(err.status_code(), 502);
    assert!(err.is_retryable());
    assert_eq!(h.cache.stats().writes, 0);
    assert!(h.cache.known_paths(&h.tenant.id).is_empty());
}

#[tokio::test]
async fn broken_stream_caches_nothing() {
    let llm = Arc::new(ScriptedProvider::new());
    llm.push(Script::BreakAfter {
        text: "```html\n<h1>half a pa".into(),
        error: ProviderError::Stream("connection reset".into()),
    });
    let h = harness("otters", "otters", llm).await;

    let err = h.service.resolve_asset(&h.host(), "/index.html").await.unwrap_err();
    assert!(matches!(err, GenerationError::Provider(ProviderError::Stream(_))));
    assert_eq!(h.cache.stats().writes, 0);
}

#[tokio::test]
async fn broken_stream_keeps_directives_already_seen() {
    let llm = Arc::new(ScriptedProvider::new());
    llm.push(Script::BreakAfter {
        text: format!("```html\n<main>{HERO_TAG}<p>more to co"),
        error: ProviderError::Stream("reset".into()),
    });
    let h = harness("otters", "otters", llm).await;

    let err = h.service.resolve_asset(&h.host(), "/index.html").await.unwrap_err();
    assert!(matches!(err, GenerationError::Provider(ProviderError::Stream(_))));

    let directive = h
        .tenants
        .get_image_directive(&h.tenant.id, &path("/hero.jpg"))
        .await
        .unwrap()
        .expect("directive seen before the break is kept");
    assert_eq!(directive.prompt, "hero");
    assert_eq!(h.cache.stats().writes, 0);
}

#[tokio::test]
async fn missing_fence_is_an_error_and_retried() {
    let llm = Arc::new(ScriptedProvider::new());
    llm.push_reply("I cannot help with that.", 6);
    llm.push_reply("```html\n<p>ok</p>\n```", 6);
    let h = harness("otters", "otters", llm).await;
    let host = h.host();

    let err = h.service.resolve_asset(&host, "/index.html").await.unwrap_err();
    assert!(matches!(err, GenerationError::Extraction(_)));
    assert_eq!(err.status_code(), 502);

    let page = h.service.resolve_asset(&host, "/index.html").await.unwrap();
    assert_eq!(page.text(), Some("<p>ok</p>\n"));
    assert_eq!(h.llm.calls(), 2);
}

#[tokio::test]
async fn request_errors_map_to_statuses() {
    let h = harness("otters", "otters", ScriptedProvider::replying(HERO_PAGE, 16)).await;
    let host = h.host();

    let unknown = h.service.resolve_asset("nobody.localhost", "/").await.unwrap_err();
    assert!(unknown.is_not_found());
    assert_eq!(unknown.status_code(), 404);

    let media = h.service.resolve_asset(&host, "/intro.mp4").await.unwrap_err();
    assert_eq!(media.status_code(), 415);

    let image = h.service.resolve_asset(&host, "/never-mentioned.png").await.unwrap_err();
    assert!(matches!(image, GenerationError::NoImageContext { .. }));
    assert_eq!(image.status_code(), 404);

    let bad = h.service.resolve_asset(&host, "/../etc/passwd").await.unwrap_err();
    assert_eq!(bad.status_code(), 400);

    assert_eq!(h.llm.calls(), 0);
}

#[tokio::test]
async fn custom_domain_routes_to_tenant() {
    let h = harness("otters", "otters", ScriptedProvider::replying("```html\n<p>hi</p>\n```", 4)).await;
    h.tenants.add_custom_domain(&h.tenant.id, "otters.example.com").await.unwrap();

    let page = h.service.resolve_asset("Otters.Example.com:443", "/").await.unwrap();
    assert_eq!(page.text(), Some("<p>hi</p>\n"));
    assert_eq!(
        h.service.find_tenant("otters.example.com").await.unwrap().id,
        h.tenant.id
    );
}

#[tokio::test]
async fn unavailable_cache_still_serves() {
    let cache = VersionedAssetCache::new(Arc::new(UnavailableAssetStore));
    let h = harness_with(
        GeneratorConfig::default(),
        "otters",
        "otters",
        ScriptedProvider::replying("```js\nconsole.log(1)\n```", 3),
        cache,
    )
    .await;
    let host = h.host();

    let script = h.service.resolve_asset(&host, "/app.js").await.unwrap();
    assert_eq!(script.text(), Some("console.log(1)\n"));
    assert_eq!(script.mime, "application/javascript");

    h.service.resolve_asset(&host, "/app.js").await.unwrap();
    assert_eq!(h.llm.calls(), 2);
}

#[tokio::test]
async fn invalidate_all_reclaims_old_versions() {
    let config = GeneratorConfig::default().with_reclaim_keep_versions(Some(0));
    let mut h = harness_with(
        config,
        "otters",
        "otters",
        ScriptedProvider::replying("```html\n<p>v</p>\n```", 4),
        VersionedAssetCache::in_memory(100),
    )
    .await;
    let host = h.host();
    let v1 = h.tenant.version;

    h.service.resolve_asset(&host, "/").await.unwrap();
    let v2 = h.service.invalidate_all(&h.tenant.id).await.unwrap();
    assert_ne!(v1, v2);
    h.refresh().await;
    assert_eq!(h.tenant.version, v2);

    assert!(h.cache.get(&h.tenant.id, v1, &AssetPath::root()).await.unwrap().is_none());
    let page = h.service.resolve_asset(&host, "/").await.unwrap();
    assert!(!page.cache_hit);
    assert_eq!(page.version, v2);
}

#[test]
fn config_from_toml() {
    let config: GeneratorConfig = toml::from_str(
        r#"
        cache_capacity = 50
        apex_domains = ["sitegen.dev"]
        default_image_width = 1024
        "#,
    )
    .unwrap();
    assert_eq!(config.cache_capacity, 50);
    assert_eq!(config.apex_domains, vec!["sitegen.dev".to_string()]);
    assert_eq!(config.default_image_size(), (1024, 512));
    assert_eq!(config.reclaim_keep_versions, Some(1));
}
