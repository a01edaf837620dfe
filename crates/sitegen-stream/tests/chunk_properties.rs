use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sitegen_stream::{filter_all, DirectiveScanner, FenceExtractor, ResponseFilter, StreamError};

/// Split ASCII `text` at the given cut points
fn split_at(text: &str, cuts: &[usize]) -> Vec<String> {
    let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (text.len() + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();
    let mut chunks = Vec::new();
    let mut last = 0;
    for cut in cuts {
        chunks.push(text[last..cut].to_string());
        last = cut;
    }
    chunks.push(text[last..].to_string());
    chunks
}

fn extract(tag: &str, chunks: &[String]) -> Result<String, StreamError> {
    let mut fence = FenceExtractor::new(tag);
    let mut out = String::new();
    for chunk in chunks {
        fence.push_into(chunk, &mut out);
    }
    out.push_str(&fence.finish()?);
    Ok(out)
}

fn good_tag(i: usize) -> String {
    format!(r#"<img data-gen-image="true" data-context='image {i}' alt="alt {i}" src="/img/{i}.jpg">"#)
}

fn bad_tag(i: usize) -> String {
    format!(r#"<img data-gen-image="true" alt="broken {i}" src="/bad/{i}.jpg">"#)
}

proptest! {
    #[test]
    fn prop_block_interior_survives_any_split(
        preamble in "[a-zA-Z .,!\n`]{0,80}",
        body in "[a-z0-9 <>=\"'/\n`{};]{1,300}",
        trailer in "[a-zA-Z .\n`]{0,40}",
        cuts in proptest::collection::vec(any::<usize>(), 0..12),
    ) {
        prop_assume!(!preamble.contains("```"));
        prop_assume!(!preamble.ends_with('`'));
        prop_assume!(!body.contains("```"));
        prop_assume!(!body.ends_with('`'));
        prop_assume!(!body.starts_with('\n'));

        let response = format!("{preamble}```html\n{body}```{trailer}");
        let chunks = split_at(&response, &cuts);
        prop_assert_eq!(extract("html", &chunks).unwrap(), body);
    }

    #[test]
    fn prop_no_fence_yields_nothing(
        text in "[a-zA-Z .,\n`]{0,200}",
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        prop_assume!(!text.contains("```css"));
        let chunks = split_at(&text, &cuts);
        let mut fence = FenceExtractor::new("css");
        for chunk in &chunks {
            prop_assert_eq!(fence.push(chunk), "");
        }
        prop_assert!(matches!(fence.finish(), Err(StreamError::NoFence { .. })), "expected NoFence error");
    }

    #[test]
    fn prop_directives_found_in_order(
        kinds in proptest::collection::vec(any::<bool>(), 0..10),
        filler in "[a-z <>/]{0,20}",
        cuts in proptest::collection::vec(any::<usize>(), 0..20),
    ) {
        prop_assume!(!filler.contains("<img") && !filler.ends_with('<'));

        let mut html = String::from("<main>");
        let mut expected = Vec::new();
        for (i, good) in kinds.iter().enumerate() {
            html.push_str(&filler);
            if *good {
                html.push_str(&good_tag(i));
                expected.push(format!("/img/{i}.jpg"));
            } else {
                html.push_str(&bad_tag(i));
            }
        }
        html.push_str("</main>");

        let response = format!("```html\n{html}```");
        let chunks = split_at(&response, &cuts);
        let out = filter_all(ResponseFilter::with_scanner("html"), chunks.iter().map(String::as_str)).unwrap();

        let paths: Vec<String> = out.directives.iter().map(|d| d.path.to_string()).collect();
        prop_assert_eq!(paths, expected);
        prop_assert_eq!(out.text, html);
    }
}

#[test]
fn scanner_alone_leaves_input_untouched() {
    let page = format!("<body>{}<p>text</p>{}</body>", good_tag(1), bad_tag(2));
    let mut scanner = DirectiveScanner::new();
    let mut forwarded = String::new();
    let mut found = Vec::new();
    for chunk in split_at(&page, &[7, 30, 31, 90, 140]) {
        found.extend(scanner.push(&chunk));
        forwarded.push_str(&chunk);
    }
    scanner.finish();
    assert_eq!(forwarded, page);
    assert_eq!(found.len(), 1);
    assert_eq!(scanner.skipped(), 1);
}

#[test]
fn end_to_end_example_response() {
    let response = r#"```html<img data-gen-image="true" data-context="hero" alt="hero" src="/hero.jpg">```"#;
    let out = filter_all(ResponseFilter::with_scanner("html"), [response]).unwrap();
    assert_eq!(out.text, r#"<img data-gen-image="true" data-context="hero" alt="hero" src="/hero.jpg">"#);
    assert_eq!(out.directives.len(), 1);
    assert_eq!(out.directives[0].path.as_str(), "/hero.jpg");
    assert_eq!(out.directives[0].prompt, "hero");
}
