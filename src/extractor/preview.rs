use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_PREVIEW_CHARS: usize = 2000;

// An unterminated body runs to the end of the document.
static BODY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*?)(?:</body\s*>|\z)").unwrap());

static DROPPED_SUBTREES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    ["script", "style", "nav", "aside"]
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b.*?</{tag}\s*>")).unwrap())
});

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

const ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

/// Visible body text, whitespace-collapsed and cut on a word boundary so
/// that it never exceeds `max_chars` characters. Empty when the document has
/// no `<body>`.
pub fn extract_content_preview(html: &str, max_chars: usize) -> String {
    let Some(body) = BODY_REGEX.captures(html).and_then(|c| c.get(1)) else {
        return String::new();
    };

    let mut text = body.as_str().to_string();
    for subtree in DROPPED_SUBTREES.iter() {
        text = subtree.replace_all(&text, " ").into_owned();
    }
    let mut text = TAG_REGEX.replace_all(&text, " ").into_owned();
    for (entity, replacement) in ENTITIES {
        text = text.replace(entity, replacement);
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_on_word_boundary(&collapsed, max_chars)
}

/// Longest whole-word prefix within `max_chars`. A first word that alone is
/// too long is cut mid-word.
pub fn truncate_on_word_boundary(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut used = 0;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        let needed = if out.is_empty() { len } else { len + 1 };
        if used + needed > max_chars {
            if out.is_empty() {
                out = word.chars().take(max_chars).collect();
            }
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        used += needed;
    }

    out
}

/// Prefix of at most `max_chars` characters, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_boilerplate_subtrees() {
        let html = r#"<html><head><title>T</title></head><body>
            <nav><a href="/">Home</a> <a href="/about">About</a></nav>
            <script>var tracking = "nope";</script>
            <style>p { color: red; }</style>
            <article><h1>Heading</h1><p>First   paragraph.</p>
            <p>Second&nbsp;paragraph &amp; more.</p></article>
            <aside>Related links</aside>
        </body></html>"#;

        let preview = extract_content_preview(html, DEFAULT_PREVIEW_CHARS);
        assert_eq!(preview, "Heading First paragraph. Second paragraph & more.");
    }

    #[test]
    fn test_no_body_yields_empty() {
        assert_eq!(extract_content_preview("<html><head><title>x</title></head></html>", 100), "");
        assert_eq!(extract_content_preview("", 100), "");
        assert_eq!(extract_content_preview("just some text", 100), "");
    }

    #[test]
    fn test_unterminated_body() {
        let html = "<html><body><p>Unclosed tags<div>More content";
        assert_eq!(extract_content_preview(html, 100), "Unclosed tags More content");
    }

    #[test]
    fn test_budget_is_respected_on_word_boundary() {
        let html = format!("<body>{}</body>", "alpha beta gamma ".repeat(500));
        let preview = extract_content_preview(&html, 20);
        assert_eq!(preview, "alpha beta gamma");
        assert!(preview.chars().count() <= 20);

        let long = extract_content_preview(&html, DEFAULT_PREVIEW_CHARS);
        assert!(long.chars().count() <= DEFAULT_PREVIEW_CHARS);
        assert!(long.ends_with("alpha") || long.ends_with("beta") || long.ends_with("gamma"));
    }

    #[test]
    fn test_single_long_word_is_cut() {
        assert_eq!(truncate_on_word_boundary("supercalifragilistic", 5), "super");
        assert_eq!(truncate_on_word_boundary("anything", 0), "");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "日本語 テキスト です";
        assert_eq!(truncate_on_word_boundary(text, 7), "日本語");
        assert_eq!(truncate_on_word_boundary(text, 8), "日本語 テキスト");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[cfg(feature = "fuzz")]
    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn preview_never_exceeds_budget(body in ".{0,4000}", budget in 0usize..3000) {
                let html = format!("<html><body>{body}</body></html>");
                let preview = extract_content_preview(&html, budget);
                prop_assert!(preview.chars().count() <= budget);
            }

            #[test]
            fn extractors_never_panic(html in "(<[a-z]{1,6}( [a-z:]{1,12}=\"[^\"<>]{0,20}\")?>|[^<>]{0,30}|</[a-z]{1,6}>){0,40}") {
                let page_url = url::Url::parse("https://tldr.tech/tech/2024-05-01").unwrap();
                let meta = crate::extractor::meta::extract_meta_tags(&html);
                let _ = crate::extractor::redirect::find_source_link(&html, &page_url);
                let preview = extract_content_preview(&html, DEFAULT_PREVIEW_CHARS);
                let _ = crate::extractor::heuristics::heuristic_extract(&page_url, &meta, &preview);
            }

            #[test]
            fn classifier_never_panics(input in "\\PC{0,200}") {
                if let Some(url) = crate::extractor::url::parse_http_url(&input) {
                    prop_assert!(matches!(url.scheme(), "http" | "https"));
                }
            }
        }
    }
}
