use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::extractor::url::is_aggregator;

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static READ_MORE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)read\s*more").unwrap());

/// Locates the link an aggregator page points at, resolved against `page_url`.
///
/// Three passes over the anchors, first hit wins:
/// 1. anchor text mentioning "source";
/// 2. absolute link whose `class` mentions "source";
/// 3. absolute "read more" link leaving the aggregator.
pub fn find_source_link(html: &str, page_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let anchors: Vec<ElementRef<'_>> = document.select(&ANCHOR_SELECTOR).collect();

    let by_text = anchors
        .iter()
        .filter(|a| anchor_text(a).contains("source"))
        .find_map(|a| resolve(a, page_url));
    if by_text.is_some() {
        return by_text;
    }

    let by_class = anchors
        .iter()
        .filter(|a| is_absolute(a))
        .filter(|a| {
            a.value()
                .attr("class")
                .is_some_and(|class| class.to_lowercase().contains("source"))
        })
        .find_map(|a| resolve(a, page_url));
    if by_class.is_some() {
        return by_class;
    }

    anchors
        .iter()
        .filter(|a| is_absolute(a))
        .filter(|a| READ_MORE_REGEX.is_match(&anchor_text(a)))
        .filter_map(|a| resolve(a, page_url))
        .find(|url| !is_aggregator(url))
}

fn anchor_text(anchor: &ElementRef<'_>) -> String {
    anchor.text().collect::<String>().to_lowercase()
}

fn is_absolute(anchor: &ElementRef<'_>) -> bool {
    anchor.value().attr("href").is_some_and(|href| {
        let href = href.trim().to_ascii_lowercase();
        href.starts_with("http://") || href.starts_with("https://")
    })
}

fn resolve(anchor: &ElementRef<'_>, page_url: &Url) -> Option<Url> {
    let href = anchor.value().attr("href")?.trim();
    let resolved = page_url.join(href).ok()?;
    let usable = matches!(resolved.scheme(), "http" | "https") && resolved != *page_url;
    usable.then_some(resolved)
}
