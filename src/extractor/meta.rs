use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

static META_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").unwrap());
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

/// Metadata lifted from a page's `<head>`. Every field is optional and
/// blank values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTags {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Four-digit publish year.
    pub year: Option<String>,
    pub description: Option<String>,
    pub publication: Option<String>,
    pub site_name: Option<String>,
}

/// Best-effort metadata extraction. Malformed markup yields absent fields,
/// never an error.
pub fn extract_meta_tags(html: &str) -> MetaTags {
    let document = Html::parse_document(html);

    // First occurrence of each key wins; keys may live in `property`, `name`
    // or `itemprop` depending on the publisher.
    let mut tags: HashMap<String, String> = HashMap::new();
    for element in document.select(&META_SELECTOR) {
        let element = element.value();
        let Some(content) = element.attr("content").map(clean_text) else {
            continue;
        };
        if content.is_empty() {
            continue;
        }
        for attr in ["property", "name", "itemprop"] {
            if let Some(key) = element.attr(attr) {
                tags.entry(key.trim().to_ascii_lowercase())
                    .or_insert_with(|| content.clone());
            }
        }
    }

    let title_tag = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|title| clean_text(&title.text().collect::<String>()))
        .filter(|title| !title.is_empty());

    let year = ["article:published_time", "datepublished", "date"]
        .iter()
        .filter_map(|key| tags.get(*key))
        .find_map(|raw| parse_year(raw));

    MetaTags {
        title: tags.get("og:title").cloned().or(title_tag),
        author: first_of(&tags, &["article:author", "author"]),
        year,
        description: first_of(&tags, &["og:description", "description"]),
        publication: tags.get("article:publisher").cloned(),
        site_name: tags.get("og:site_name").cloned(),
    }
}

fn first_of(tags: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| tags.get(*key).cloned())
}

fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Year of an ISO-ish timestamp, as a four-digit string.
pub fn parse_year(raw: &str) -> Option<String> {
    let raw = raw.trim();

    let year = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.year()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.year()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        dt.year()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        date.year()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y/%m/%d") {
        date.year()
    } else if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.parse().ok()?
    } else {
        return None;
    };

    (1000..=9999).contains(&year).then(|| year.to_string())
}
