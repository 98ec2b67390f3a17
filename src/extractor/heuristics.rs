use chrono::{Datelike, Utc};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::extractor::{
    meta::MetaTags,
    model::{ExtractionCandidate, Kind, Provenance, YEAR_MIN},
    url::{bare_host, is_url},
};

/// Host labels of book retailers and catalogues.
const BOOK_HOST_LABELS: &[&str] = &[
    "amazon",
    "goodreads",
    "barnesandnoble",
    "bookshop",
    "openlibrary",
    "abebooks",
    "audible",
];
const BOOK_PATH_SEGMENTS: &[&str] = &["book", "books"];
const BOOK_CONTENT_KEYWORDS: &[&str] = &["isbn", "chapter", "published by", "book by"];

/// Second-level suffixes that push the site label one step to the left
/// (`bbc.co.uk` -> `bbc`).
const SECOND_LEVEL_SUFFIXES: &[&str] = &["co", "com", "org", "net", "ac", "gov", "edu"];

const KNOWN_PUBLICATIONS: &[(&str, &str)] = &[
    ("medium", "Medium"),
    ("substack", "Substack"),
    ("nytimes", "The New York Times"),
    ("washingtonpost", "The Washington Post"),
    ("theguardian", "The Guardian"),
    ("theatlantic", "The Atlantic"),
    ("newyorker", "The New Yorker"),
    ("economist", "The Economist"),
    ("bbc", "BBC"),
    ("wired", "Wired"),
    ("techcrunch", "TechCrunch"),
    ("theverge", "The Verge"),
    ("arstechnica", "Ars Technica"),
    ("quantamagazine", "Quanta Magazine"),
    ("hbr", "Harvard Business Review"),
    ("github", "GitHub"),
    ("stackoverflow", "Stack Overflow"),
    ("ycombinator", "Hacker News"),
    ("dev", "DEV Community"),
];

static PATH_YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/(\d{4})/").unwrap());

/// Book or article, from the URL alone when there is one, otherwise from
/// keywords in the description or preview text.
pub fn infer_kind(url: Option<&Url>, meta: &MetaTags, content: &str) -> Kind {
    if let Some(url) = url {
        return if is_book_url(url) { Kind::Book } else { Kind::Article };
    }

    let text = meta
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(content)
        .to_lowercase();
    if BOOK_CONTENT_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        Kind::Book
    } else {
        Kind::Article
    }
}

fn is_book_url(url: &Url) -> bool {
    if let Some(host) = bare_host(url) {
        if host.starts_with("books.") || host.split('.').any(|label| BOOK_HOST_LABELS.contains(&label)) {
            return true;
        }
    }

    let path = url.path().to_lowercase();
    if path.contains("isbn") || url.query().is_some_and(|q| q.to_lowercase().contains("isbn")) {
        return true;
    }
    path.split('/').any(|segment| BOOK_PATH_SEGMENTS.contains(&segment))
}

/// Publication name for an article: explicit meta, then site name, then the
/// host.
pub fn infer_publication(url: &Url, meta: &MetaTags) -> Option<String> {
    // article:publisher is frequently a social profile URL rather than a name
    let explicit = meta
        .publication
        .as_deref()
        .filter(|p| !looks_like_link(p));

    explicit
        .or(meta.site_name.as_deref())
        .map(str::to_string)
        .or_else(|| publication_from_host(url))
}

fn looks_like_link(value: &str) -> bool {
    is_url(value) || value.starts_with("www.") || value.contains("://")
}

pub fn publication_from_host(url: &Url) -> Option<String> {
    let host = bare_host(url)?;
    let label = site_label(&host)?;
    KNOWN_PUBLICATIONS
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, name)| name.to_string())
        .or_else(|| Some(title_case(label)))
}

fn site_label(host: &str) -> Option<&str> {
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    match labels.len() {
        0 => None,
        1 => Some(labels[0]),
        n if n >= 3
            && SECOND_LEVEL_SUFFIXES.contains(&labels[n - 2])
            && labels[n - 1].len() == 2 =>
        {
            Some(labels[n - 3])
        }
        n => Some(labels[n - 2]),
    }
}

fn title_case(label: &str) -> String {
    label
        .split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn latest_plausible_year() -> i32 {
    Utc::now().year() + 1
}

fn plausible_year(year: i32) -> Option<i32> {
    (YEAR_MIN..=latest_plausible_year())
        .contains(&year)
        .then_some(year)
}

/// First `/YYYY/` path segment that is a plausible publish year.
pub fn year_from_path(url: &Url) -> Option<i32> {
    PATH_YEAR_REGEX
        .captures_iter(url.path())
        .filter_map(|c| c[1].parse::<i32>().ok())
        .find_map(plausible_year)
}

/// Zero-cost candidate built from page metadata and URL shape only.
pub fn heuristic_extract(url: &Url, meta: &MetaTags, content_preview: &str) -> ExtractionCandidate {
    let kind = infer_kind(Some(url), meta, content_preview);

    let authors = meta
        .author
        .iter()
        .filter(|a| !looks_like_link(a))
        .cloned()
        .collect();

    let year = meta
        .year
        .as_deref()
        .and_then(|y| y.parse::<i32>().ok())
        .and_then(plausible_year)
        .or_else(|| year_from_path(url));

    let publication = match kind {
        Kind::Article => infer_publication(url, meta),
        Kind::Book => None,
    };

    ExtractionCandidate {
        kind,
        title: meta.title.clone().unwrap_or_default(),
        authors,
        publication,
        year,
        description: meta.description.clone(),
        url: Some(url.to_string()),
        source: Provenance::Heuristic,
        ..Default::default()
    }
}
