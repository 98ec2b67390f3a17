//! Defensive handling of model output.
//!
//! The model is untrusted: its reply may wrap the JSON in prose, use the
//! wrong types, or invent values outside our vocabularies. Output goes
//! through four steps, each of which can only narrow what survives:
//! isolate the JSON, coerce field by field, validate against the strict
//! schema, and if that still fails, validate a minimal fallback instead.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::extractor::{
    model::{
        ArticleTag, ExtractionCandidate, Genre, Kind, PAGES_MAX, PAGES_MIN, Provenance, YEAR_MAX,
        YEAR_MIN, pages_in_range, year_in_range,
    },
    url::is_url,
};
use crate::llm::LlmError;

pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// The JSON the model meant to return: the first balanced `{...}` that
/// parses, else the first balanced `[...]` that parses. Brackets inside JSON
/// strings don't count, and stray brackets in surrounding prose are skipped.
pub fn extract_json_block(text: &str) -> Option<&str> {
    ['{', '['].into_iter().find_map(|open| {
        text.match_indices(open)
            .filter_map(|(start, _)| balanced_block(text, start))
            .find(|block| serde_json::from_str::<Value>(block).is_ok())
    })
}

fn balanced_block(text: &str, start: usize) -> Option<&str> {
    let mut closers: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => closers.push(b'}'),
            b'[' => closers.push(b']'),
            b'}' | b']' => {
                if closers.pop() != Some(*byte) {
                    return None;
                }
                if closers.is_empty() {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parses the model reply into a JSON object. An array reply contributes its
/// first object.
pub fn parse_response(text: &str) -> Result<Map<String, Value>, LlmError> {
    let candidate = extract_json_block(text).unwrap_or_else(|| text.trim());
    let value: Value = serde_json::from_str(candidate).map_err(|_| LlmError::Parse)?;

    match value {
        Value::Object(object) => Ok(object),
        Value::Array(items) => items
            .into_iter()
            .find_map(|item| match item {
                Value::Object(object) => Some(object),
                _ => None,
            })
            .ok_or(LlmError::Parse),
        _ => Err(LlmError::Parse),
    }
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

/// A list of strings, accepting a lone string where an array was expected.
fn as_text_list(value: &Value, split_commas: bool) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        Value::String(s) if split_commas => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        other => as_text(other).into_iter().collect(),
    }
}

/// Coerces every known field, dropping anything out of range or outside the
/// closed vocabularies. Fails only when no title survives.
pub fn sanitize(raw: &Map<String, Value>) -> Result<Value, LlmError> {
    let title = raw.get("title").and_then(as_text).ok_or(LlmError::EmptyTitle)?;

    let kind = raw
        .get("kind")
        .or_else(|| raw.get("type"))
        .and_then(Value::as_str)
        .map(Kind::parse_or_default)
        .unwrap_or_default();

    let authors = raw
        .get("authors")
        .or_else(|| raw.get("author"))
        .map(|v| as_text_list(v, false))
        .unwrap_or_default();

    let mut out = Map::new();
    out.insert("kind".into(), json!(kind));
    out.insert("title".into(), json!(title));
    out.insert("authors".into(), json!(authors));

    if let Some(year) = raw.get("year").and_then(as_integer).and_then(year_in_range) {
        out.insert("year".into(), json!(year));
    }

    if kind == Kind::Book {
        let pages = raw
            .get("pages")
            .or_else(|| raw.get("pageCount"))
            .and_then(as_integer)
            .and_then(pages_in_range);
        if let Some(pages) = pages {
            out.insert("pages".into(), json!(pages));
        }
    }

    if let Some(genre) = raw.get("genre").and_then(Value::as_str).and_then(Genre::parse) {
        out.insert("genre".into(), json!(genre));
    }

    if let Some(tags) = raw.get("tags") {
        let mut kept: Vec<ArticleTag> = Vec::new();
        for tag in as_text_list(tags, true).iter().filter_map(|t| ArticleTag::parse(t)) {
            if !kept.contains(&tag) {
                kept.push(tag);
            }
        }
        if !kept.is_empty() {
            out.insert("tags".into(), json!(kept));
        }
    }

    if let Some(description) = raw.get("description").and_then(as_text) {
        let capped: String = description.chars().take(MAX_DESCRIPTION_CHARS).collect();
        out.insert("description".into(), json!(capped.trim_end()));
    }

    if let Some(url) = raw.get("url").and_then(as_text).filter(|u| is_url(u)) {
        out.insert("url".into(), json!(url));
    }

    // Provenance is ours to decide, not the model's
    out.insert("source".into(), json!(Provenance::Llm));

    Ok(Value::Object(out))
}

/// The strict shape a model answer must have before it becomes a candidate.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkSchema {
    kind: Kind,
    title: String,
    authors: Vec<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    pages: Option<u32>,
    #[serde(default)]
    genre: Option<Genre>,
    #[serde(default)]
    tags: Option<Vec<ArticleTag>>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    source: Provenance,
}

impl WorkSchema {
    fn check(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is empty".to_string());
        }
        if self.authors.iter().any(|a| a.trim().is_empty()) {
            return Err("blank author".to_string());
        }
        if let Some(year) = self.year
            && !(YEAR_MIN..=YEAR_MAX).contains(&year)
        {
            return Err(format!("year {year} out of range"));
        }
        if let Some(pages) = self.pages
            && !(PAGES_MIN..=PAGES_MAX).contains(&pages)
        {
            return Err(format!("pages {pages} out of range"));
        }
        if self
            .description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_CHARS)
        {
            return Err("description too long".to_string());
        }
        if self.url.as_deref().is_some_and(|u| !is_url(u)) {
            return Err("url is not absolute http(s)".to_string());
        }
        Ok(())
    }
}

impl From<WorkSchema> for ExtractionCandidate {
    fn from(work: WorkSchema) -> Self {
        Self {
            kind: work.kind,
            title: work.title,
            authors: work.authors,
            publication: None,
            year: work.year,
            pages: work.pages,
            genre: work.genre,
            tags: work.tags.unwrap_or_default(),
            description: work.description,
            url: work.url,
            source: work.source,
        }
    }
}

/// Strict validation of an already-sanitized object.
pub fn validate(value: Value) -> Result<ExtractionCandidate, LlmError> {
    let work: WorkSchema =
        serde_json::from_value(value).map_err(|e| LlmError::Validation(e.to_string()))?;
    work.check().map_err(LlmError::Validation)?;
    Ok(work.into())
}

/// Only the fields that are always schema-conformant once sanitized.
fn safe_fallback(value: &Value) -> Value {
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .map(Kind::parse_or_default)
        .unwrap_or_default();
    let title = value.get("title").and_then(as_text).unwrap_or_default();
    let authors: Vec<String> = value
        .get("authors")
        .map(|v| as_text_list(v, false))
        .unwrap_or_default();

    json!({
        "kind": kind,
        "title": title,
        "authors": authors,
        "source": Provenance::Llm,
    })
}

/// Rich result first; if the strict schema rejects it, the minimal fallback.
pub fn validate_with_fallback(sanitized: Value) -> Result<ExtractionCandidate, LlmError> {
    let fallback = safe_fallback(&sanitized);
    match validate(sanitized) {
        Ok(candidate) => Ok(candidate),
        Err(err) => {
            warn!(error = %err, "sanitized model output failed validation, using safe fallback");
            validate(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_json_block_in_prose() {
        let text = "Sure! Here is the JSON:\n```json\n{\"title\": \"Dune\", \"authors\": [\"Frank Herbert\"]}\n```\nHope it helps {not json}";
        assert_eq!(
            extract_json_block(text),
            Some("{\"title\": \"Dune\", \"authors\": [\"Frank Herbert\"]}")
        );
    }

    #[test]
    fn test_json_block_ignores_braces_in_strings() {
        let text = r#"{"title": "Braces } and \" quotes {", "kind": "book"} trailing"#;
        assert_eq!(
            extract_json_block(text),
            Some(r#"{"title": "Braces } and \" quotes {", "kind": "book"}"#)
        );
    }

    #[test]
    fn test_json_block_array_and_unbalanced() {
        assert_eq!(extract_json_block(r#"[1, 2] x"#), Some("[1, 2]"));
        assert_eq!(extract_json_block(r#"[{"a": 1}] x"#), Some(r#"{"a": 1}"#));
        assert_eq!(extract_json_block(r#"{"a": [1, 2}"#), None);
        assert_eq!(extract_json_block("no json here"), None);
    }

    #[test]
    fn test_json_block_skips_brackets_in_prose() {
        let text = r#"Answer [JSON]: {"title": "Dune", "kind": "book"}"#;
        assert_eq!(
            extract_json_block(text),
            Some(r#"{"title": "Dune", "kind": "book"}"#)
        );

        let text = r#"Use {title} format: {"title": "Dune"} (see [1])"#;
        assert_eq!(extract_json_block(text), Some(r#"{"title": "Dune"}"#));

        let map = parse_response(r#"Answer [JSON]: {"title": "Dune", "kind": "book"}"#).unwrap();
        assert_eq!(map["title"], "Dune");
        assert_eq!(map["kind"], "book");
    }

    #[test]
    fn test_parse_response() {
        let map = parse_response(r#"{"title": "X"}"#).unwrap();
        assert_eq!(map["title"], "X");

        let map = parse_response(r#"Result: [1, {"title": "Y"}]"#).unwrap();
        assert_eq!(map["title"], "Y");

        assert!(matches!(parse_response("I cannot help with that."), Err(LlmError::Parse)));
        assert!(matches!(parse_response("{\"title\": \"cut off"), Err(LlmError::Parse)));
        assert!(matches!(parse_response("[1, 2]"), Err(LlmError::Parse)));
    }

    #[test]
    fn test_bad_year_is_dropped_and_kind_defaults() {
        let raw = object(json!({"year": "not-a-number", "title": "X"}));
        let sanitized = sanitize(&raw).unwrap();
        assert_eq!(sanitized["title"], "X");
        assert_eq!(sanitized["kind"], "article");
        assert!(sanitized.get("year").is_none());

        let candidate = validate_with_fallback(sanitized).unwrap();
        assert_eq!(candidate.title, "X");
        assert_eq!(candidate.kind, Kind::Article);
        assert_eq!(candidate.year, None);
    }

    #[test]
    fn test_out_of_range_numbers_are_dropped_not_clamped() {
        for year in [json!(1899), json!(2101), json!("3000"), json!(-5)] {
            let raw = object(json!({"title": "T", "year": year}));
            assert!(sanitize(&raw).unwrap().get("year").is_none());
        }
        for pages in [json!(0), json!(10_001), json!("lots")] {
            let raw = object(json!({"title": "T", "kind": "book", "pages": pages}));
            assert!(sanitize(&raw).unwrap().get("pages").is_none());
        }
    }

    #[test]
    fn test_type_coercion() {
        let raw = object(json!({
            "kind": "BOOK",
            "title": "  Clean Code  ",
            "authors": "Robert C. Martin",
            "year": "2008",
            "pages": 464.0,
            "genre": "Technology",
            "tags": "programming, AI, blockchain, programming",
            "description": "  A handbook of agile software craftsmanship.  ",
            "url": "https://www.amazon.com/dp/0132350884",
            "source": "heuristic"
        }));
        let candidate = validate_with_fallback(sanitize(&raw).unwrap()).unwrap();

        assert_eq!(candidate.kind, Kind::Book);
        assert_eq!(candidate.title, "Clean Code");
        assert_eq!(candidate.authors, vec!["Robert C. Martin".to_string()]);
        assert_eq!(candidate.year, Some(2008));
        assert_eq!(candidate.pages, Some(464));
        assert_eq!(candidate.genre, Some(Genre::Technology));
        assert_eq!(candidate.tags, vec![ArticleTag::Programming, ArticleTag::Ai]);
        assert_eq!(
            candidate.description.as_deref(),
            Some("A handbook of agile software craftsmanship.")
        );
        assert_eq!(candidate.source, Provenance::Llm);
    }

    #[test]
    fn test_pages_dropped_for_articles() {
        let raw = object(json!({"title": "T", "kind": "article", "pages": 12}));
        assert!(sanitize(&raw).unwrap().get("pages").is_none());
    }

    #[test]
    fn test_untrusted_strings_are_filtered() {
        let raw = object(json!({
            "title": "T",
            "genre": "poetry",
            "tags": ["crypto"],
            "url": "javascript:alert(1)",
            "authors": ["", "  ", "Ann"],
            "description": "d".repeat(5000)
        }));
        let sanitized = sanitize(&raw).unwrap();
        assert!(sanitized.get("genre").is_none());
        assert!(sanitized.get("tags").is_none());
        assert!(sanitized.get("url").is_none());
        assert_eq!(sanitized["authors"], json!(["Ann"]));
        assert_eq!(
            sanitized["description"].as_str().unwrap().chars().count(),
            MAX_DESCRIPTION_CHARS
        );
    }

    #[test]
    fn test_missing_or_blank_title_is_rejected() {
        for raw in [json!({}), json!({"title": "   "}), json!({"title": ["x"]})] {
            assert!(matches!(sanitize(&object(raw)), Err(LlmError::EmptyTitle)));
        }
    }

    #[test]
    fn test_strict_schema_falls_back_to_minimal_object() {
        let risky = json!({
            "kind": "book",
            "title": "Dune",
            "authors": ["Frank Herbert"],
            "genre": "space-opera",
            "year": 1965,
            "source": "llm"
        });
        assert!(matches!(validate(risky.clone()), Err(LlmError::Validation(_))));

        let candidate = validate_with_fallback(risky).unwrap();
        assert_eq!(candidate.kind, Kind::Book);
        assert_eq!(candidate.title, "Dune");
        assert_eq!(candidate.authors, vec!["Frank Herbert".to_string()]);
        assert_eq!(candidate.year, None);
        assert_eq!(candidate.genre, None);
    }

    #[test]
    fn test_fallback_with_unusable_title_still_fails() {
        let broken = json!({"kind": "book", "title": "", "authors": [], "source": "llm"});
        assert!(matches!(
            validate_with_fallback(broken),
            Err(LlmError::Validation(_))
        ));
    }
}
