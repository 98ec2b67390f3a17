#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use bookshelf::extractor::{
    DEFAULT_PREVIEW_CHARS, extract_content_preview, extract_meta_tags,
    heuristics::heuristic_extract, redirect::find_source_link,
};
use bookshelf::llm::sanitize::{parse_response, sanitize, validate_with_fallback};

fuzz_target!(|data: &[u8]| {
    // Convert raw bytes to string, handling invalid UTF-8 gracefully
    let html = String::from_utf8_lossy(data);
    let page_url = Url::parse("https://tldr.tech/tech/2024-05-01").unwrap();

    // None of the extractors may panic on arbitrary markup
    let meta = extract_meta_tags(&html);
    let preview = extract_content_preview(&html, DEFAULT_PREVIEW_CHARS);
    assert!(preview.chars().count() <= DEFAULT_PREVIEW_CHARS);
    let _ = find_source_link(&html, &page_url);
    let _ = heuristic_extract(&page_url, &meta, &preview);

    // Model replies are just as untrusted as pages
    if let Ok(raw) = parse_response(&html)
        && let Ok(sanitized) = sanitize(&raw)
    {
        let _ = validate_with_fallback(sanitized);
    }
});
