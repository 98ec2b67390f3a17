use url::Url;

/// Host substrings of digest sites whose pages link out to the real article.
pub const AGGREGATOR_HOST_PATTERNS: &[&str] = &["tldr"];

/// True iff `input` is an absolute `http`/`https` URL. Never fails.
pub fn is_url(input: &str) -> bool {
    parse_http_url(input).is_some()
}

pub fn parse_http_url(input: &str) -> Option<Url> {
    let url = Url::parse(input).ok()?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Some(url),
        _ => None,
    }
}

/// Lowercased host without a leading `www.`.
pub fn bare_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

pub fn is_aggregator(url: &Url) -> bool {
    bare_host(url).is_some_and(|host| {
        AGGREGATOR_HOST_PATTERNS
            .iter()
            .any(|pattern| host.contains(pattern))
    })
}
