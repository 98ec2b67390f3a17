use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;

/// How far into the document a `<meta charset>` declaration is looked for.
const SNIFF_WINDOW: usize = 4096;

static HEADER_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

// Matches both `<meta charset="x">` and the http-equiv form whose content
// attribute carries `charset=x`.
static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s[^>]*?charset\s*=\s*["']?([^"'\s;/>]+)"#).unwrap());

/// Picks the body encoding: Content-Type header, then an in-document
/// declaration, then statistical detection.
pub fn detect_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    if let Some(encoding) = label_from(&HEADER_CHARSET_REGEX, content_type) {
        return encoding;
    }

    let window = &body[..body.len().min(SNIFF_WINDOW)];
    let head = String::from_utf8_lossy(window);
    if let Some(encoding) = label_from(&META_CHARSET_REGEX, &head) {
        return encoding;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(window, body.len() <= SNIFF_WINDOW);
    detector.guess(None, true)
}

/// Decodes lossily; malformed sequences become U+FFFD rather than failing
/// the fetch.
pub fn decode_body(content_type: &str, body: &[u8]) -> (String, &'static Encoding) {
    let encoding = detect_encoding(content_type, body);
    let (decoded, actual, _had_errors) = encoding.decode(body);
    (decoded.into_owned(), actual)
}

fn label_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}
