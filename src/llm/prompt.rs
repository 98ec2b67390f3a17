use serde_json::json;

use crate::extractor::{
    meta::MetaTags,
    model::{ArticleTag, ExtractionCandidate, Genre},
    preview::{DEFAULT_PREVIEW_CHARS, truncate_chars},
};

fn quoted(values: impl Iterator<Item = &'static str>) -> Vec<String> {
    values.map(|v| format!("\"{v}\"")).collect()
}

/// Instructions pinning the model to JSON-only output in the candidate shape.
pub fn system_prompt() -> String {
    let genres = quoted(Genre::ALL.iter().map(|g| g.as_str())).join("|");
    let tags = quoted(ArticleTag::ALL.iter().map(|t| t.as_str())).join(",");

    format!(
        r#"You output ONLY JSON. Use this type:

type Work = {{
  kind: "book" | "article";
  title: string;
  authors: string[];            // Use your knowledge to infer if not provided
  year?: number;                // Use your knowledge to infer if not provided
  pages?: number;               // Books only; use your knowledge if not provided
  genre?: {genres};
  tags?: string[];              // from: [{tags}]
  description?: string;         // One or two sentences
  url?: string;
}};

Rules:
- Use the provided text/meta as primary source, but you may use your knowledge to fill in missing information.
- For missing author/year/pages/description: use your knowledge of the work to infer these values when possible.
- Keep authors as plain names (array of strings).
- No prose, no backticks. JSON only.
- For genre: use only the provided list. Infer from title/content if not specified.
- For tags: use only from the provided list. Infer from content if not specified.
- When you infer information, ensure it's accurate based on your knowledge of the work."#
    )
}

/// JSON context sent as the user turn. The preview is re-capped here so the
/// payload stays bounded whatever the caller passes in.
pub fn user_payload(
    url: Option<&str>,
    meta: &MetaTags,
    content_preview: &str,
    seed: Option<&ExtractionCandidate>,
) -> String {
    json!({
        "url": url,
        "meta": {
            "title": meta.title,
            "description": meta.description,
            "author": meta.author,
            "published": meta.year,
            "siteName": meta.site_name,
        },
        "contentPreview": truncate_chars(content_preview, DEFAULT_PREVIEW_CHARS),
        "heuristicCandidate": seed,
    })
    .to_string()
}
