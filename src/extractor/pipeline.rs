use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::extractor::{
    heuristics::heuristic_extract,
    meta::{MetaTags, extract_meta_tags},
    model::{ExtractionCandidate, Suggestion},
    preview::{DEFAULT_PREVIEW_CHARS, extract_content_preview},
    redirect::find_source_link,
    url::{is_aggregator, parse_http_url},
};
use crate::fetcher::{FetchError, PageFetcher, PageResponse};
use crate::llm::{LlmError, LlmExtractor};

pub const DESCRIPTION_REQUIRED: &str = "Description is required";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("AI service not available. Please use manual entry or provide a URL.")]
    BackendUnavailable,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// What the fetch stage learned about the input URL.
struct PageContext {
    url: Url,
    meta: MetaTags,
    content_preview: String,
}

/// Turns a free-text description or URL into at most one suggestion.
///
/// Tiers run cheapest first: URL and meta heuristics, then the model when a
/// binding is configured, and the heuristic result again if the model fails.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    llm: Option<LlmExtractor>,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn PageFetcher>, llm: Option<LlmExtractor>) -> Self {
        Self { fetcher, llm }
    }

    /// Model id of the configured binding, if any.
    pub fn model(&self) -> Option<&str> {
        self.llm.as_ref().map(LlmExtractor::model)
    }

    #[instrument(skip_all)]
    pub async fn extract(&self, description: &str) -> Result<Vec<Suggestion>, ExtractError> {
        let input = description.trim();
        if input.is_empty() {
            return Err(ExtractError::InvalidInput(DESCRIPTION_REQUIRED.to_string()));
        }

        let mut url: Option<String> = None;
        let mut meta = MetaTags::default();
        let mut content_preview = String::new();
        let mut heuristic: Option<ExtractionCandidate> = None;

        match parse_http_url(input) {
            Some(requested) => {
                debug!(url = %requested, "input classified as URL");
                match self.load_page(requested.clone()).await {
                    Ok(page) => {
                        let candidate = heuristic_extract(&page.url, &page.meta, &page.content_preview);
                        if candidate.is_sufficient() {
                            info!(title = %candidate.title, "heuristic result sufficient, skipping model");
                            return Ok(vec![candidate.into()]);
                        }
                        url = Some(page.url.to_string());
                        meta = page.meta;
                        content_preview = page.content_preview;
                        heuristic = Some(candidate);
                    }
                    Err(err) => {
                        warn!(error = %err, "page fetch failed, continuing without page content");
                        url = Some(requested.to_string());
                    }
                }
            }
            None => {
                debug!("input classified as free text");
                content_preview = input.to_string();
            }
        }

        let usable_heuristic = heuristic.filter(ExtractionCandidate::has_title);

        let Some(llm) = &self.llm else {
            return match usable_heuristic {
                Some(candidate) => {
                    info!("no model binding, returning heuristic result");
                    Ok(vec![candidate.into()])
                }
                None => Err(ExtractError::BackendUnavailable),
            };
        };

        info!("escalating to model");
        match llm
            .extract(usable_heuristic.as_ref(), &meta, &content_preview, url.as_deref())
            .await
        {
            Ok(candidate) => Ok(vec![candidate.into()]),
            Err(err) => match usable_heuristic {
                Some(candidate) => {
                    warn!(error = %err, "model extraction failed, falling back to heuristic result");
                    Ok(vec![candidate.into()])
                }
                None => Err(err.into()),
            },
        }
    }

    /// Fetches the page, following one aggregator hop to the linked article.
    async fn load_page(&self, requested: Url) -> Result<PageContext, FetchError> {
        let page = self.fetcher.fetch(requested.as_str()).await?;

        let page = if is_aggregator(&requested) {
            self.follow_aggregator(page).await
        } else {
            page
        };

        Ok(PageContext {
            url: page.url_final,
            meta: extract_meta_tags(&page.body_utf8),
            content_preview: extract_content_preview(&page.body_utf8, DEFAULT_PREVIEW_CHARS),
        })
    }

    /// The linked article when one is found and fetchable, otherwise the
    /// aggregator page itself. Never recurses.
    async fn follow_aggregator(&self, page: PageResponse) -> PageResponse {
        let Some(source) = find_source_link(&page.body_utf8, &page.url_final) else {
            debug!(url = %page.url_final, "no source link on aggregator page");
            return page;
        };

        info!(from = %page.url_final, to = %source, "following aggregator source link");
        match self.fetcher.fetch(source.as_str()).await {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(error = %err, "source link fetch failed, using aggregator page");
                page
            }
        }
    }
}
