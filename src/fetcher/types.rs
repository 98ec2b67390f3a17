use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use url::Url;

use crate::fetcher::errors::FetchError;

#[derive(Debug, Clone)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub body_utf8: String,
    /// Label of the encoding the body was decoded from.
    pub encoding: &'static str,
    pub fetched_at: DateTime<Utc>,
}

impl PageResponse {
    /// Build a response for an already-decoded HTML document.
    pub fn from_html(url_final: Url, html: impl Into<String>) -> Self {
        Self {
            url_final,
            status: StatusCode::OK,
            body_utf8: html.into(),
            encoding: "UTF-8",
            fetched_at: Utc::now(),
        }
    }
}

/// Retrieves raw HTML for a URL. The only network boundary of the extraction
/// pipeline; every call is a single attempt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageResponse, FetchError>;
}
