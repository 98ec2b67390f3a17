use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    Client, ClientBuilder,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::fetcher::{
    decode::decode_body,
    errors::FetchError,
    types::{PageFetcher, PageResponse},
};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; BookshelfBot/1.0)";

/// `reqwest`-backed page fetcher. Cheap to clone; the underlying client pools
/// connections.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &str) -> Result<PageResponse, FetchError> {
        let parsed_url = url::Url::parse(url)?;
        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme(parsed_url.scheme().to_string()));
        }

        let mut response = self
            .client
            .get(parsed_url)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status));
        }

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let url_final = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        // Content-Length may be absent or wrong after decompression, so the
        // cap is enforced while streaming
        let mut body_bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(FetchError::from_reqwest_error)?
        {
            let received = (body_bytes.len() + chunk.len()) as u64;
            if received > MAX_BODY_SIZE {
                return Err(FetchError::BodyTooLarge(received));
            }
            body_bytes.extend_from_slice(&chunk);
        }

        let (body_utf8, encoding) = decode_body(&content_type, &body_bytes);
        debug!(
            final_url = %url_final,
            encoding = encoding.name(),
            bytes = body_bytes.len(),
            "page fetched"
        );

        Ok(PageResponse {
            url_final,
            status,
            body_utf8,
            encoding: encoding.name(),
            fetched_at: Utc::now(),
        })
    }
}
