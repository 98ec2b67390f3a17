use thiserror::Error;

/// Every variant renders with the same `failed to fetch URL` prefix; callers
/// only ever surface the message, the variant is kept for logs and tests.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to fetch URL: invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to fetch URL: unsupported scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("failed to fetch URL: request timed out")]
    Timeout,

    #[error("failed to fetch URL: HTTP {0}")]
    Http(reqwest::StatusCode),

    #[error("failed to fetch URL: body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("failed to fetch URL: unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("failed to fetch URL: {0}")]
    Network(String),
}

impl FetchError {
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Http(status)
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_share_prefix() {
        let errors = [
            FetchError::InvalidUrl(url::ParseError::EmptyHost),
            FetchError::UnsupportedScheme("ftp".to_string()),
            FetchError::Timeout,
            FetchError::Http(reqwest::StatusCode::NOT_FOUND),
            FetchError::BodyTooLarge(10),
            FetchError::UnsupportedContentType("image/png".to_string()),
            FetchError::Network("connection refused".to_string()),
        ];
        for err in errors {
            assert!(err.to_string().starts_with("failed to fetch URL: "), "{err}");
        }
    }

    #[test]
    fn test_http_message_carries_status() {
        let err = FetchError::Http(reqwest::StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "failed to fetch URL: HTTP 403 Forbidden");
    }
}
