use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::AiConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub response: String,
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model API error ({status}): {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("model API reported failure: {0}")]
    Api(String),

    #[error("model transport error: {0}")]
    Transport(String),

    #[error("unexpected model response: {0}")]
    Decode(String),
}

/// A language-model binding. Present or not at call time; the pipeline
/// treats a missing runner as "LLM tier unavailable".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelRunner: Send + Sync {
    async fn run(&self, model: &str, request: &ModelRequest) -> Result<ModelResponse, ModelError>;
}

/// Cloudflare Workers AI over its REST API.
pub struct WorkersAiRunner {
    http: reqwest::Client,
    base_url: String,
    account_id: String,
    api_token: String,
}

impl WorkersAiRunner {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_id: config.account_id.clone(),
            api_token: config.api_token.clone(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, ModelError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_token))
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[derive(Debug, Deserialize)]
struct RunEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    errors: Vec<Value>,
    #[serde(default)]
    result: Option<RunOutput>,
    #[serde(flatten)]
    top_level: RunOutput,
}

#[derive(Debug, Default, Deserialize)]
struct RunOutput {
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    text: Option<Value>,
}

impl RunOutput {
    fn into_text(self) -> Option<String> {
        // Some models hand back already-parsed JSON instead of a string
        match self.response.or(self.text)? {
            Value::String(text) => Some(text),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[async_trait]
impl ModelRunner for WorkersAiRunner {
    async fn run(&self, model: &str, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url, self.account_id, model
        );

        debug!(model, max_tokens = request.max_tokens, "Workers AI run request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Http { status, body });
        }

        let envelope: RunEnvelope = response
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        if envelope.success == Some(false) {
            let errors = envelope
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ModelError::Api(errors));
        }

        let text = envelope
            .result
            .and_then(RunOutput::into_text)
            .or_else(|| envelope.top_level.into_text())
            .unwrap_or_default();

        Ok(ModelResponse { response: text })
    }
}
