pub mod prompt;
pub mod runner;
pub mod sanitize;

pub use runner::{ChatMessage, ModelError, ModelRequest, ModelResponse, ModelRunner, Role, WorkersAiRunner};

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::extractor::{
    meta::MetaTags,
    model::{ExtractionCandidate, Provenance},
};

/// Reply length cap; the candidate JSON fits comfortably.
pub const MAX_TOKENS: u32 = 200;
/// Low temperature keeps the structured output close to deterministic.
pub const TEMPERATURE: f32 = 0.2;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("No response from AI")]
    EmptyResponse,

    #[error("Failed to parse AI response")]
    Parse,

    #[error("AI response did not include a title")]
    EmptyTitle,

    #[error("AI response validation failed: {0}")]
    Validation(String),
}

/// Second extraction tier: asks a model to fill the candidate, then trusts
/// nothing it says until sanitized and validated.
#[derive(Clone)]
pub struct LlmExtractor {
    runner: Arc<dyn ModelRunner>,
    model: String,
}

impl LlmExtractor {
    pub fn new(runner: Arc<dyn ModelRunner>, model: impl Into<String>) -> Self {
        Self {
            runner,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One model call, no retries. Fields the model leaves out are taken
    /// from `seed` when it has them.
    #[instrument(skip_all, fields(model = %self.model, url = url.unwrap_or("")))]
    pub async fn extract(
        &self,
        seed: Option<&ExtractionCandidate>,
        meta: &MetaTags,
        content_preview: &str,
        url: Option<&str>,
    ) -> Result<ExtractionCandidate, LlmError> {
        let request = ModelRequest {
            messages: vec![
                ChatMessage::system(prompt::system_prompt()),
                ChatMessage::user(prompt::user_payload(url, meta, content_preview, seed)),
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let reply = self.runner.run(&self.model, &request).await?;
        let text = reply.response.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        debug!(chars = text.len(), "model replied");

        let parsed = sanitize::parse_response(text)?;
        let sanitized = sanitize::sanitize(&parsed)?;
        let validated = sanitize::validate_with_fallback(sanitized)?;

        Ok(merge(validated, seed, url))
    }
}

fn merge(
    mut candidate: ExtractionCandidate,
    seed: Option<&ExtractionCandidate>,
    url: Option<&str>,
) -> ExtractionCandidate {
    if let Some(seed) = seed {
        if !candidate.has_title() {
            candidate.title = seed.title.clone();
        }
        if candidate.authors.is_empty() {
            candidate.authors = seed.authors.clone();
        }
        if candidate.year.is_none() {
            candidate.year = seed.year;
        }
        if candidate.publication.is_none() {
            candidate.publication = seed.publication.clone();
        }
        if candidate.description.is_none() {
            candidate.description = seed.description.clone();
        }
    }

    if candidate.url.is_none() {
        candidate.url = url
            .map(str::to_string)
            .or_else(|| seed.and_then(|s| s.url.clone()));
    }
    candidate.source = Provenance::Llm;
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::model::{Genre, Kind};
    use crate::llm::runner::MockModelRunner;
    use mockall::predicate::*;

    fn extractor_replying(reply: &'static str) -> LlmExtractor {
        let mut runner = MockModelRunner::new();
        runner
            .expect_run()
            .with(eq("@cf/test-model"), always())
            .times(1)
            .returning(move |_, _| {
                Ok(ModelResponse {
                    response: reply.to_string(),
                })
            });
        LlmExtractor::new(Arc::new(runner), "@cf/test-model")
    }

    fn seed() -> ExtractionCandidate {
        ExtractionCandidate {
            kind: Kind::Book,
            title: "Clean Code".to_string(),
            authors: vec!["Uncle Bob".to_string()],
            year: Some(2008),
            url: Some("https://www.amazon.com/dp/0132350884".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_request_shape() {
        let mut runner = MockModelRunner::new();
        runner
            .expect_run()
            .withf(|model, request| {
                model == "@cf/test-model"
                    && request.max_tokens == MAX_TOKENS
                    && (request.temperature - TEMPERATURE).abs() < f32::EPSILON
                    && request.messages.len() == 2
                    && request.messages[0].role == Role::System
                    && request.messages[1].role == Role::User
                    && request.messages[1].content.contains("I read Dune")
            })
            .times(1)
            .returning(|_, _| {
                Ok(ModelResponse {
                    response: r#"{"kind":"book","title":"Dune","authors":["Frank Herbert"]}"#.to_string(),
                })
            });
        let extractor = LlmExtractor::new(Arc::new(runner), "@cf/test-model");

        let candidate = extractor
            .extract(None, &MetaTags::default(), "I read Dune", None)
            .await
            .unwrap();
        assert_eq!(candidate.title, "Dune");
        assert_eq!(candidate.source, Provenance::Llm);
        assert_eq!(candidate.url, None);
    }

    #[tokio::test]
    async fn test_model_output_backfilled_from_seed() {
        let extractor = extractor_replying(
            r#"Here you go: {"kind": "book", "title": "Clean Code", "authors": [], "genre": "technology", "pages": "464"}"#,
        );
        let seed = seed();

        let candidate = extractor
            .extract(Some(&seed), &MetaTags::default(), "", seed.url.as_deref())
            .await
            .unwrap();

        assert_eq!(candidate.kind, Kind::Book);
        assert_eq!(candidate.authors, vec!["Uncle Bob".to_string()]);
        assert_eq!(candidate.year, Some(2008));
        assert_eq!(candidate.pages, Some(464));
        assert_eq!(candidate.genre, Some(Genre::Technology));
        assert_eq!(candidate.url.as_deref(), Some("https://www.amazon.com/dp/0132350884"));
        assert_eq!(candidate.source, Provenance::Llm);
    }

    #[tokio::test]
    async fn test_model_values_win_over_seed() {
        let extractor = extractor_replying(
            r#"{"kind": "book", "title": "Clean Code", "authors": ["Robert C. Martin"], "year": 2009}"#,
        );
        let seed = seed();
        let candidate = extractor
            .extract(Some(&seed), &MetaTags::default(), "", None)
            .await
            .unwrap();
        assert_eq!(candidate.authors, vec!["Robert C. Martin".to_string()]);
        assert_eq!(candidate.year, Some(2009));
    }

    #[tokio::test]
    async fn test_unparseable_reply() {
        let extractor = extractor_replying("Sorry, I can't do that.");
        let err = extractor
            .extract(None, &MetaTags::default(), "text", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Parse));
        assert_eq!(err.to_string(), "Failed to parse AI response");
    }

    #[tokio::test]
    async fn test_empty_reply() {
        let extractor = extractor_replying("   ");
        let err = extractor
            .extract(None, &MetaTags::default(), "text", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let mut runner = MockModelRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_, _| Err(ModelError::Transport("connection reset".to_string())));
        let extractor = LlmExtractor::new(Arc::new(runner), "@cf/test-model");

        let err = extractor
            .extract(None, &MetaTags::default(), "text", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Model(ModelError::Transport(_))));
    }
}
