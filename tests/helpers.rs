#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use url::Url;

use bookshelf::{
    app_state::AppState,
    extractor::Pipeline,
    fetcher::{FetchError, PageFetcher, PageResponse},
    llm::{LlmExtractor, ModelError, ModelRequest, ModelResponse, ModelRunner},
    router::router,
};

pub const TEST_MODEL: &str = "@cf/test/model";

/// Serves canned HTML by exact URL; anything else is a 404.
#[derive(Default)]
pub struct StaticPages {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticPages {
    pub fn with(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticPages {
    async fn fetch(&self, url: &str) -> Result<PageResponse, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        let parsed = Url::parse(url)?;
        match self.pages.get(url) {
            Some(html) => Ok(PageResponse::from_html(parsed, html.clone())),
            None => Err(FetchError::Http(reqwest::StatusCode::NOT_FOUND)),
        }
    }
}

/// Replies with the same text every call and counts the calls.
pub struct ScriptedModel {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelRunner for ScriptedModel {
    async fn run(&self, _model: &str, _request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(ModelResponse {
                response: text.clone(),
            }),
            Err(message) => Err(ModelError::Api(message.clone())),
        }
    }
}

pub fn test_app(pages: Arc<StaticPages>, model: Option<Arc<ScriptedModel>>) -> Router {
    let llm = model.map(|runner| LlmExtractor::new(runner, TEST_MODEL));
    router(AppState::new(Pipeline::new(pages, llm)))
}
