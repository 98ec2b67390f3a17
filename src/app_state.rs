use std::sync::Arc;

use crate::{
    config::Config,
    extractor::Pipeline,
    fetcher::{FetchError, HttpFetcher},
    llm::{LlmExtractor, WorkersAiRunner},
};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Wires the HTTP fetcher and, when credentials are configured, the
    /// Workers AI binding.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(config.fetch_timeout())?;
        let llm = config.ai().map(|ai| {
            LlmExtractor::new(Arc::new(WorkersAiRunner::new(ai)), config.ai_model())
        });
        Ok(Self::new(Pipeline::new(Arc::new(fetcher), llm)))
    }
}
