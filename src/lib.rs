pub mod app_state;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod health;
pub mod llm;
pub mod router;
pub mod suggestions;
pub mod telemetry;
