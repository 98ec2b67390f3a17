use anyhow::{Result, bail};
use bookshelf::{
    app_state::AppState,
    config::Config,
    suggestions::dtos::{ErrorResponse, SuggestResponse},
    telemetry,
};

/// Runs the extraction pipeline once for the description given on the
/// command line and prints the JSON the API would return.
#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let description = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if description.trim().is_empty() {
        bail!("usage: suggest <url or description>");
    }

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;

    match state.pipeline.extract(&description).await {
        Ok(suggestions) => {
            println!("{}", serde_json::to_string_pretty(&SuggestResponse { suggestions })?);
            Ok(())
        }
        Err(err) => {
            let body = ErrorResponse {
                error: err.to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
            std::process::exit(1);
        }
    }
}
