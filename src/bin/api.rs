use anyhow::Result;
use bookshelf::{app_state::AppState, config::Config, router::router, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;
    match state.pipeline.model() {
        Some(model) => info!(model, "model binding configured"),
        None => info!("no model binding configured, heuristic tier only"),
    }

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = config.bind_addr(), "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
