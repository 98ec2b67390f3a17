use axum::{
    Router,
    http::HeaderName,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    app_state::AppState,
    extractor::Suggestion,
    health::{self, HealthResponse},
    suggestions::{
        self,
        dtos::{ErrorResponse, SuggestRequest, SuggestResponse},
    },
};

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(OpenApi)]
#[openapi(
    paths(health::health_check, suggestions::handlers::suggest),
    components(schemas(
        HealthResponse,
        SuggestRequest,
        SuggestResponse,
        Suggestion,
        ErrorResponse
    )),
    tags(
        (name = "health", description = "Liveness and backend availability"),
        (name = "suggestions", description = "Reading-item metadata extraction")
    )
)]
pub struct ApiDoc;

pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/healthz", get(health::health_check))
        .route("/api/ai", post(suggestions::suggest))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .with_state(state)
}
