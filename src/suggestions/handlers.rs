use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::{
    app_state::AppState,
    extractor::ExtractError,
    extractor::pipeline::DESCRIPTION_REQUIRED,
    llm::LlmError,
    suggestions::dtos::{ErrorResponse, SuggestRequest, SuggestResponse},
};

const VALIDATION_FAILED: &str = "AI response validation failed. Please try manual entry.";
const PARSE_FAILED: &str = "Failed to parse AI response. Please try manual entry.";
const EXTRACTION_FAILED: &str = "AI extraction failed. Please try manual entry.";

#[utoipa::path(
    post,
    path = "/api/ai",
    tag = "suggestions",
    request_body = SuggestRequest,
    responses(
        (status = 200, description = "Suggestions extracted", body = SuggestResponse),
        (status = 400, description = "Missing or invalid description", body = ErrorResponse),
        (status = 500, description = "Extraction failed", body = ErrorResponse),
        (status = 503, description = "No extraction backend available", body = ErrorResponse)
    )
)]
pub async fn suggest(
    State(state): State<AppState>,
    payload: Result<Json<SuggestRequest>, JsonRejection>,
) -> Response {
    // Unreadable bodies are reported like a missing description
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection, "rejected request body");
            return bad_request(DESCRIPTION_REQUIRED.to_string());
        }
    };

    let description = match payload.validate() {
        Ok(description) => description,
        Err(error) => return bad_request(error),
    };

    match state.pipeline.extract(description).await {
        Ok(suggestions) => (StatusCode::OK, Json(SuggestResponse { suggestions })).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: ExtractError) -> Response {
    let (status, error) = match &err {
        ExtractError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        ExtractError::BackendUnavailable => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        ExtractError::Llm(LlmError::Validation(_) | LlmError::EmptyTitle) => {
            error!(error = %err, "model output rejected");
            (StatusCode::INTERNAL_SERVER_ERROR, VALIDATION_FAILED.to_string())
        }
        ExtractError::Llm(LlmError::Parse) => {
            error!(error = %err, "model reply was not JSON");
            (StatusCode::INTERNAL_SERVER_ERROR, PARSE_FAILED.to_string())
        }
        ExtractError::Llm(LlmError::Model(_) | LlmError::EmptyResponse) => {
            // Upstream detail stays in the logs
            error!(error = %err, "model extraction failed");
            (StatusCode::INTERNAL_SERVER_ERROR, EXTRACTION_FAILED.to_string())
        }
    };

    (status, Json(ErrorResponse { error })).into_response()
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}
