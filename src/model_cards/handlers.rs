use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    app_state::AppState,
    model_cards::dtos::{ErrorResponse, ExportCardRequest, GenerateCardRequest},
    pipeline::{GeneratedCard, PipelineError},
    render::prepare_export,
};

#[utoipa::path(
    post,
    path = "/v1/model-cards",
    tag = "model-cards",
    request_body = GenerateCardRequest,
    responses(
        (status = 200, description = "Model card generated", body = GeneratedCard),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Superseded by a newer search with the same session key", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    )
)]
pub async fn generate_model_card(
    State(state): State<AppState>,
    Json(payload): Json<GenerateCardRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }
    let Some(model_name) = payload.resolved_model_name() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Could not infer a model name from the website URL")),
        )
            .into_response();
    };
    let website = payload.website();

    let result = match payload.session_key() {
        Some(key) => {
            let session = state.sessions.start(key);
            state
                .pipeline
                .generate_with_cancellation(&model_name, website, session.id(), session.token())
                .await
        }
        None => Ok(state.pipeline.generate_model_card(&model_name, website).await),
    };

    match result {
        Ok(card) => (StatusCode::OK, Json(card)).into_response(),
        Err(PipelineError::Cancelled) => {
            info!(model = %model_name, "search superseded");
            (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("Search was superseded by a newer request")),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/model-cards/export",
    tag = "model-cards",
    request_body = ExportCardRequest,
    responses(
        (status = 200, description = "Markdown download", content_type = "text/markdown", body = String),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 422, description = "Document failed validation", body = ErrorResponse)
    )
)]
pub async fn export_model_card(Json(payload): Json<ExportCardRequest>) -> Response {
    if let Err(error) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    match prepare_export(&payload.model_name, &payload.content, Utc::now().date_naive()) {
        Ok(card) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", card.filename),
                ),
            ],
            card.content,
        )
            .into_response(),
        Err(error) => {
            warn!(%error, "export rejected");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse::new(error.to_string())),
            )
                .into_response()
        }
    }
}
