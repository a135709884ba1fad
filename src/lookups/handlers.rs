use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{
    app_state::AppState,
    extractor::extract,
    fetcher::FetchError,
    lookups::dtos::{
        ModelHubLookupRequest, PaperLookupRequest, RepositoryLookupRequest,
        SourceLookupResponse, WebpageLookupRequest,
    },
    model_cards::dtos::ErrorResponse,
    sources::SourceRecord,
};

fn respond(result: Result<SourceRecord, FetchError>) -> Response {
    match result {
        Ok(record) => {
            let attributes = extract(&record);
            (
                StatusCode::OK,
                Json(SourceLookupResponse {
                    record: record.summary(),
                    attributes,
                }),
            )
                .into_response()
        }
        Err(error) if error.is_invalid_input() => {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error.to_string()))).into_response()
        }
        Err(error) => {
            warn!(%error, transient = error.is_transient(), "source lookup failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(format!("Upstream source failed: {}", error))),
            )
                .into_response()
        }
    }
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/sources/paper",
    tag = "sources",
    request_body = PaperLookupRequest,
    responses(
        (status = 200, description = "Paper metadata", body = SourceLookupResponse),
        (status = 400, description = "Invalid DOI", body = ErrorResponse),
        (status = 502, description = "CrossRef unavailable", body = ErrorResponse)
    )
)]
pub async fn lookup_paper(
    State(state): State<AppState>,
    Json(payload): Json<PaperLookupRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return bad_request(error);
    }
    respond(state.clients.academic.lookup_doi(&payload.doi).await)
}

#[utoipa::path(
    post,
    path = "/v1/sources/repository",
    tag = "sources",
    request_body = RepositoryLookupRequest,
    responses(
        (status = 200, description = "Repository metadata and README", body = SourceLookupResponse),
        (status = 400, description = "Not a GitHub repository URL", body = ErrorResponse),
        (status = 502, description = "GitHub unavailable", body = ErrorResponse)
    )
)]
pub async fn lookup_repository(
    State(state): State<AppState>,
    Json(payload): Json<RepositoryLookupRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return bad_request(error);
    }
    respond(state.clients.repository.lookup_url(&payload.repo_url).await)
}

#[utoipa::path(
    post,
    path = "/v1/sources/model-hub",
    tag = "sources",
    request_body = ModelHubLookupRequest,
    responses(
        (status = 200, description = "Hub entry and model card", body = SourceLookupResponse),
        (status = 400, description = "Invalid model id", body = ErrorResponse),
        (status = 502, description = "Model hub unavailable", body = ErrorResponse)
    )
)]
pub async fn lookup_model_hub(
    State(state): State<AppState>,
    Json(payload): Json<ModelHubLookupRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return bad_request(error);
    }
    respond(state.clients.model_hub.lookup(&payload.model_id).await)
}

#[utoipa::path(
    post,
    path = "/v1/sources/webpage",
    tag = "sources",
    request_body = WebpageLookupRequest,
    responses(
        (status = 200, description = "Readable page content", body = SourceLookupResponse),
        (status = 400, description = "Invalid URL", body = ErrorResponse),
        (status = 502, description = "Page could not be fetched", body = ErrorResponse)
    )
)]
pub async fn lookup_webpage(
    State(state): State<AppState>,
    Json(payload): Json<WebpageLookupRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return bad_request(error);
    }
    respond(state.clients.webpage.fetch(&payload.url).await)
}
