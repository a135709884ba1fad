use axum::{
    Router,
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info_span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    app_state::AppState,
    compliance::ComplianceResult,
    health::{self, HealthResponse},
    lookups::{self, dtos as lookup_dtos},
    middleware::rate_limit::{RateLimit, rate_limit_middleware},
    model_cards::{self, dtos as card_dtos},
    pipeline::GeneratedCard,
    render::ExportedCard,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        model_cards::handlers::generate_model_card,
        model_cards::handlers::export_model_card,
        lookups::handlers::lookup_paper,
        lookups::handlers::lookup_repository,
        lookups::handlers::lookup_model_hub,
        lookups::handlers::lookup_webpage,
    ),
    components(schemas(
        HealthResponse,
        GeneratedCard,
        ComplianceResult,
        ExportedCard,
        card_dtos::ErrorResponse,
        card_dtos::GenerateCardRequest,
        card_dtos::ExportCardRequest,
        lookup_dtos::PaperLookupRequest,
        lookup_dtos::RepositoryLookupRequest,
        lookup_dtos::ModelHubLookupRequest,
        lookup_dtos::WebpageLookupRequest,
        lookup_dtos::SourceLookupResponse,
    )),
    tags(
        (name = "health", description = "Service status"),
        (name = "model-cards", description = "Model card generation and export"),
        (name = "sources", description = "Single-source lookups")
    )
)]
pub struct ApiDoc;

/// The full HTTP surface: `/healthz`, rate-limited `/v1` routes, Swagger UI
/// at `/docs`, with request ids and tracing on every request.
pub fn router(state: AppState, rate_limit: RateLimit) -> Router {
    let v1 = Router::new()
        .route("/v1/model-cards", post(model_cards::handlers::generate_model_card))
        .route("/v1/model-cards/export", post(model_cards::handlers::export_model_card))
        .route("/v1/sources/paper", post(lookups::handlers::lookup_paper))
        .route("/v1/sources/repository", post(lookups::handlers::lookup_repository))
        .route("/v1/sources/model-hub", post(lookups::handlers::lookup_model_hub))
        .route("/v1/sources/webpage", post(lookups::handlers::lookup_webpage))
        .layer(middleware::from_fn_with_state(rate_limit, rate_limit_middleware));

    Router::new()
        .route("/healthz", get(health::health_check))
        .merge(v1)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
