#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use dermcard::{app_state::AppState, config::Config, middleware::rate_limit::RateLimit, routes};

pub const PAPER_ABSTRACT: &str = "<jats:p>DermNet-X is a ResNet classifier for skin lesions. \
    It reached an accuracy of 92.5% on the ISIC 2019 test set.</jats:p>";

pub const REPO_README: &str = "# DermNet-X\n\n\
    Accuracy: 88%\n\
    Sensitivity: 87.5%\n\
    Specificity: 90.5%\n\
    Demographic parity: 0.91\n\n\
    Built with PyTorch on HAM10000.\n\n\
    ## Bias Analysis\n\
    - Under-represents Fitzpatrick skin types V and VI\n\n\
    ## Out-of-Scope Use\n\
    - Not for use as a standalone diagnostic device\n";

pub const HUB_CARD: &str = "---\nlibrary_name: pytorch\n---\n\n# DermNet-X\n\nAUC: 0.95\n";

/// Config pointing every API-backed source at the mock server.
pub fn test_config(server: &MockServer) -> Config {
    Config::default().with_api_base_url(server.uri())
}

pub fn test_app(config: &Config) -> Router {
    let state = AppState::new(config).expect("clients build from test config");
    let rate_limit = RateLimit::new(
        config.rate_limit_max_requests(),
        config.rate_limit_window_secs(),
    );
    routes::router(state, rate_limit)
}

pub async fn mount_crossref(server: &MockServer, items: Value) {
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "message": { "items": items } })),
        )
        .mount(server)
        .await;
}

pub async fn mount_github(server: &MockServer, full_name: &str, readme: &str) {
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{
                "full_name": full_name,
                "html_url": format!("https://github.com/{}", full_name),
                "description": "Skin lesion classifier",
                "stargazers_count": 120,
                "language": "Python"
            }]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/readme", full_name)))
        .respond_with(ResponseTemplate::new(200).set_body_string(readme))
        .mount(server)
        .await;
}

pub async fn mount_hub(server: &MockServer, model_id: &str, card: &str) {
    Mock::given(method("GET"))
        .and(path("/api/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": model_id,
            "downloads": 42,
            "likes": 3,
            "tags": ["image-classification", "dermatology"],
            "pipeline_tag": "image-classification"
        }])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/raw/main/README.md", model_id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(card))
        .mount(server)
        .await;
}

pub fn dermnet_paper() -> Value {
    serde_json::json!([{
        "DOI": "10.1000/dermnet-x",
        "title": ["DermNet-X: deep learning for skin lesion triage"],
        "author": [{ "given": "Ada", "family": "Lovelace" }],
        "container-title": ["Journal of Dermatology AI"],
        "published": { "date-parts": [[2024, 2]] },
        "abstract": PAPER_ABSTRACT
    }])
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}
