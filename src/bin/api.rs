use std::net::SocketAddr;

use anyhow::{Context, Result};
use dermcard::{
    app_state::AppState,
    config::Config,
    middleware::rate_limit::RateLimit,
    routes,
    telemetry::init_tracing,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format());

    let state = AppState::new(&config).context("failed to build source clients")?;
    let rate_limit = RateLimit::new(
        config.rate_limit_max_requests(),
        config.rate_limit_window_secs(),
    );
    let app = routes::router(state, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    info!(addr = %config.bind_addr(), "api listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
