use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};
use tracing::warn;

use crate::model_cards::dtos::ErrorResponse;

/// Fixed-window request counter per client IP. Expired windows are swept at
/// most once per window length.
#[derive(Clone)]
pub struct RateLimit {
    windows: Arc<DashMap<String, Window>>,
    last_sweep: Arc<AtomicI64>,
    max_requests: u32,
    window_seconds: i64,
}

#[derive(Debug, Clone)]
struct Window {
    hits: u32,
    started: DateTime<Utc>,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            last_sweep: Arc::new(AtomicI64::new(i64::MIN)),
            max_requests,
            window_seconds,
        }
    }

    /// Count one request from `client`; false once it is over the limit for
    /// the current window.
    pub fn check(&self, client: &str, now: DateTime<Utc>) -> bool {
        self.sweep_expired(now);

        let mut entry = self
            .windows
            .entry(client.to_string())
            .or_insert_with(|| Window {
                hits: 0,
                started: now,
            });
        let window = entry.value_mut();

        if now.signed_duration_since(window.started) >= Duration::seconds(self.window_seconds) {
            window.hits = 0;
            window.started = now;
        }
        window.hits += 1;
        window.hits <= self.max_requests
    }

    /// Number of clients with a live window.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    // Must run before any entry guard is taken; `retain` locks every shard.
    fn sweep_expired(&self, now: DateTime<Utc>) {
        let last = self.last_sweep.load(Ordering::Relaxed);
        if now.timestamp().saturating_sub(last) < self.window_seconds {
            return;
        }
        if self
            .last_sweep
            .compare_exchange(last, now.timestamp(), Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        let window = Duration::seconds(self.window_seconds);
        self.windows.retain(|_, w| now.signed_duration_since(w.started) < window);
    }
}

/// IP-based rate limiting middleware. Requests served without connection info
/// (in-process tests) share one bucket.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimit>,
    req: Request,
    next: Next,
) -> Response {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !rate_limit.check(&client, Utc::now()) {
        warn!(client = %client, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new("Rate limit exceeded")),
        )
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_resets_after_window() {
        let limit = RateLimit::new(2, 60);
        let start = Utc::now();
        assert!(limit.check("10.0.0.1", start));
        assert!(limit.check("10.0.0.1", start));
        assert!(!limit.check("10.0.0.1", start));
        assert!(limit.check("10.0.0.2", start));
        assert!(limit.check("10.0.0.1", start + Duration::seconds(61)));
    }

    #[test]
    fn test_expired_clients_are_forgotten() {
        let limit = RateLimit::new(2, 60);
        let start = Utc::now();
        for i in 0..50 {
            assert!(limit.check(&format!("10.0.1.{i}"), start));
        }
        assert_eq!(limit.tracked_clients(), 50);

        assert!(limit.check("10.0.2.1", start + Duration::seconds(61)));
        assert_eq!(limit.tracked_clients(), 1);
    }
}
