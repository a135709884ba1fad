use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use url::Url;

/// An HTML page after charset detection and decoding.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub body_utf8: String,
    /// Name of the encoding the body was decoded from (e.g. `UTF-8`).
    pub encoding: &'static str,
    pub fetched_at: DateTime<Utc>,
}
