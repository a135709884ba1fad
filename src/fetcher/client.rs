use chrono::Utc;
use reqwest::{Client, ClientBuilder, RequestBuilder, header};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::config::Config;
use crate::fetcher::{
    charset::{decode_to_utf8, detect_encoding},
    errors::FetchError,
    types::PageResponse,
};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const USER_AGENT: &str = "dermcard/0.1 (model card generator)";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP plumbing for every source client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT.min(config.fetch_timeout()))
            .timeout(config.fetch_timeout())
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Unknown(e.to_string()))?;
        Ok(Self { client })
    }

    /// GET a JSON document and deserialize it.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        bearer: Option<&str>,
    ) -> Result<T, FetchError> {
        let request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");
        let body = self.send_for_body(with_bearer(request, bearer)).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// GET a plain-text document (README, model card) with the given `Accept`.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn get_text(
        &self,
        url: Url,
        accept: &str,
        bearer: Option<&str>,
    ) -> Result<String, FetchError> {
        let request = self.client.get(url).header(header::ACCEPT, accept);
        let body = self.send_for_body(with_bearer(request, bearer)).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Fetch an HTML page, enforcing the size cap and decoding its charset.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<PageResponse, FetchError> {
        let parsed_url = Url::parse(url)?;

        let response = self
            .client
            .get(parsed_url)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let url_final = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http { status });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;

        // Content-Length may be missing or wrong
        if body.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body.len() as u64));
        }

        let encoding = detect_encoding(&content_type, &body);
        let body_utf8 = decode_to_utf8(&body, encoding)?;
        debug!(encoding = encoding.name(), bytes = body.len(), "page decoded");

        Ok(PageResponse {
            url_final,
            status,
            body_utf8,
            encoding: encoding.name(),
            fetched_at: Utc::now(),
        })
    }

    async fn send_for_body(&self, request: RequestBuilder) -> Result<Vec<u8>, FetchError> {
        let response = request
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http { status });
        }
        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;
        if body.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body.len() as u64));
        }
        Ok(body.to_vec())
    }
}

fn with_bearer(request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
    match bearer {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}
