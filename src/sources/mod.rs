//! Source fetchers: one client per external system.
//!
//! Each client exposes a free-text `search` used by the pipeline plus a direct
//! `lookup` by identifier used by the single-source API routes. Clients return
//! `FetchError`s; turning those into empty results is the pipeline's job.

pub mod academic;
pub mod model_hub;
pub mod repository;
pub mod types;
pub mod webpage;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS};
use std::sync::Arc;
use url::Url;

use crate::config::Config;
use crate::fetcher::{FetchError, HttpFetcher};

pub use academic::AcademicClient;
pub use model_hub::ModelHubClient;
pub use repository::RepositoryClient;
pub use types::{SearchQuery, SourceDetails, SourceKind, SourceRecord, SourceSummary};
pub use webpage::{WebpageClient, infer_model_name};

/// Characters escaped in identifiers spliced into URL paths. `/` is left alone
/// because DOIs and hub model ids legitimately contain it.
pub(crate) const PATH_IDENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One external system the pipeline can search.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Which slot of the merge priority this fetcher fills.
    fn kind(&self) -> SourceKind;

    /// Whether a search makes sense for this query at all. The webpage fetcher
    /// only runs when a URL was supplied.
    fn applies_to(&self, query: &SearchQuery) -> bool;

    /// Ranked results, best first. An empty vector means "searched, found nothing".
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SourceRecord>, FetchError>;
}

/// The concrete clients, built once from configuration and shared by the
/// pipeline and the lookup routes.
#[derive(Debug, Clone)]
pub struct SourceClients {
    pub academic: AcademicClient,
    pub repository: RepositoryClient,
    pub model_hub: ModelHubClient,
    pub webpage: WebpageClient,
}

impl SourceClients {
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let http = HttpFetcher::new(config)?;
        Ok(Self {
            academic: AcademicClient::new(
                http.clone(),
                config.crossref_api_url(),
                config.max_papers(),
            )?,
            repository: RepositoryClient::new(
                http.clone(),
                config.github_api_url(),
                config.github_token().map(str::to_string),
            )?,
            model_hub: ModelHubClient::new(http.clone(), config.huggingface_url())?,
            webpage: WebpageClient::new(http),
        })
    }

    /// The clients as trait objects, in merge-priority order.
    pub fn fetchers(&self) -> Vec<Arc<dyn SourceFetcher>> {
        vec![
            Arc::new(self.academic.clone()),
            Arc::new(self.repository.clone()),
            Arc::new(self.model_hub.clone()),
            Arc::new(self.webpage.clone()),
        ]
    }
}

/// Join `path` onto `base`, keeping any path prefix `base` already has.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, FetchError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Ok(Url::parse(&joined)?)
}
