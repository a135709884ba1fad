use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::fetcher::{FetchError, HttpFetcher};
use crate::sources::{
    SourceFetcher, endpoint,
    types::{SearchQuery, SourceDetails, SourceKind, SourceRecord},
};

const README_MEDIA_TYPE: &str = "application/vnd.github.raw";
const SEARCH_PAGE_SIZE: usize = 5;

/// GitHub REST client.
#[derive(Debug, Clone)]
pub struct RepositoryClient {
    http: HttpFetcher,
    base: Url,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    full_name: String,
    html_url: Option<String>,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    language: Option<String>,
}

impl RepositoryClient {
    pub fn new(
        http: HttpFetcher,
        base_url: &str,
        token: Option<String>,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            http,
            base: Url::parse(base_url)?,
            token,
        })
    }

    /// Search repositories ranked by stars. Only the top hit gets its README
    /// fetched, since callers only ever use that one.
    #[instrument(skip(self), fields(source = "github"))]
    pub async fn search_repositories(&self, text: &str) -> Result<Vec<SourceRecord>, FetchError> {
        let mut url = endpoint(&self.base, "search/repositories")?;
        url.query_pairs_mut()
            .append_pair("q", text)
            .append_pair("sort", "stars")
            .append_pair("order", "desc")
            .append_pair("per_page", &SEARCH_PAGE_SIZE.to_string());

        let response: SearchResponse = self.http.get_json(url, self.token.as_deref()).await?;
        let mut repos = response.items;
        // GitHub sorts by stars already; mirrors and proxies may not.
        repos.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));

        let mut records = Vec::with_capacity(repos.len());
        for (rank, repo) in repos.into_iter().enumerate() {
            let readme = if rank == 0 {
                self.readme(&repo.full_name).await
            } else {
                None
            };
            records.push(repo.into_record(readme).with_rank(rank));
        }

        debug!(count = records.len(), "github search finished");
        Ok(records)
    }

    /// Look up a repository from its `https://github.com/owner/repo` URL.
    #[instrument(skip(self), fields(source = "github"))]
    pub async fn lookup_url(&self, repo_url: &str) -> Result<SourceRecord, FetchError> {
        let full_name = parse_repo_path(repo_url).ok_or_else(|| {
            let shown = repo_url.trim();
            FetchError::InvalidInput(format!("'{}' is not a GitHub repository URL", shown))
        })?;
        let url = endpoint(&self.base, &format!("repos/{}", full_name))?;
        let repo: Repo = self.http.get_json(url, self.token.as_deref()).await?;
        let readme = self.readme(&repo.full_name).await;
        Ok(repo.into_record(readme))
    }

    /// README text, or `None` if the repository has none or the call failed.
    async fn readme(&self, full_name: &str) -> Option<String> {
        let url = endpoint(&self.base, &format!("repos/{}/readme", full_name)).ok()?;
        match self
            .http
            .get_text(url, README_MEDIA_TYPE, self.token.as_deref())
            .await
        {
            Ok(text) => Some(text),
            Err(error) => {
                warn!(repo = full_name, %error, "README unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl SourceFetcher for RepositoryClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Repository
    }

    fn applies_to(&self, query: &SearchQuery) -> bool {
        !query.model_name.is_empty()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SourceRecord>, FetchError> {
        self.search_repositories(&query.model_name).await
    }
}

impl Repo {
    fn into_record(self, readme: Option<String>) -> SourceRecord {
        let url = self
            .html_url
            .clone()
            .or_else(|| Some(format!("https://github.com/{}", self.full_name)));
        let content = [self.description.clone(), readme]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("\n\n");

        SourceRecord::verified(
            SourceKind::Repository,
            self.full_name.clone(),
            url,
            SourceDetails::Repository {
                full_name: self.full_name,
                description: self.description,
                stars: self.stargazers_count,
                language: self.language,
            },
        )
        .with_content(content)
    }
}

/// `owner/repo` from a GitHub URL, tolerating `.git`, trailing slashes and
/// deeper paths such as `/tree/main`.
fn parse_repo_path(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?.trim_start_matches("www.");
    if host != "github.com" {
        return None;
    }
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?.trim_end_matches(".git");
    (!repo.is_empty()).then(|| format!("{}/{}", owner, repo))
}
