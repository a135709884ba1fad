use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use crate::extractor::{cleaner::related_links, reader::read_page};
use crate::fetcher::{FetchError, HttpFetcher};
use crate::sources::{
    SourceFetcher,
    types::{SearchQuery, SourceDetails, SourceKind, SourceRecord},
};

/// Fetches a model's own website.
#[derive(Debug, Clone)]
pub struct WebpageClient {
    http: HttpFetcher,
}

impl WebpageClient {
    pub fn new(http: HttpFetcher) -> Self {
        Self { http }
    }

    /// Fetch and read one page. A page with no readable text is still a
    /// verified record, just one without content.
    #[instrument(skip(self), fields(source = "webpage"))]
    pub async fn fetch(&self, url: &str) -> Result<SourceRecord, FetchError> {
        let page = self.http.fetch_page(url.trim()).await?;
        let final_url = page.url_final.to_string();

        let Some(text) = read_page(&page.body_utf8, &page.url_final) else {
            debug!(url = %final_url, "page had no readable text");
            return Ok(SourceRecord::verified(
                SourceKind::Webpage,
                final_url.clone(),
                Some(final_url),
                SourceDetails::Webpage {
                    description: None,
                    related_links: Vec::new(),
                },
            ));
        };

        let links = related_links(&page.body_utf8, &text.text, &page.url_final);
        let title = Some(text.title)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| final_url.clone());
        let content = match &text.description {
            Some(description) => format!("{}\n\n{}", description, text.text),
            None => text.text,
        };

        debug!(links = links.len(), chars = content.len(), "page read");
        Ok(SourceRecord::verified(
            SourceKind::Webpage,
            title,
            Some(final_url),
            SourceDetails::Webpage {
                description: text.description,
                related_links: links,
            },
        )
        .with_content(content))
    }
}

#[async_trait]
impl SourceFetcher for WebpageClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Webpage
    }

    fn applies_to(&self, query: &SearchQuery) -> bool {
        query.website_url.is_some()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SourceRecord>, FetchError> {
        match &query.website_url {
            Some(url) => Ok(vec![self.fetch(url).await?]),
            None => Ok(Vec::new()),
        }
    }
}

/// Guess a model name from a website: the first label of the host, minus any
/// `www.`, capitalized. `https://www.skinvision.com` gives `Skinvision`.
pub fn infer_model_name(website_url: &str) -> Option<String> {
    let url = Url::parse(website_url.trim()).ok()?;
    let host = url.host_str()?.trim_start_matches("www.");
    let label = host.split('.').next().filter(|l| !l.is_empty())?;
    if label.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut chars = label.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}
