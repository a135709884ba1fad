use async_trait::async_trait;
use percent_encoding::utf8_percent_encode;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::extractor::cleaner::strip_markup;
use crate::fetcher::{FetchError, HttpFetcher};
use crate::sources::{
    PATH_IDENT, SourceFetcher, endpoint,
    types::{SearchQuery, SourceDetails, SourceKind, SourceRecord},
};

/// CrossRef metadata client.
#[derive(Debug, Clone)]
pub struct AcademicClient {
    http: HttpFetcher,
    base: Url,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    message: T,
}

#[derive(Debug, Deserialize)]
struct WorkList {
    #[serde(default)]
    items: Vec<Work>,
}

#[derive(Debug, Deserialize)]
struct Work {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<Author>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    published: Option<DateParts>,
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    given: Option<String>,
    family: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DateParts {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i32>>>,
}

impl AcademicClient {
    pub fn new(http: HttpFetcher, base_url: &str, max_results: usize) -> Result<Self, FetchError> {
        Ok(Self {
            http,
            base: Url::parse(base_url)?,
            max_results: max_results.max(1),
        })
    }

    /// Free-text search, at most `max_results` works in CrossRef's relevance order.
    #[instrument(skip(self), fields(source = "crossref"))]
    pub async fn search_works(&self, text: &str) -> Result<Vec<SourceRecord>, FetchError> {
        let mut url = endpoint(&self.base, "works")?;
        url.query_pairs_mut()
            .append_pair("query", text)
            .append_pair("rows", &self.max_results.to_string());

        let envelope: Envelope<WorkList> = self.http.get_json(url, None).await?;
        let records: Vec<SourceRecord> = envelope
            .message
            .items
            .into_iter()
            .take(self.max_results)
            .enumerate()
            .map(|(rank, work)| work.into_record().with_rank(rank))
            .collect();

        debug!(count = records.len(), "crossref search finished");
        Ok(records)
    }

    /// Look a single work up by DOI. Accepts bare DOIs, `doi:` prefixes and
    /// `https://doi.org/` links.
    #[instrument(skip(self), fields(source = "crossref"))]
    pub async fn lookup_doi(&self, doi: &str) -> Result<SourceRecord, FetchError> {
        let doi = normalize_doi(doi)
            .ok_or_else(|| FetchError::InvalidInput(format!("'{}' is not a DOI", doi.trim())))?;
        let path = format!("works/{}", utf8_percent_encode(&doi, PATH_IDENT));
        let url = endpoint(&self.base, &path)?;

        let envelope: Envelope<Work> = self.http.get_json(url, None).await?;
        Ok(envelope.message.into_record())
    }
}

#[async_trait]
impl SourceFetcher for AcademicClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Paper
    }

    fn applies_to(&self, query: &SearchQuery) -> bool {
        !query.model_name.is_empty()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SourceRecord>, FetchError> {
        self.search_works(&query.model_name).await
    }
}

impl Work {
    fn into_record(self) -> SourceRecord {
        let title = self
            .title
            .first()
            .map(|t| strip_markup(t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled work".to_string());

        let authors = self
            .author
            .iter()
            .filter_map(Author::display_name)
            .collect();

        let year = self
            .published
            .as_ref()
            .and_then(|p| p.date_parts.first())
            .and_then(|parts| parts.first().copied().flatten());

        let url = self.url.clone().or_else(|| {
            self.doi
                .as_ref()
                .map(|doi| format!("https://doi.org/{}", doi))
        });

        let abstract_text = self.abstract_text.as_deref().map(strip_markup);
        let content = match abstract_text {
            Some(text) => format!("{}\n\n{}", title, text),
            None => title.clone(),
        };

        SourceRecord::verified(
            SourceKind::Paper,
            title,
            url,
            SourceDetails::Paper {
                authors,
                venue: self.container_title.into_iter().next(),
                year,
                doi: self.doi,
            },
        )
        .with_content(content)
    }
}

impl Author {
    fn display_name(&self) -> Option<String> {
        match (&self.given, &self.family, &self.name) {
            (Some(given), Some(family), _) => Some(format!("{} {}", given, family)),
            (None, Some(family), _) => Some(family.clone()),
            (_, _, Some(name)) => Some(name.clone()),
            _ => None,
        }
    }
}

fn normalize_doi(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let doi = ["https://doi.org/", "http://doi.org/", "https://dx.doi.org/", "doi:"]
        .iter()
        .find(|prefix| lowered.starts_with(*prefix))
        .map(|prefix| trimmed[prefix.len()..].trim())
        .unwrap_or(trimmed);

    (doi.starts_with("10.") && doi.contains('/')).then(|| doi.to_string())
}
