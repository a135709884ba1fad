use async_trait::async_trait;
use percent_encoding::utf8_percent_encode;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::fetcher::{FetchError, HttpFetcher};
use crate::sources::{
    PATH_IDENT, SourceFetcher, endpoint,
    types::{SearchQuery, SourceDetails, SourceKind, SourceRecord},
};

const SEARCH_LIMIT: usize = 5;

/// Hugging Face hub client.
#[derive(Debug, Clone)]
pub struct ModelHubClient {
    http: HttpFetcher,
    base: Url,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HubModel {
    #[serde(alias = "modelId")]
    id: String,
    #[serde(default)]
    downloads: u64,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(rename = "pipeline_tag")]
    pipeline_tag: Option<String>,
}

impl ModelHubClient {
    pub fn new(http: HttpFetcher, base_url: &str) -> Result<Self, FetchError> {
        Ok(Self {
            http,
            base: Url::parse(base_url)?,
        })
    }

    /// Search the hub by name. Only the first entry gets its model card
    /// fetched, since callers only ever use that one.
    #[instrument(skip(self), fields(source = "huggingface"))]
    pub async fn search_models(&self, text: &str) -> Result<Vec<SourceRecord>, FetchError> {
        let mut url = endpoint(&self.base, "api/models")?;
        url.query_pairs_mut()
            .append_pair("search", text)
            .append_pair("limit", &SEARCH_LIMIT.to_string());

        let models: Vec<HubModel> = self.http.get_json(url, None).await?;
        let mut records = Vec::with_capacity(models.len().min(SEARCH_LIMIT));
        for (rank, model) in models.into_iter().take(SEARCH_LIMIT).enumerate() {
            let card = if rank == 0 {
                self.model_card(&model.id).await
            } else {
                None
            };
            records.push(self.to_record(model, card).with_rank(rank));
        }

        debug!(count = records.len(), "hub search finished");
        Ok(records)
    }

    /// Look a model up by its hub id (`org/name`).
    #[instrument(skip(self), fields(source = "huggingface"))]
    pub async fn lookup(&self, model_id: &str) -> Result<SourceRecord, FetchError> {
        let model_id = model_id.trim().trim_matches('/');
        if model_id.is_empty() {
            return Err(FetchError::InvalidInput("empty model id".to_string()));
        }
        let path = format!("api/models/{}", utf8_percent_encode(model_id, PATH_IDENT));
        let model: HubModel = self.http.get_json(endpoint(&self.base, &path)?, None).await?;
        let card = self.model_card(&model.id).await;
        Ok(self.to_record(model, card))
    }

    /// Raw model card markdown, or `None` when the repo has no README.
    async fn model_card(&self, model_id: &str) -> Option<String> {
        let path = format!(
            "{}/raw/main/README.md",
            utf8_percent_encode(model_id, PATH_IDENT)
        );
        let url = endpoint(&self.base, &path).ok()?;
        match self.http.get_text(url, "text/plain, text/markdown", None).await {
            Ok(card) => Some(card),
            Err(error) => {
                warn!(model_id, %error, "model card unavailable");
                None
            }
        }
    }

    fn to_record(&self, model: HubModel, card: Option<String>) -> SourceRecord {
        let page = endpoint(&self.base, &model.id)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("https://huggingface.co/{}", model.id));

        SourceRecord::verified(
            SourceKind::ModelHub,
            model.id.clone(),
            Some(page),
            SourceDetails::ModelHub {
                model_id: model.id,
                tags: model.tags,
                downloads: model.downloads,
                likes: model.likes,
                pipeline_tag: model.pipeline_tag,
            },
        )
        .with_content(card.unwrap_or_default())
    }
}

#[async_trait]
impl SourceFetcher for ModelHubClient {
    fn kind(&self) -> SourceKind {
        SourceKind::ModelHub
    }

    fn applies_to(&self, query: &SearchQuery) -> bool {
        !query.model_name.is_empty()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SourceRecord>, FetchError> {
        self.search_models(&query.model_name).await
    }
}
