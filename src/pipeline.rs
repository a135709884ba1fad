//! The end-to-end search: fetch every source concurrently, extract, merge,
//! evaluate and render.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::compliance::{ComplianceResult, evaluate};
use crate::config::Config;
use crate::extractor::extract;
use crate::fetcher::FetchError;
use crate::merge::{MergedRecord, merge_sources};
use crate::render::{CardIdentity, export_filename, render_or_diagnostic};
use crate::sources::{SearchQuery, SourceClients, SourceFetcher, SourceKind, SourceRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("search was superseded by a newer request")]
    Cancelled,
}

/// Everything one search produced.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCard {
    pub session_id: Uuid,
    pub model_name: String,
    pub website_url: Option<String>,
    #[schema(value_type = Object)]
    pub merged_record: MergedRecord,
    pub compliance: ComplianceResult,
    pub rendered_document: String,
    pub filename: String,
    pub real_data_found: bool,
    pub generated_at: DateTime<Utc>,
}

pub struct ModelCardPipeline {
    fetchers: Vec<Arc<dyn SourceFetcher>>,
    fetch_timeout: Duration,
}

impl ModelCardPipeline {
    pub fn new(fetchers: Vec<Arc<dyn SourceFetcher>>, fetch_timeout: Duration) -> Self {
        Self {
            fetchers,
            fetch_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let clients = SourceClients::from_config(config)?;
        Ok(Self::new(clients.fetchers(), config.fetch_timeout()))
    }

    /// Run a search to completion.
    pub async fn generate_model_card(
        &self,
        model_name: &str,
        website_url: Option<&str>,
    ) -> GeneratedCard {
        let query = SearchQuery::new(model_name, website_url.map(str::to_string));
        let records = self.collect(&query).await;
        self.assemble(&query, records, Uuid::new_v4())
    }

    /// Run a search that gives up as soon as `cancel` fires. A cancelled
    /// search returns nothing it fetched.
    #[instrument(skip(self, cancel), fields(model = %model_name))]
    pub async fn generate_with_cancellation(
        &self,
        model_name: &str,
        website_url: Option<&str>,
        session_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<GeneratedCard, PipelineError> {
        let query = SearchQuery::new(model_name, website_url.map(str::to_string));
        let records = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(%session_id, "search cancelled while fetching");
                return Err(PipelineError::Cancelled);
            }
            records = self.collect(&query) => records,
        };
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(self.assemble(&query, records, session_id))
    }

    /// Every applicable fetcher, concurrently, each settled into records or
    /// a placeholder. Output follows fetcher order.
    #[instrument(skip_all, fields(model = %query.model_name))]
    async fn collect(&self, query: &SearchQuery) -> Vec<SourceRecord> {
        let pending = self
            .fetchers
            .iter()
            .filter(|fetcher| fetcher.applies_to(query))
            .map(|fetcher| self.fetch_settled(fetcher.as_ref(), query));
        join_all(pending).await.into_iter().flatten().collect()
    }

    async fn fetch_settled(
        &self,
        fetcher: &dyn SourceFetcher,
        query: &SearchQuery,
    ) -> Vec<SourceRecord> {
        let kind = fetcher.kind();
        let started = Instant::now();

        let reason = match tokio::time::timeout(self.fetch_timeout, fetcher.search(query)).await {
            Ok(Ok(mut records)) if !records.is_empty() => {
                // Only the top repository and hub entry are used.
                if matches!(kind, SourceKind::Repository | SourceKind::ModelHub) {
                    records.truncate(1);
                }
                info!(
                    %kind,
                    count = records.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "source fetched"
                );
                return records;
            }
            Ok(Ok(_)) => {
                info!(%kind, "source returned no results");
                "no results".to_string()
            }
            Ok(Err(error)) => {
                warn!(%kind, %error, transient = error.is_transient(), "source fetch failed");
                error.to_string()
            }
            Err(_) => {
                warn!(
                    %kind,
                    timeout_secs = self.fetch_timeout.as_secs_f64(),
                    "source fetch timed out"
                );
                "timed out".to_string()
            }
        };
        vec![SourceRecord::placeholder(kind, query, reason)]
    }

    fn assemble(
        &self,
        query: &SearchQuery,
        records: Vec<SourceRecord>,
        session_id: Uuid,
    ) -> GeneratedCard {
        let summaries = records.iter().map(SourceRecord::summary).collect();
        let merged = catch_unwind(AssertUnwindSafe(|| {
            let inputs: Vec<_> = records
                .into_iter()
                .map(|record| {
                    let attributes = extract(&record);
                    (record, attributes)
                })
                .collect();
            merge_sources(&inputs)
        }))
        .unwrap_or_else(|_| {
            error!("extraction panicked, using an empty record");
            MergedRecord::empty(summaries)
        });

        let compliance = evaluate(&merged);
        let generated_at = Utc::now();
        let identity = CardIdentity::new(query.model_name.clone(), generated_at.date_naive());
        let rendered_document = render_or_diagnostic(&merged, &compliance, &identity);
        let filename = export_filename(&query.model_name, identity.generated_on);

        info!(
            %session_id,
            real_data_found = merged.real_data_found,
            hti1 = compliance.hti1_compliant,
            ocr = compliance.ocr_compliant,
            "model card generated"
        );

        GeneratedCard {
            session_id,
            model_name: query.model_name.clone(),
            website_url: query.website_url.clone(),
            real_data_found: merged.real_data_found,
            merged_record: merged,
            compliance,
            rendered_document,
            filename,
            generated_at,
        }
    }
}
