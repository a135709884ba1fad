use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four kinds of external source, declared in merge-priority order:
/// a paper beats a repository, which beats a model-hub entry, which beats a
/// webpage. The derived `Ord` is that priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Paper,
    Repository,
    ModelHub,
    Webpage,
}

impl SourceKind {
    pub const PRIORITY: [SourceKind; 4] = [
        SourceKind::Paper,
        SourceKind::Repository,
        SourceKind::ModelHub,
        SourceKind::Webpage,
    ];

    /// Human-readable label used in rendered documents.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Paper => "Peer-reviewed paper",
            SourceKind::Repository => "Code repository",
            SourceKind::ModelHub => "Model hub entry",
            SourceKind::Webpage => "Official website",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Paper => "paper",
            SourceKind::Repository => "repository",
            SourceKind::ModelHub => "model-hub",
            SourceKind::Webpage => "webpage",
        };
        f.write_str(name)
    }
}

/// What a search was asked to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub model_name: String,
    pub website_url: Option<String>,
}

impl SearchQuery {
    pub fn new(model_name: impl Into<String>, website_url: Option<String>) -> Self {
        Self {
            model_name: model_name.into().trim().to_string(),
            website_url: website_url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        }
    }
}

/// Source-specific metadata returned alongside the raw content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SourceDetails {
    #[serde(rename_all = "camelCase")]
    Paper {
        authors: Vec<String>,
        venue: Option<String>,
        year: Option<i32>,
        doi: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Repository {
        full_name: String,
        description: Option<String>,
        stars: u64,
        language: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ModelHub {
        model_id: String,
        tags: Vec<String>,
        downloads: u64,
        likes: u64,
        pipeline_tag: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Webpage {
        description: Option<String>,
        related_links: Vec<String>,
    },
    /// Stand-in for a search that produced nothing usable.
    Placeholder { reason: String },
}

/// One fetched (or synthesized) source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub kind: SourceKind,
    pub title: String,
    pub url: Option<String>,
    /// Position within the fetcher's own ranked results (0 = best).
    pub rank: usize,
    /// True only when the record came back from a live call that succeeded.
    pub is_verified: bool,
    pub raw_content: Option<String>,
    pub details: SourceDetails,
    pub fetched_at: DateTime<Utc>,
}

impl SourceRecord {
    pub fn verified(
        kind: SourceKind,
        title: impl Into<String>,
        url: Option<String>,
        details: SourceDetails,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            url,
            rank: 0,
            is_verified: true,
            raw_content: None,
            details,
            fetched_at: Utc::now(),
        }
    }

    /// A record saying "this source was searched" without contributing data.
    pub fn placeholder(kind: SourceKind, query: &SearchQuery, reason: impl Into<String>) -> Self {
        let title = match kind {
            SourceKind::Webpage => query
                .website_url
                .clone()
                .unwrap_or_else(|| query.model_name.clone()),
            _ => query.model_name.clone(),
        };
        Self {
            kind,
            title,
            url: None,
            rank: 0,
            is_verified: false,
            raw_content: None,
            details: SourceDetails::Placeholder {
                reason: reason.into(),
            },
            fetched_at: Utc::now(),
        }
    }

    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        self.raw_content = (!content.trim().is_empty()).then_some(content);
        self
    }

    pub fn summary(&self) -> SourceSummary {
        SourceSummary {
            kind: self.kind,
            title: self.title.clone(),
            url: self.url.clone(),
            is_verified: self.is_verified,
            details: self.details.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

/// A source record without its raw content, kept on the merged record for
/// attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub kind: SourceKind,
    pub title: String,
    pub url: Option<String>,
    pub is_verified: bool,
    pub details: SourceDetails,
    pub fetched_at: DateTime<Utc>,
}
