use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::render::validate::{DocumentError, validate_document};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("model card cannot be exported: {0}")]
    InvalidDocument(#[from] DocumentError),
}

/// A validated card ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportedCard {
    pub filename: String,
    pub content: String,
}

/// `<name>-model-card-<YYYY-MM-DD>.md`, with every character of the name that
/// is not an ASCII letter or digit replaced by `-`.
pub fn export_filename(model_name: &str, date: NaiveDate) -> String {
    let mut stem: String = model_name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    if stem.is_empty() {
        stem = "model".to_string();
    }
    format!("{}-model-card-{}.md", stem, date.format("%Y-%m-%d"))
}

/// Validate `content` and name it for download. Invalid documents are never
/// handed back.
pub fn prepare_export(
    model_name: &str,
    content: &str,
    date: NaiveDate,
) -> Result<ExportedCard, ExportError> {
    validate_document(content)?;
    Ok(ExportedCard {
        filename: export_filename(model_name, date),
        content: content.to_string(),
    })
}
