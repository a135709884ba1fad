use thiserror::Error;

use crate::render::LEAK_TOKENS;

/// Headings every exported card must contain.
pub const REQUIRED_SECTIONS: [&str; 4] = [
    "# Model Card:",
    "## Model Overview",
    "### Performance Metrics",
    "### Compliance Assessment",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document is empty")]
    Empty,
    #[error("document is missing the '{0}' section")]
    MissingSection(&'static str),
    #[error("document contains the leaked token '{0}'")]
    LeakedToken(&'static str),
}

pub fn validate_document(text: &str) -> Result<(), DocumentError> {
    if text.trim().is_empty() {
        return Err(DocumentError::Empty);
    }
    if let Some(token) = LEAK_TOKENS.iter().find(|token| text.contains(*token)) {
        return Err(DocumentError::LeakedToken(*token));
    }
    for section in REQUIRED_SECTIONS {
        if !text.lines().any(|line| line.trim_start().starts_with(section)) {
            return Err(DocumentError::MissingSection(section));
        }
    }
    Ok(())
}

pub fn is_valid_document(text: &str) -> bool {
    validate_document(text).is_ok()
}
