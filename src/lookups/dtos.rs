use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::extractor::ExtractedAttributes;
use crate::model_cards::dtos::validate_http_url;
use crate::sources::SourceSummary;

const MAX_IDENTIFIER_LEN: usize = 512;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaperLookupRequest {
    pub doi: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryLookupRequest {
    pub repo_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelHubLookupRequest {
    pub model_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WebpageLookupRequest {
    pub url: String,
}

/// One source, fetched directly, with what extraction found in it.
#[derive(Debug, Serialize, ToSchema)]
pub struct SourceLookupResponse {
    #[schema(value_type = Object)]
    pub record: SourceSummary,
    #[schema(value_type = Object)]
    pub attributes: ExtractedAttributes,
}

fn require_identifier(value: &str, what: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{} cannot be empty", what));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(format!("{} too long", what));
    }
    Ok(())
}

impl PaperLookupRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_identifier(&self.doi, "DOI")
    }
}

impl RepositoryLookupRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_identifier(&self.repo_url, "Repository URL")?;
        validate_http_url(self.repo_url.trim())
    }
}

impl ModelHubLookupRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_identifier(&self.model_id, "Model id")
    }
}

impl WebpageLookupRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_identifier(&self.url, "URL")?;
        validate_http_url(self.url.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_identifiers_rejected() {
        assert!(PaperLookupRequest { doi: " ".into() }.validate().is_err());
        assert!(ModelHubLookupRequest { model_id: "".into() }.validate().is_err());
        assert!(
            ModelHubLookupRequest {
                model_id: "acme/dermnet-x".into()
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn test_urls_must_be_http() {
        assert!(
            WebpageLookupRequest {
                url: "file:///etc/passwd".into()
            }
            .validate()
            .is_err()
        );
        assert!(
            RepositoryLookupRequest {
                repo_url: "https://github.com/acme/dermnet-x".into()
            }
            .validate()
            .is_ok()
        );
    }
}
