use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use crate::sources::infer_model_name;

const MAX_MODEL_NAME_LEN: usize = 200;
const MAX_URL_LEN: usize = 2048;
const MAX_SESSION_KEY_LEN: usize = 128;
const MAX_CONTENT_LEN: usize = 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCardRequest {
    #[serde(default)]
    pub model_name: String,
    pub website_url: Option<String>,
    /// Starting another search with the same key cancels this one.
    pub session_key: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportCardRequest {
    #[serde(default)]
    pub model_name: String,
    pub content: String,
}

impl GenerateCardRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.model_name.len() > MAX_MODEL_NAME_LEN {
            return Err("Model name too long".to_string());
        }
        match self.website() {
            Some(url) => validate_http_url(url)?,
            None if self.model_name.trim().is_empty() => {
                return Err("Model name or website URL is required".to_string());
            }
            None => {}
        }
        if self.session_key().is_some_and(|key| key.len() > MAX_SESSION_KEY_LEN) {
            return Err("Session key too long".to_string());
        }
        Ok(())
    }

    pub fn website(&self) -> Option<&str> {
        self.website_url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn session_key(&self) -> Option<&str> {
        self.session_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// The model name to search for: the one given, or one guessed from the
    /// website host.
    pub fn resolved_model_name(&self) -> Option<String> {
        let name = self.model_name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
        self.website().and_then(infer_model_name)
    }
}

impl ExportCardRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.model_name.len() > MAX_MODEL_NAME_LEN {
            return Err("Model name too long".to_string());
        }
        if self.content.len() > MAX_CONTENT_LEN {
            return Err("Document too large".to_string());
        }
        Ok(())
    }
}

pub(crate) fn validate_http_url(raw: &str) -> Result<(), String> {
    if raw.len() > MAX_URL_LEN {
        return Err("URL too long".to_string());
    }
    let url = Url::parse(raw).map_err(|_| "URL is not valid".to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err("URL must use http or https".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, website: Option<&str>) -> GenerateCardRequest {
        GenerateCardRequest {
            model_name: name.to_string(),
            website_url: website.map(str::to_string),
            session_key: None,
        }
    }

    #[test]
    fn test_name_or_website_required() {
        assert!(request("", None).validate().is_err());
        assert!(request("  ", Some(" ")).validate().is_err());
        assert!(request("DermNet-X", None).validate().is_ok());
        assert!(request("", Some("https://skinvision.com")).validate().is_ok());
    }

    #[test]
    fn test_website_must_be_http() {
        assert!(request("X", Some("ftp://example.com")).validate().is_err());
        assert!(request("X", Some("not a url")).validate().is_err());
    }

    #[test]
    fn test_model_name_inferred_from_website() {
        assert_eq!(
            request("", Some("https://www.skinvision.com")).resolved_model_name().as_deref(),
            Some("Skinvision")
        );
        assert_eq!(
            request(" DermNet-X ", Some("https://www.skinvision.com"))
                .resolved_model_name()
                .as_deref(),
            Some("DermNet-X")
        );
    }

    #[test]
    fn test_export_request_limits() {
        let request = ExportCardRequest {
            model_name: "x".repeat(MAX_MODEL_NAME_LEN + 1),
            content: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
