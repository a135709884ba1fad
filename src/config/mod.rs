//! Configuration handling for the application.
//!
//! Everything is read from environment variables with development defaults, so
//! both the API server and the CLI can run without any setup. The external API
//! base URLs are configurable mostly so tests can point them at a mock server.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable names. Keeping them public lets tests and the CLI refer
/// to them directly.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_CROSSREF_API_URL: &str = "CROSSREF_API_URL";
pub const ENV_GITHUB_API_URL: &str = "GITHUB_API_URL";
pub const ENV_HUGGINGFACE_URL: &str = "HUGGINGFACE_URL";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_MAX_PAPERS: &str = "MAX_PAPERS";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
pub const ENV_RATE_LIMIT_MAX_REQUESTS: &str = "RATE_LIMIT_MAX_REQUESTS";
pub const ENV_RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_CROSSREF_API_URL: &str = "https://api.crossref.org";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_HUGGINGFACE_URL: &str = "https://huggingface.co";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_PAPERS: usize = 5;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 30;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: i64 = 60;

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                field: ENV_LOG_FORMAT,
                reason: format!("expected 'text' or 'json', got '{}'", other),
            }),
        }
    }
}

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    crossref_api_url: String,
    github_api_url: String,
    huggingface_url: String,
    github_token: Option<String>,
    fetch_timeout_secs: u64,
    max_papers: usize,
    log_format: LogFormat,
    rate_limit_max_requests: u32,
    rate_limit_window_secs: i64,
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            bind_addr: env::var(ENV_BIND_ADDR).unwrap_or(defaults.bind_addr),
            crossref_api_url: env::var(ENV_CROSSREF_API_URL).unwrap_or(defaults.crossref_api_url),
            github_api_url: env::var(ENV_GITHUB_API_URL).unwrap_or(defaults.github_api_url),
            huggingface_url: env::var(ENV_HUGGINGFACE_URL).unwrap_or(defaults.huggingface_url),
            github_token: env::var(ENV_GITHUB_TOKEN).ok().filter(|t| !t.trim().is_empty()),
            fetch_timeout_secs: parse_var(ENV_FETCH_TIMEOUT_SECS, defaults.fetch_timeout_secs)?,
            max_papers: parse_var(ENV_MAX_PAPERS, defaults.max_papers)?,
            log_format: match env::var(ENV_LOG_FORMAT) {
                Ok(raw) => raw.parse()?,
                Err(_) => defaults.log_format,
            },
            rate_limit_max_requests: parse_var(
                ENV_RATE_LIMIT_MAX_REQUESTS,
                defaults.rate_limit_max_requests,
            )?,
            rate_limit_window_secs: parse_var(
                ENV_RATE_LIMIT_WINDOW_SECS,
                defaults.rate_limit_window_secs,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_FETCH_TIMEOUT_SECS,
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.max_papers == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_MAX_PAPERS,
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, value) in [
            (ENV_CROSSREF_API_URL, &self.crossref_api_url),
            (ENV_GITHUB_API_URL, &self.github_api_url),
            (ENV_HUGGINGFACE_URL, &self.huggingface_url),
        ] {
            url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
                field,
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    /// Base URL of the CrossRef REST API.
    pub fn crossref_api_url(&self) -> &str {
        &self.crossref_api_url
    }
    /// Base URL of the GitHub REST API.
    pub fn github_api_url(&self) -> &str {
        &self.github_api_url
    }
    /// Base URL of the Hugging Face hub (serves both `/api` and raw files).
    pub fn huggingface_url(&self) -> &str {
        &self.huggingface_url
    }
    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }
    /// Timeout applied to each individual source fetch.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
    pub fn max_papers(&self) -> usize {
        self.max_papers
    }
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
    pub fn rate_limit_max_requests(&self) -> u32 {
        self.rate_limit_max_requests
    }
    pub fn rate_limit_window_secs(&self) -> i64 {
        self.rate_limit_window_secs
    }

    /// Point all three API-backed sources at one base URL (used with mock servers).
    pub fn with_api_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.crossref_api_url = base.clone();
        self.github_api_url = base.clone();
        self.huggingface_url = base;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_rate_limit(mut self, max_requests: u32, window_secs: i64) -> Self {
        self.rate_limit_max_requests = max_requests;
        self.rate_limit_window_secs = window_secs;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            crossref_api_url: DEFAULT_CROSSREF_API_URL.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            huggingface_url: DEFAULT_HUGGINGFACE_URL.to_string(),
            github_token: None,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_papers: DEFAULT_MAX_PAPERS,
            log_format: LogFormat::Text,
            rate_limit_max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

fn parse_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                field: key,
                reason: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Ensure environment-variable manipulating tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            ENV_BIND_ADDR,
            ENV_CROSSREF_API_URL,
            ENV_GITHUB_API_URL,
            ENV_HUGGINGFACE_URL,
            ENV_GITHUB_TOKEN,
            ENV_FETCH_TIMEOUT_SECS,
            ENV_MAX_PAPERS,
            ENV_LOG_FORMAT,
            ENV_RATE_LIMIT_MAX_REQUESTS,
            ENV_RATE_LIMIT_WINDOW_SECS,
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_when_env_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.crossref_api_url(), DEFAULT_CROSSREF_API_URL);
        assert_eq!(cfg.github_api_url(), DEFAULT_GITHUB_API_URL);
        assert_eq!(cfg.huggingface_url(), DEFAULT_HUGGINGFACE_URL);
        assert_eq!(cfg.github_token(), None);
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.max_papers(), 5);
        assert_eq!(cfg.log_format(), LogFormat::Text);
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn overrides_when_env_present() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_BIND_ADDR, "0.0.0.0:9000");
            env::set_var(ENV_GITHUB_API_URL, "http://localhost:4010");
            env::set_var(ENV_GITHUB_TOKEN, "ghp_example");
            env::set_var(ENV_FETCH_TIMEOUT_SECS, "3");
            env::set_var(ENV_MAX_PAPERS, "2");
            env::set_var(ENV_LOG_FORMAT, "JSON");
        }
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9000");
        assert_eq!(cfg.github_api_url(), "http://localhost:4010");
        assert_eq!(cfg.github_token(), Some("ghp_example"));
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.max_papers(), 2);
        assert_eq!(cfg.log_format(), LogFormat::Json);
        clear_env();
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_FETCH_TIMEOUT_SECS, "soon");
        }
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_FETCH_TIMEOUT_SECS));
        clear_env();
    }

    #[test]
    fn rejects_zero_timeout_and_bad_urls() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_FETCH_TIMEOUT_SECS, "0");
        }
        assert!(Config::from_env().is_err());
        clear_env();
        unsafe {
            env::set_var(ENV_HUGGINGFACE_URL, "not a url");
        }
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    fn api_base_override_applies_to_every_source() {
        let cfg = Config::default().with_api_base_url("http://127.0.0.1:1234");
        assert_eq!(cfg.crossref_api_url(), "http://127.0.0.1:1234");
        assert_eq!(cfg.github_api_url(), "http://127.0.0.1:1234");
        assert_eq!(cfg.huggingface_url(), "http://127.0.0.1:1234");
    }
}
