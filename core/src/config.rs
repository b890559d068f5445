//! Client configuration.
//!
//! The API key and base URL are fixed at construction and never change
//! afterwards. `from_env` is a convenience for the usual environment
//! variables; nothing else in the crate reads the environment.

use crate::error::ApiError;

/// Public LangSmith API origin used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.smith.langchain.com/api/v1";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "LANGSMITH_API_KEY";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "LANGSMITH_URL";

/// API key and base URL for a client.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
}

impl ClientConfig {
    /// Configuration for `api_key` against the public API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at another deployment (self-hosted, mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read `LANGSMITH_API_KEY` and the optional `LANGSMITH_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ApiError::Configuration("langsmith api key is required".to_string()))?;
        let config = Self::new(api_key);
        Ok(match lookup(BASE_URL_ENV).filter(|url| !url.is_empty()) {
            Some(url) => config.with_base_url(url),
            None => config,
        })
    }
}

// Keep the key out of logs and panic messages.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
