//! Configuration for the Anthropic provider.

use lectern_core::{LecternError, Result};
use serde::{Deserialize, Serialize};

/// Default Anthropic API base URL.
pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";

/// API version header sent with every request.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Beta header enabling prompt caching, sent only when a request carries
/// cacheable context.
pub const PROMPT_CACHING_BETA: &str = "prompt-caching-2024-07-31";

/// Configuration for the Anthropic API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Anthropic API key.
    pub api_key: String,
    /// Optional custom base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl AnthropicConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), base_url: None }
    }

    /// Read the API key from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| LecternError::Config("ANTHROPIC_API_KEY not set".to_string()))?;
        if api_key.trim().is_empty() {
            return Err(LecternError::Config("ANTHROPIC_API_KEY is empty".to_string()));
        }
        Ok(Self::new(api_key))
    }

    /// Set custom base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Get the effective base URL.
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(ANTHROPIC_API_BASE)
    }
}
