//! Anthropic client implementation.

use super::config::{ANTHROPIC_VERSION, AnthropicConfig, PROMPT_CACHING_BETA};
use super::wire::{MessagesRequest, MessagesResponse};
use crate::limiter::RateLimiter;
use crate::retry::{RetryPolicy, is_transient_error, is_transient_status, with_retry};
use async_trait::async_trait;
use lectern_core::{Generation, GenerationRequest, LanguageModel, LecternError, Result};
use reqwest::Client;
use std::sync::Arc;

/// [`LanguageModel`] backed by the Anthropic Messages API.
///
/// Every outbound attempt first claims a slot from the shared rate limiter,
/// and transient failures are retried under the configured policy. Which
/// Claude model answers is chosen per request, so one client serves all
/// pipeline stages.
pub struct AnthropicModel {
    client: Client,
    config: AnthropicConfig,
    retry_policy: RetryPolicy,
    limiter: Arc<RateLimiter>,
}

impl AnthropicModel {
    /// Create a new Anthropic client.
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| LecternError::Model(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            retry_policy: RetryPolicy::default(),
            limiter: Arc::new(RateLimiter::default()),
        })
    }

    /// Create a client from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(AnthropicConfig::from_env()?)
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Share a rate limiter with other clients.
    #[must_use]
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    fn api_url(&self) -> String {
        format!("{}/v1/messages", self.config.effective_base_url().trim_end_matches('/'))
    }
}

#[async_trait]
impl LanguageModel for AnthropicModel {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Generation> {
        let api_url = self.api_url();
        let api_key = self.config.api_key.clone();
        let body = MessagesRequest::from_generation_request(&request);
        let caching = request.cached_context.is_some();

        let response = with_retry(&self.retry_policy, is_transient_error, || {
            let client = self.client.clone();
            let api_url = api_url.clone();
            let api_key = api_key.clone();
            let body = body.clone();
            let limiter = Arc::clone(&self.limiter);
            async move {
                limiter.acquire().await;

                let mut http_request = client
                    .post(&api_url)
                    .header("x-api-key", api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .header("Content-Type", "application/json");
                if caching {
                    http_request = http_request.header("anthropic-beta", PROMPT_CACHING_BETA);
                }

                let response = http_request.json(&body).send().await.map_err(|e| {
                    LecternError::Model(format!("Anthropic API request failed: {}", e))
                })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let error_text = response.text().await.unwrap_or_default();
                    let retryability = if is_transient_status(status.as_u16()) {
                        "retryable"
                    } else {
                        "non-retryable"
                    };
                    return Err(LecternError::Model(format!(
                        "Anthropic API error ({}, {}): {}",
                        status, retryability, error_text
                    )));
                }

                response.json::<MessagesResponse>().await.map_err(|e| {
                    LecternError::Model(format!("Failed to parse Anthropic response: {}", e))
                })
            }
        })
        .await?;

        let usage = response.usage;
        if usage.cache_read_input_tokens > 0 || usage.cache_creation_input_tokens > 0 {
            tracing::debug!(
                cache_read = usage.cache_read_input_tokens,
                cache_created = usage.cache_creation_input_tokens,
                model = %request.model,
                "Prompt cache activity"
            );
        }

        Ok(Generation::new(response.text(), response.token_usage()))
    }
}
