//! Anthropic provider implementation.
//!
//! This module talks to the Anthropic Messages API and serves every pipeline
//! stage through one client:
//!
//! - **Per-request models**: the Claude model id travels on each
//!   [`GenerationRequest`](lectern_core::GenerationRequest), so stages can use
//!   different snapshots without separate clients
//! - **Prompt caching**: requests carrying `cached_context` are laid out as an
//!   ephemeral cache block plus the per-call prompt
//! - **Throttling and retry**: calls pass through the shared
//!   [`RateLimiter`](crate::RateLimiter) and transient failures back off under
//!   the configured [`RetryPolicy`](crate::RetryPolicy)
//!
//! # Example
//!
//! ```rust,ignore
//! use lectern_model::anthropic::{AnthropicConfig, AnthropicModel};
//!
//! let model = AnthropicModel::from_env()?;
//!
//! // Or with an explicit key and custom endpoint:
//! let model = AnthropicModel::new(
//!     AnthropicConfig::new("sk-ant-...").with_base_url("http://localhost:9090"),
//! )?;
//! ```

mod client;
mod config;
mod wire;

pub use client::AnthropicModel;
pub use config::{ANTHROPIC_API_BASE, ANTHROPIC_VERSION, AnthropicConfig, PROMPT_CACHING_BETA};
