//! # lectern-model
//!
//! Model backend for the Lectern drafting pipeline.
//!
//! ## Overview
//!
//! This crate provides the concrete [`LanguageModel`](lectern_core::LanguageModel)
//! implementation plus the call-shaping machinery around it:
//!
//! - [`AnthropicModel`] - Anthropic Messages API client with prompt caching
//! - [`RateLimiter`] - trailing-window request throttle shared across stages
//! - [`RetryPolicy`] / [`with_retry`] - bounded exponential backoff with jitter
//! - [`pricing`] - static per-model rates and call cost accounting
//! - [`MockModel`] - scriptable model for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lectern_model::anthropic::AnthropicModel;
//! use std::sync::Arc;
//!
//! let model = Arc::new(AnthropicModel::from_env().unwrap());
//! // Hand the Arc to a pipeline; stage model ids travel per request.
//! ```
//!
//! ## Model Pricing
//!
//! | Model | Input / 1M | Output / 1M |
//! |-------|-----------|-------------|
//! | `claude-sonnet-4-5-20250929` | 300 | 1500 |
//! | `claude-haiku-4-5-20251001` | 100 | 500 |
//! | `claude-opus-4-5-20251101` | 500 | 2500 |
//! | `claude-3-haiku-20240307` | 25 | 125 |
//!
//! Unknown snapshots fall back to their family rate; unknown families bill at
//! the default (sonnet) rate.

pub mod anthropic;
pub mod limiter;
pub mod mock;
pub mod pricing;
pub mod retry;

pub use anthropic::{AnthropicConfig, AnthropicModel};
pub use limiter::{DEFAULT_REQUESTS_PER_MINUTE, RateLimiter};
pub use mock::{MOCK_USAGE, MockModel};
pub use pricing::{ModelPricing, cost_of, pricing_for};
pub use retry::{
    RetryPolicy, is_transient_error, is_transient_message, is_transient_status, with_retry,
};
