//! # lectern-core
//!
//! Core traits and types for the Lectern drafting pipeline.
//!
//! ## Overview
//!
//! This crate provides the foundational abstractions shared by the model
//! client and pipeline crates:
//!
//! - [`LanguageModel`] - The trait every model backend implements
//! - [`GenerationRequest`] / [`Generation`] - One model call and its result
//! - [`CritiqueReport`] / [`PedagogyReport`] / [`EditBatch`] - Structured
//!   reviewer output, parsed from model JSON
//! - [`ProgressEvent`] / [`ProgressStream`] - Streamed run progress
//! - [`LecternError`] / [`Result`] - Unified error handling
//!
//! ## Core Trait
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait LanguageModel: Send + Sync {
//!     fn name(&self) -> &str;
//!     async fn generate(&self, request: GenerationRequest) -> Result<Generation>;
//! }
//! ```
//!
//! Backends are interchangeable behind this trait; the pipeline crate never
//! talks to a provider API directly.

pub mod error;
pub mod event;
pub mod model;
pub mod review;

pub use error::{LecternError, Result};
pub use event::{ProgressEvent, ProgressStream, Stage};
pub use model::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, Generation, GenerationRequest, LanguageModel,
    TokenUsage,
};
pub use review::{
    CritiqueFinding, CritiqueReport, EditBatch, EditProposal, FeedbackKind, PedagogyPoint,
    PedagogyReport, Severity,
};
