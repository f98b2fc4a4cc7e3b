//! # lectern-pipeline
//!
//! Iterative critique-and-revise pipeline for long-form educational content.
//!
//! ## Overview
//!
//! `lectern-pipeline` turns a topic into a finished teaching document by
//! looping a draft through reviewer models until the critique comes back
//! clean or the iteration budget runs out. Progress streams to the caller as
//! it happens, with per-call token usage and cost attached.
//!
//! ## Features
//!
//! - **Draft Generation**: lecture notes or pre-read notes from a topic and subtopics
//! - **Concurrent Critique**: accuracy and pedagogy reviews run in parallel over shared cached context
//! - **Surgical Edits**: quoted replacements applied exactly, with whitespace-tolerant and fuzzy fallbacks
//! - **Early Stop**: a clean, high-scoring critique ends the loop before the budget
//! - **Streaming Progress**: every stage reports status, content, usage, and cost
//! - **Cooperative Cancellation**: a shared [`StopSignal`] halts runs at stage boundaries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use futures::StreamExt;
//! use lectern_model::AnthropicModel;
//! use lectern_pipeline::{Pipeline, PipelineConfig, RunRequest};
//!
//! let model = Arc::new(AnthropicModel::from_env()?);
//! let pipeline = Pipeline::new(model, PipelineConfig::default());
//!
//! let request = RunRequest::new("Photosynthesis", "light reactions, calvin cycle")
//!     .with_audience("High School Biology");
//! let mut events = pipeline.run(request);
//! while let Some(event) = events.next().await {
//!     println!("{event:?}");
//! }
//! ```

mod compaction;
pub mod config;
pub mod controller;
mod coordinator;
mod parse;
pub mod patch;
pub mod stages;
pub mod stop;

// Re-exports
pub use config::{DEFAULT_MAX_ITERATIONS, DEFAULT_MODEL, PipelineConfig, StageModels};
pub use controller::{DEFAULT_AUDIENCE, Pipeline, RunRequest};
pub use patch::apply_edits;
pub use stages::ContentMode;
pub use stop::StopSignal;

// Event and model types callers need to drive a run.
pub use lectern_core::{LanguageModel, ProgressEvent, ProgressStream, Stage};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{PipelineConfig, StageModels};
    pub use crate::controller::{Pipeline, RunRequest};
    pub use crate::stages::ContentMode;
    pub use crate::stop::StopSignal;

    pub use lectern_core::{LanguageModel, ProgressEvent, ProgressStream, Stage};
}
