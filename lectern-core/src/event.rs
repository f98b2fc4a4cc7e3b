//! Progress events emitted while a pipeline run executes.

use crate::model::TokenUsage;
use futures::stream::Stream;
use serde::Serialize;
use std::fmt;
use std::pin::Pin;

/// Stream of progress events for one pipeline run. Failures travel in-band as
/// [`ProgressEvent::Error`]; the stream itself never yields `Err`.
pub type ProgressStream = Pin<Box<dyn Stream<Item = ProgressEvent> + Send>>;

/// Pipeline stage an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Draft,
    AccuracyCritique,
    PedagogyCritique,
    Edit,
    Finalize,
    /// Orchestration-level events that belong to no single model call.
    Pipeline,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Draft => "draft",
            Stage::AccuracyCritique => "accuracy_critique",
            Stage::PedagogyCritique => "pedagogy_critique",
            Stage::Edit => "edit",
            Stage::Finalize => "finalize",
            Stage::Pipeline => "pipeline",
        };
        write!(f, "{name}")
    }
}

/// Events emitted during a pipeline run.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Progress from one stage: a short status line, optionally the produced
    /// content, and the cost of the underlying model call.
    Step {
        stage: Stage,
        model: String,
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        usage: TokenUsage,
        cost: f64,
    },

    /// Recoverable problem; the run continues in a degraded form.
    Warning { stage: Stage, message: String },

    /// Fatal problem; the stream ends after this event.
    Error { message: String },

    /// Terminal event carrying the finished document and the total run cost.
    Completed { document: String, total_cost: f64 },
}

impl ProgressEvent {
    /// Create a status-only step event.
    pub fn step(stage: Stage, model: &str, status: impl Into<String>) -> Self {
        Self::Step {
            stage,
            model: model.to_string(),
            status: status.into(),
            content: None,
            usage: TokenUsage::default(),
            cost: 0.0,
        }
    }

    /// Create a step event carrying produced content and call accounting.
    pub fn step_detail(
        stage: Stage,
        model: &str,
        status: impl Into<String>,
        content: Option<String>,
        usage: TokenUsage,
        cost: f64,
    ) -> Self {
        Self::Step { stage, model: model.to_string(), status: status.into(), content, usage, cost }
    }

    /// Create a warning event.
    pub fn warning(stage: Stage, message: impl Into<String>) -> Self {
        Self::Warning { stage, message: message.into() }
    }

    /// Create a fatal error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    /// Create the terminal completion event.
    pub fn completed(document: impl Into<String>, total_cost: f64) -> Self {
        Self::Completed { document: document.into(), total_cost }
    }

    /// True for events after which the stream ends.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_defaults() {
        let event = ProgressEvent::step(Stage::Draft, "claude-sonnet-4-5-20250929", "Drafting...");
        match event {
            ProgressEvent::Step { stage, model, status, content, usage, cost } => {
                assert_eq!(stage, Stage::Draft);
                assert_eq!(model, "claude-sonnet-4-5-20250929");
                assert_eq!(status, "Drafting...");
                assert!(content.is_none());
                assert_eq!(usage, TokenUsage::default());
                assert_eq!(cost, 0.0);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_terminal_events() {
        assert!(ProgressEvent::error("boom").is_terminal());
        assert!(ProgressEvent::completed("doc", 1.0).is_terminal());
        assert!(!ProgressEvent::step(Stage::Pipeline, "system", "Iteration 1").is_terminal());
        assert!(!ProgressEvent::warning(Stage::Edit, "skipped").is_terminal());
    }

    #[test]
    fn test_serializes_tagged() {
        let event = ProgressEvent::warning(Stage::Edit, "Could not apply strict edits.");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "warning");
        assert_eq!(json["stage"], "edit");
        assert_eq!(json["message"], "Could not apply strict edits.");
    }

    #[test]
    fn test_step_serialization_skips_empty_content() {
        let event = ProgressEvent::step(Stage::Finalize, "system", "Complete!");
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["stage"], "finalize");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::AccuracyCritique.to_string(), "accuracy_critique");
        assert_eq!(Stage::Pipeline.to_string(), "pipeline");
    }
}
