//! Scriptable in-memory model for tests.

use async_trait::async_trait;
use lectern_core::{Generation, GenerationRequest, LanguageModel, LecternError, Result, TokenUsage};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Token usage attached to scripted replies unless a test supplies its own.
pub const MOCK_USAGE: TokenUsage = TokenUsage { input_tokens: 1_000, output_tokens: 500 };

#[derive(Clone)]
enum Scripted {
    Reply(Generation),
    Failure(String),
}

/// [`LanguageModel`] that replays scripted responses.
///
/// Responses are keyed by the requested model id, so a test can drive each
/// pipeline stage independently even when stages run concurrently. Queued
/// responses are consumed in order; `script_always` installs a fallback used
/// once a queue runs dry.
#[derive(Default)]
pub struct MockModel {
    name: String,
    queues: Mutex<HashMap<String, VecDeque<Scripted>>>,
    fallbacks: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self { name: "mock".to_string(), ..Self::default() }
    }

    fn push(self, model: &str, scripted: Scripted) -> Self {
        self.queues
            .lock()
            .expect("mock queues poisoned")
            .entry(model.to_string())
            .or_default()
            .push_back(scripted);
        self
    }

    /// Queue a plain-text reply for `model`, with [`MOCK_USAGE`] accounting.
    pub fn script_text(self, model: &str, text: impl Into<String>) -> Self {
        self.push(model, Scripted::Reply(Generation::new(text, MOCK_USAGE)))
    }

    /// Queue a reply with explicit usage.
    pub fn script_generation(self, model: &str, generation: Generation) -> Self {
        self.push(model, Scripted::Reply(generation))
    }

    /// Queue a JSON reply, serialized compactly.
    pub fn script_json(self, model: &str, value: &serde_json::Value) -> Self {
        let text = value.to_string();
        self.push(model, Scripted::Reply(Generation::new(text, MOCK_USAGE)))
    }

    /// Queue a model error for `model`.
    pub fn script_error(self, model: &str, message: impl Into<String>) -> Self {
        self.push(model, Scripted::Failure(message.into()))
    }

    /// Install a fallback reply served whenever `model`'s queue is empty.
    pub fn script_always(self, model: &str, value: &serde_json::Value) -> Self {
        let reply = Scripted::Reply(Generation::new(value.to_string(), MOCK_USAGE));
        self.fallbacks.lock().expect("mock fallbacks poisoned").insert(model.to_string(), reply);
        self
    }

    /// All requests seen so far, in arrival order.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().expect("mock calls poisoned").clone()
    }

    /// Number of requests that named `model`.
    pub fn call_count(&self, model: &str) -> usize {
        self.calls
            .lock()
            .expect("mock calls poisoned")
            .iter()
            .filter(|request| request.model == model)
            .count()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Generation> {
        let model = request.model.clone();
        self.calls.lock().expect("mock calls poisoned").push(request);

        let next = {
            let mut queues = self.queues.lock().expect("mock queues poisoned");
            queues.get_mut(&model).and_then(|queue| queue.pop_front())
        };
        let next = next.or_else(|| {
            self.fallbacks.lock().expect("mock fallbacks poisoned").get(&model).cloned()
        });

        match next {
            Some(Scripted::Reply(generation)) => Ok(generation),
            Some(Scripted::Failure(message)) => Err(LecternError::Model(message)),
            None => Err(LecternError::Model(format!("no scripted response for model '{model}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_pop_in_order() {
        let mock = MockModel::new()
            .script_text("draft-model", "first")
            .script_text("draft-model", "second");

        let request = GenerationRequest::new("draft-model", "sys", "go");
        let first = mock.generate(request.clone()).await.unwrap();
        let second = mock.generate(request).await.unwrap();

        assert_eq!(first.text, "first");
        assert_eq!(second.text, "second");
        assert_eq!(mock.call_count("draft-model"), 2);
    }

    #[tokio::test]
    async fn test_scripts_are_keyed_by_model() {
        let mock = MockModel::new()
            .script_text("a-model", "for a")
            .script_text("b-model", "for b");

        let b = mock.generate(GenerationRequest::new("b-model", "s", "u")).await.unwrap();
        assert_eq!(b.text, "for b");
        assert_eq!(mock.call_count("a-model"), 0);
    }

    #[tokio::test]
    async fn test_scripted_error_and_exhaustion() {
        let mock = MockModel::new().script_error("m", "HTTP 500 overloaded");

        let err = mock.generate(GenerationRequest::new("m", "s", "u")).await.unwrap_err();
        assert!(matches!(err, LecternError::Model(_)));

        let err = mock.generate(GenerationRequest::new("m", "s", "u")).await.unwrap_err();
        assert!(err.to_string().contains("no scripted response"));
    }

    #[tokio::test]
    async fn test_fallback_serves_after_queue_drains() {
        let mock = MockModel::new()
            .script_text("m", "queued")
            .script_always("m", &serde_json::json!({ "ok": true }));

        let first = mock.generate(GenerationRequest::new("m", "s", "u")).await.unwrap();
        assert_eq!(first.text, "queued");

        let second = mock.generate(GenerationRequest::new("m", "s", "u")).await.unwrap();
        let third = mock.generate(GenerationRequest::new("m", "s", "u")).await.unwrap();
        assert_eq!(second.text, third.text);
        assert!(second.text.contains("\"ok\""));
    }
}
