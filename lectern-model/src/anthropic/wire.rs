//! Request and response payloads for the Anthropic Messages API.

use lectern_core::{GenerationRequest, TokenUsage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub system: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Message {
    pub role: &'static str,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub(crate) enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CacheControl {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl MessagesRequest {
    /// Lay out one user turn. Cacheable context goes in its own block marked
    /// `cache_control: ephemeral`, ahead of the per-call prompt, so providers
    /// can reuse the cached prefix across calls.
    pub(crate) fn from_generation_request(request: &GenerationRequest) -> Self {
        let content = match &request.cached_context {
            Some(context) => MessageContent::Blocks(vec![
                ContentBlock {
                    kind: "text",
                    text: context.clone(),
                    cache_control: Some(CacheControl { kind: "ephemeral" }),
                },
                ContentBlock { kind: "text", text: request.user.clone(), cache_control: None },
            ]),
            None => MessageContent::Text(request.user.clone()),
        };

        Self {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.clone(),
            messages: vec![Message { role: "user", content }],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResponseBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    #[serde(default)]
    pub cache_creation_input_tokens: u32,
    #[serde(default)]
    pub cache_read_input_tokens: u32,
}

impl MessagesResponse {
    /// Concatenated text across all text blocks.
    pub(crate) fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect()
    }

    pub(crate) fn token_usage(&self) -> TokenUsage {
        TokenUsage::new(self.usage.input_tokens, self.usage.output_tokens)
    }
}
