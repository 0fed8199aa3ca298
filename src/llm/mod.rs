pub mod anthropic;
pub mod shapes;
pub mod structured;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

pub use anthropic::AnthropicTransport;
pub use structured::{StructuredClient, StructuredSchema};

/// One prompt, plus the capability flags the endpoint should enable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub web_search: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, web_search: bool) -> Self {
        Self {
            prompt: prompt.into(),
            web_search,
        }
    }
}

/// A content part of the model's answer. Only `text` parts carry prose; tool
/// use and search results come back as other types and are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

impl From<ErrorEnvelope> for TransportError {
    fn from(env: ErrorEnvelope) -> Self {
        TransportError::Envelope {
            kind: env.kind,
            message: env.message,
        }
    }
}

/// Response body of a completion call: content parts or an error envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
}

impl Completion {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            error: None,
        }
    }

    pub fn from_error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            content: Vec::new(),
            error: Some(ErrorEnvelope {
                kind: kind.into(),
                message: message.into(),
            }),
        }
    }

    /// All text parts joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The completion endpoint. Implementations must be shareable across tasks so
/// callers can fan requests out concurrently.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &CompletionRequest) -> Result<Completion, TransportError>;
}
