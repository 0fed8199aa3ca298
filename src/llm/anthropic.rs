use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{Completion, CompletionRequest, Transport};
use crate::config::LlmConfig;
use crate::error::TransportError;

const API_VERSION: &str = "2023-06-01";
const WEB_SEARCH_TOOL: &str = "web_search_20250305";

/// Messages API transport.
#[derive(Debug, Clone)]
pub struct AnthropicTransport {
    client: reqwest::Client,
    config: LlmConfig,
}

impl AnthropicTransport {
    pub fn new(config: LlmConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn endpoint_messages(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
            tools: request.web_search.then(|| {
                vec![Tool {
                    kind: WEB_SEARCH_TOOL,
                    name: "web_search",
                }]
            }),
        }
    }
}

#[async_trait]
impl Transport for AnthropicTransport {
    async fn send(&self, request: &CompletionRequest) -> Result<Completion, TransportError> {
        debug!(
            model = %self.config.model,
            web_search = request.web_search,
            prompt_len = request.prompt.len(),
            "sending completion request"
        );
        let resp = self
            .client
            .post(self.endpoint_messages())
            .timeout(self.config.timeout)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        resp.json::<Completion>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(base_url: &str) -> LlmConfig {
        LlmConfig {
            api_key: "sk-test".into(),
            base_url: base_url.into(),
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 4000,
            timeout: Duration::from_secs(5),
            web_search: true,
        }
    }

    #[test]
    fn endpoint_trims_slash() {
        let t = AnthropicTransport::new(config("https://api.anthropic.com/"));
        assert_eq!(t.endpoint_messages(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn body_with_web_search() {
        let t = AnthropicTransport::new(config("https://api.anthropic.com"));
        let req = CompletionRequest::new("Describe acme.io", true);
        let json = serde_json::to_value(t.body(&req)).unwrap();
        assert_eq!(json["max_tokens"], 4000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Describe acme.io");
        assert_eq!(json["tools"][0]["type"], WEB_SEARCH_TOOL);
    }

    #[test]
    fn body_without_web_search_has_no_tools() {
        let t = AnthropicTransport::new(config("https://api.anthropic.com"));
        let json = serde_json::to_value(t.body(&CompletionRequest::new("hi", false))).unwrap();
        assert!(json.get("tools").is_none());
    }
}
