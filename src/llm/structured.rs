use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{CompletionRequest, Transport};
use crate::error::{StructuredError, TransportError};

/// Characters of an unparseable payload kept for diagnostics.
pub const SNIPPET_CHARS: usize = 500;

const RESEARCH_PREFIX: &str =
    "Use your web_search tool to research this request. Search the web first, then provide your analysis.\n\n";

const JSON_SUFFIX: &str = "\n\nRespond with ONLY a single valid JSON value. No prose before or after it, no markdown, no code fences. \
The response must start with { or [ and end with the matching } or ].";

type Validator<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// What a caller expects back from [`StructuredClient::request_structured`]:
/// an optional predicate, an optional fallback and an optional description of
/// the payload shape that is embedded in the prompt.
pub struct StructuredSchema<T> {
    validate: Option<Validator<T>>,
    fallback: Option<T>,
    describe: Option<String>,
}

impl<T> Default for StructuredSchema<T> {
    fn default() -> Self {
        Self {
            validate: None,
            fallback: None,
            describe: None,
        }
    }
}

impl<T> StructuredSchema<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(mut self, f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.validate = Some(Box::new(f));
        self
    }

    /// With a fallback every failure resolves to it instead of an error.
    pub fn fallback(mut self, value: T) -> Self {
        self.fallback = Some(value);
        self
    }

    pub fn describe(mut self, shape: impl Into<String>) -> Self {
        self.describe = Some(shape.into());
        self
    }

    fn accepts(&self, value: &T) -> bool {
        self.validate.as_ref().map_or(true, |f| f(value))
    }
}

impl<T: Clone> StructuredSchema<T> {
    fn settle(&self, err: StructuredError) -> Result<T, StructuredError> {
        match &self.fallback {
            Some(v) => {
                debug!(error = %err, "using fallback");
                Ok(v.clone())
            }
            None => Err(err),
        }
    }
}

/// Prompt-in, typed-value-out client over a [`Transport`]. Holds no state
/// besides the transport, so one client can serve concurrent requests.
pub struct StructuredClient<Tr> {
    transport: Tr,
    web_search: bool,
}

impl<Tr: Transport> StructuredClient<Tr> {
    pub fn new(transport: Tr, web_search: bool) -> Self {
        Self { transport, web_search }
    }

    pub fn transport(&self) -> &Tr {
        &self.transport
    }

    /// Ask for a JSON payload and decode it as `T`.
    pub async fn request_structured<T>(&self, prompt: &str, schema: &StructuredSchema<T>) -> Result<T, StructuredError>
    where
        T: DeserializeOwned + Clone,
    {
        let request = CompletionRequest::new(strict_prompt(prompt, schema.describe.as_deref()), self.web_search);

        let mut completion = match self.transport.send(&request).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "structured request failed");
                return schema.settle(e.into());
            }
        };
        if let Some(env) = completion.error.take() {
            warn!(kind = %env.kind, message = %env.message, "model returned an error envelope");
            return schema.settle(TransportError::from(env).into());
        }

        let text = completion.text();
        debug!(len = text.len(), "structured response received");
        let value: T = match parse_payload(&text) {
            Ok(v) => v,
            Err(reason) => {
                let snippet = snippet(&text);
                warn!(%reason, %snippet, "malformed structured payload");
                return schema.settle(StructuredError::MalformedPayload { reason, snippet });
            }
        };

        if !schema.accepts(&value) {
            warn!("structured payload rejected by validator");
            return schema.settle(StructuredError::Validation);
        }
        Ok(value)
    }

    /// Free-text channel. With web search on, the prompt is prefixed with the
    /// research instruction.
    pub async fn request_text(&self, prompt: &str) -> Result<String, StructuredError> {
        let prompt = if self.web_search {
            format!("{RESEARCH_PREFIX}{prompt}")
        } else {
            prompt.to_string()
        };
        let mut completion = self
            .transport
            .send(&CompletionRequest::new(prompt, self.web_search))
            .await
            .inspect_err(|e| warn!(error = %e, "text request failed"))?;
        if let Some(env) = completion.error.take() {
            warn!(kind = %env.kind, message = %env.message, "model returned an error envelope");
            return Err(TransportError::from(env).into());
        }
        let text = completion.text();
        if text.trim().is_empty() {
            warn!("empty completion");
            return Err(TransportError::Decode("no text in completion".to_string()).into());
        }
        Ok(text)
    }
}

fn strict_prompt(prompt: &str, describe: Option<&str>) -> String {
    match describe {
        Some(shape) => format!("{prompt}{JSON_SUFFIX}\n\nUse exactly this shape:\n{shape}"),
        None => format!("{prompt}{JSON_SUFFIX}"),
    }
}

/// Drop an opening fence line (with or without a language tag) and a closing
/// fence.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = match rest.find('\n') {
            Some(i) => &rest[i + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Text from the first `{` or `[` on.
pub fn locate_payload(text: &str) -> Option<&str> {
    text.find(&['{', '['][..]).map(|i| &text[i..])
}

/// Decode the first JSON value in `text`; anything after it is ignored.
pub fn parse_payload<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let body = locate_payload(strip_code_fence(text)).ok_or_else(|| "no JSON object or array found".to_string())?;
    match serde_json::Deserializer::from_str(body).into_iter::<T>().next() {
        Some(Ok(v)) => Ok(v),
        Some(Err(e)) => Err(e.to_string()),
        None => Err("empty payload".to_string()),
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

// ── Tests ──
