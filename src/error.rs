/// Failures of the outbound completion request itself.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("network: {0}")]
    Network(String),
    #[error("undecodable response: {0}")]
    Decode(String),
    #[error("model error {kind}: {message}")]
    Envelope { kind: String, message: String },
}

/// Hard errors of the structured client. Only surfaced when the caller gave
/// no fallback.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuredError {
    #[error("invalid response: transport failed: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid response: malformed payload: {reason}")]
    MalformedPayload { reason: String, snippet: String },
    #[error("invalid response: payload failed validation")]
    Validation,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("not configured: missing {0}")]
    Missing(&'static str),
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
