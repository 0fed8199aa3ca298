use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

const API_KEY: &str = "ANTHROPIC_API_KEY";
const BASE_URL: &str = "GTM_LLM_BASE_URL";
const MODEL: &str = "GTM_LLM_MODEL";
const MAX_TOKENS: &str = "GTM_LLM_MAX_TOKENS";
const TIMEOUT_MS: &str = "GTM_LLM_TIMEOUT_MS";
const WEB_SEARCH: &str = "GTM_LLM_WEB_SEARCH";

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Settings for the completion transport.
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub web_search: bool,
}

impl LlmConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env)
    }

    /// Build from any key lookup. Blank values must already map to `None`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY).ok_or(ConfigError::Missing(API_KEY))?;
        let max_tokens = parse_or(&lookup, MAX_TOKENS, DEFAULT_MAX_TOKENS)?;
        let timeout_ms = parse_or(&lookup, TIMEOUT_MS, DEFAULT_TIMEOUT_MS)?;
        let web_search = match lookup(WEB_SEARCH) {
            None => true,
            Some(v) => parse_flag(&v).ok_or(ConfigError::Invalid { key: WEB_SEARCH, value: v })?,
        };

        Ok(Self {
            api_key,
            base_url: lookup(BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup(MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            timeout: Duration::from_millis(timeout_ms),
            web_search,
        })
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("web_search", &self.web_search)
            .finish()
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
