//! Client configuration.

use std::time::Duration;

use crate::error::{AiError, AiResult};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const REPLICATE_BASE_URL: &str = "https://api.replicate.com";

/// Credentials and endpoints for every remote service.
///
/// Keys are optional here; a missing key only becomes an error when the
/// client that needs it is built or called.
#[derive(Debug, Clone)]
pub struct AiClientConfig {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub replicate_api_token: Option<String>,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
    pub replicate_base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Delay between Replicate prediction polls
    pub replicate_poll_interval: Duration,
    /// Upper bound on one Replicate prediction
    pub replicate_timeout: Duration,
}

impl Default for AiClientConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            gemini_api_key: None,
            replicate_api_token: None,
            openai_base_url: OPENAI_BASE_URL.to_string(),
            anthropic_base_url: ANTHROPIC_BASE_URL.to_string(),
            gemini_base_url: GEMINI_BASE_URL.to_string(),
            replicate_base_url: REPLICATE_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            replicate_poll_interval: Duration::from_secs(2),
            replicate_timeout: Duration::from_secs(900),
        }
    }
}

impl AiClientConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            replicate_api_token: non_empty_var("REPLICATE_API_TOKEN"),
            openai_base_url: non_empty_var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            anthropic_base_url: non_empty_var("ANTHROPIC_BASE_URL")
                .unwrap_or(defaults.anthropic_base_url),
            gemini_base_url: non_empty_var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            replicate_base_url: non_empty_var("REPLICATE_BASE_URL")
                .unwrap_or(defaults.replicate_base_url),
            request_timeout: Duration::from_secs(
                std::env::var("LLMTV_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            replicate_poll_interval: defaults.replicate_poll_interval,
            replicate_timeout: Duration::from_secs(
                std::env::var("LLMTV_REPLICATE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
        }
    }

    pub fn require_openai_key(&self) -> AiResult<String> {
        require(&self.openai_api_key, "OPENAI_API_KEY")
    }

    pub fn require_anthropic_key(&self) -> AiResult<String> {
        require(&self.anthropic_api_key, "ANTHROPIC_API_KEY")
    }

    pub fn require_gemini_key(&self) -> AiResult<String> {
        require(&self.gemini_api_key, "GEMINI_API_KEY")
    }

    pub fn require_replicate_token(&self) -> AiResult<String> {
        require(&self.replicate_api_token, "REPLICATE_API_TOKEN")
    }

    /// Names of the environment variables that are required but missing.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        [
            ("GEMINI_API_KEY", &self.gemini_api_key),
            ("REPLICATE_API_TOKEN", &self.replicate_api_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub(crate) fn http_client(&self) -> AiResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(AiError::Network)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require(value: &Option<String>, name: &str) -> AiResult<String> {
    value
        .clone()
        .ok_or_else(|| AiError::config(format!("{} not set", name)))
}
