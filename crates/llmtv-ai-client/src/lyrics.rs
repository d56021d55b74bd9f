//! Lyrics generation over chat-completion APIs.
//!
//! Model ids are `provider/model`; the provider prefix picks the HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::AiClientConfig;
use crate::error::{AiError, AiResult};
use crate::http::check_response;
use crate::types::LyricGenerator;

/// Longest lyrics the music model accepts.
pub const MAX_LYRICS_CHARS: usize = 599;

const LYRICS_TEMPERATURE: f64 = 0.8;
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 1024;

pub const LYRICIST_SYSTEM_PROMPT: &str = "You are a creative lyricist. Generate engaging song lyrics based on the user's prompt.

CRITICAL: Keep lyrics under 550 characters total (will be truncated at 599).

Format your output with structure tags like:
[Intro]
lyrics here

[Verse]
lyrics here

[Chorus]
lyrics here

Keep verses concise and catchy. Make the song between 30-60 seconds when performed.
Only output the lyrics with tags, no additional commentary.";

/// Chat API behind a model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsProvider {
    OpenAi,
    Anthropic,
    Gemini,
}

impl LyricsProvider {
    /// Environment variable holding this provider's key.
    pub fn key_env(&self) -> &'static str {
        match self {
            LyricsProvider::OpenAi => "OPENAI_API_KEY",
            LyricsProvider::Anthropic => "ANTHROPIC_API_KEY",
            LyricsProvider::Gemini => "GEMINI_API_KEY",
        }
    }
}

/// Split `provider/model` into provider and bare model name.
pub fn parse_model_id(model_id: &str) -> AiResult<(LyricsProvider, &str)> {
    let (prefix, model) = model_id
        .split_once('/')
        .filter(|(_, model)| !model.is_empty())
        .ok_or_else(|| AiError::UnsupportedProvider(model_id.to_string()))?;

    let provider = match prefix {
        "openai" => LyricsProvider::OpenAi,
        "anthropic" => LyricsProvider::Anthropic,
        "gemini" => LyricsProvider::Gemini,
        _ => return Err(AiError::UnsupportedProvider(model_id.to_string())),
    };
    Ok((provider, model))
}

/// Trim model output and cut it to [`MAX_LYRICS_CHARS`] characters.
pub fn finalize_lyrics(raw: &str) -> String {
    raw.trim().chars().take(MAX_LYRICS_CHARS).collect()
}

fn user_message(prompt: &str) -> String {
    format!("Write song lyrics about: {}", prompt)
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

/// [`LyricGenerator`] that talks to OpenAI, Anthropic or Gemini.
pub struct ChatLyricGenerator {
    http: Client,
    config: AiClientConfig,
}

impl ChatLyricGenerator {
    pub fn new(config: AiClientConfig) -> AiResult<Self> {
        let http = config.http_client()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> AiResult<Self> {
        Self::new(AiClientConfig::from_env())
    }

    async fn openai(&self, model: &str, prompt: &str) -> AiResult<String> {
        let key = self.config.require_openai_key()?;
        let url = format!("{}/v1/chat/completions", self.config.openai_base_url);
        let body = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": LYRICIST_SYSTEM_PROMPT},
                {"role": "user", "content": user_message(prompt)},
            ],
            "temperature": LYRICS_TEMPERATURE,
        });

        let response = self.http.post(&url).bearer_auth(key).json(&body).send().await?;
        let parsed: OpenAiResponse = check_response(response).await?.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::invalid_response("OpenAI returned no message content"))
    }

    async fn anthropic(&self, model: &str, prompt: &str) -> AiResult<String> {
        let key = self.config.require_anthropic_key()?;
        let url = format!("{}/v1/messages", self.config.anthropic_base_url);
        let body = json!({
            "model": model,
            "max_tokens": ANTHROPIC_MAX_TOKENS,
            "system": LYRICIST_SYSTEM_PROMPT,
            "messages": [{"role": "user", "content": user_message(prompt)}],
            "temperature": LYRICS_TEMPERATURE,
        });

        let response = self
            .http
            .post(&url)
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;
        let parsed: AnthropicResponse = check_response(response).await?.json().await?;

        let text: String = parsed.content.into_iter().filter_map(|b| b.text).collect();
        if text.trim().is_empty() {
            return Err(AiError::invalid_response("Anthropic returned no text"));
        }
        Ok(text)
    }

    async fn gemini(&self, model: &str, prompt: &str) -> AiResult<String> {
        let key = self.config.require_gemini_key()?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.gemini_base_url, model
        );
        let body = json!({
            "systemInstruction": {"parts": [{"text": LYRICIST_SYSTEM_PROMPT}]},
            "contents": [{"role": "user", "parts": [{"text": user_message(prompt)}]}],
            "generationConfig": {"temperature": LYRICS_TEMPERATURE},
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;
        let parsed: GeminiResponse = check_response(response).await?.json().await?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AiError::invalid_response("Gemini returned no text"));
        }
        Ok(text)
    }
}

#[async_trait]
impl LyricGenerator for ChatLyricGenerator {
    async fn generate_lyrics(&self, prompt: &str, model_id: &str) -> AiResult<String> {
        let (provider, model) = parse_model_id(model_id)?;
        info!(model = %model_id, "Generating lyrics");

        let raw = match provider {
            LyricsProvider::OpenAi => self.openai(model, prompt).await?,
            LyricsProvider::Anthropic => self.anthropic(model, prompt).await?,
            LyricsProvider::Gemini => self.gemini(model, prompt).await?,
        };

        let lyrics = finalize_lyrics(&raw);
        debug!(chars = lyrics.chars().count(), "Lyrics generated");
        Ok(lyrics)
    }
}
