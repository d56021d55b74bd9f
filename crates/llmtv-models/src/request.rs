//! Music video generation requests.

use serde::{Deserialize, Serialize};

/// Style used when the user gives no music style description.
pub const DEFAULT_STYLE_PROMPT: &str =
    "Catchy pop song with modern production, upbeat tempo, clear vocals";

/// Default lyrics model (`provider/model`).
pub const DEFAULT_LYRICS_MODEL: &str = "openai/gpt-4o";

/// Lyrics models offered by the CLI.
pub const LYRICS_MODELS: &[&str] = &[
    "openai/gpt-4o",
    "openai/gpt-4o-mini",
    "anthropic/claude-3-5-sonnet-20241022",
    "anthropic/claude-3-5-haiku-20241022",
    "gemini/gemini-2.0-flash-exp",
    "gemini/gemini-1.5-pro",
    "gemini/gemini-1.5-flash",
];

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicVideoRequest {
    /// Song concept, e.g. "a song about cats taking over the world"
    pub concept_prompt: String,
    /// Optional music style/genre description
    #[serde(default)]
    pub style_description: Option<String>,
    /// Lyrics model id
    #[serde(default = "default_lyrics_model")]
    pub lyrics_model: String,
}

fn default_lyrics_model() -> String {
    DEFAULT_LYRICS_MODEL.to_string()
}

impl MusicVideoRequest {
    pub fn new(concept_prompt: impl Into<String>) -> Self {
        Self {
            concept_prompt: concept_prompt.into(),
            style_description: None,
            lyrics_model: default_lyrics_model(),
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style_description = Some(style.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.lyrics_model = model.into();
        self
    }

    /// Style prompt for music and video generation.
    ///
    /// Blank descriptions fall back to [`DEFAULT_STYLE_PROMPT`].
    pub fn style_prompt(&self) -> String {
        match self.style_description.as_deref().map(str::trim) {
            Some(style) if !style.is_empty() => style.to_string(),
            _ => DEFAULT_STYLE_PROMPT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_prompt_fallback() {
        let request = MusicVideoRequest::new("cats");
        assert_eq!(request.style_prompt(), DEFAULT_STYLE_PROMPT);

        let blank = MusicVideoRequest::new("cats").with_style("   ");
        assert_eq!(blank.style_prompt(), DEFAULT_STYLE_PROMPT);

        let styled = MusicVideoRequest::new("cats").with_style("Lo-fi jazz");
        assert_eq!(styled.style_prompt(), "Lo-fi jazz");
    }

    #[test]
    fn test_default_model_is_offered() {
        assert!(LYRICS_MODELS.contains(&DEFAULT_LYRICS_MODEL));
        let request: MusicVideoRequest =
            serde_json::from_str(r#"{"concept_prompt": "rain"}"#).unwrap();
        assert_eq!(request.lyrics_model, DEFAULT_LYRICS_MODEL);
    }
}
