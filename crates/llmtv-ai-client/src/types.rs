//! Service-facing traits and the types they exchange.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use llmtv_models::Transcription;

use crate::error::AiResult;

/// Opaque reference to an in-progress remote generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of a finished remote artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub uri: String,
}

impl MediaRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// State of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Done(MediaRef),
    /// The service reported a terminal failure
    Failed(String),
}

/// Writes song lyrics for a concept.
#[async_trait]
pub trait LyricGenerator: Send + Sync {
    /// `model_id` is `provider/model`, e.g. `openai/gpt-4o`.
    async fn generate_lyrics(&self, prompt: &str, model_id: &str) -> AiResult<String>;
}

/// Sings lyrics in a style and writes the song to `dest`.
#[async_trait]
pub trait MusicGenerator: Send + Sync {
    async fn generate_music(&self, lyrics: &str, style: &str, dest: &Path) -> AiResult<()>;
}

/// Speech-to-text with chunk timestamps.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> AiResult<Transcription>;
}

/// Long-running text-to-video generation.
#[async_trait]
pub trait VideoGenerationApi: Send + Sync {
    /// Start a generation.
    async fn submit(&self, prompt: &str) -> AiResult<OperationHandle>;

    /// Check on a generation.
    async fn poll(&self, handle: &OperationHandle) -> AiResult<OperationStatus>;

    /// Fetch a finished video to `dest`.
    async fn download(&self, media: &MediaRef, dest: &Path) -> AiResult<()>;
}
