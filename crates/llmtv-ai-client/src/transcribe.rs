//! Timestamped transcription with Incredibly Fast Whisper on Replicate.

use std::path::Path;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use tracing::info;

use llmtv_models::Transcription;

use crate::config::AiClientConfig;
use crate::error::{AiError, AiResult};
use crate::replicate::ReplicateClient;
use crate::types::Transcriber;

pub const WHISPER_MODEL: &str = "vaibhavs10/incredibly-fast-whisper:3ab86df6c8f54c11309d4d1f930ac292bad43ace52d10c80d87eb258b3c9f79c";
const WHISPER_BATCH_SIZE: u32 = 64;

pub struct ReplicateTranscriber {
    replicate: ReplicateClient,
}

impl ReplicateTranscriber {
    pub fn new(config: &AiClientConfig) -> AiResult<Self> {
        Ok(Self {
            replicate: ReplicateClient::new(config)?,
        })
    }
}

/// Encode audio bytes as a `data:` URI.
pub fn audio_data_uri(path: &Path, bytes: &[u8]) -> String {
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

#[async_trait]
impl Transcriber for ReplicateTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> AiResult<Transcription> {
        let bytes = tokio::fs::read(audio_path).await?;
        info!(audio = %audio_path.display(), bytes = bytes.len(), "Transcribing audio");

        let output = self
            .replicate
            .run(
                WHISPER_MODEL,
                json!({
                    "audio": audio_data_uri(audio_path, &bytes),
                    "batch_size": WHISPER_BATCH_SIZE,
                }),
            )
            .await?;

        serde_json::from_value(output)
            .map_err(|e| AiError::invalid_response(format!("unexpected transcription shape: {}", e)))
    }
}
