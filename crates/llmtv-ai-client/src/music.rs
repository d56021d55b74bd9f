//! Song synthesis on Replicate's minimax/music-1.5.

use std::path::Path;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::config::AiClientConfig;
use crate::error::AiResult;
use crate::replicate::{output_url, ReplicateClient};
use crate::types::MusicGenerator;

pub const MUSIC_MODEL: &str = "minimax/music-1.5";
const MUSIC_BITRATE: u32 = 256_000;
const MUSIC_SAMPLE_RATE: u32 = 44_100;

pub struct ReplicateMusicGenerator {
    replicate: ReplicateClient,
}

impl ReplicateMusicGenerator {
    pub fn new(config: &AiClientConfig) -> AiResult<Self> {
        Ok(Self {
            replicate: ReplicateClient::new(config)?,
        })
    }
}

#[async_trait]
impl MusicGenerator for ReplicateMusicGenerator {
    async fn generate_music(&self, lyrics: &str, style: &str, dest: &Path) -> AiResult<()> {
        info!(style = %style, "Generating music");
        let output = self
            .replicate
            .run(
                MUSIC_MODEL,
                json!({
                    "lyrics": lyrics,
                    "prompt": style,
                    "bitrate": MUSIC_BITRATE,
                    "sample_rate": MUSIC_SAMPLE_RATE,
                    "audio_format": "mp3",
                }),
            )
            .await?;

        let url = output_url(&output)?;
        self.replicate.download(&url, dest).await?;
        Ok(())
    }
}
