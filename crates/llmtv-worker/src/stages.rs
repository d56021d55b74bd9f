//! Cached upstream stages: lyrics, music and transcription.
//!
//! Each stage checks the cache first and only calls its remote service on a
//! miss; the fresh result is written back before returning.

use std::path::{Path, PathBuf};

use llmtv_ai_client::{LyricGenerator, MusicGenerator, Transcriber};
use llmtv_cache::{cache_key, hash_file, CacheStore};
use llmtv_media::MediaProbe;
use llmtv_models::Transcription;

use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;

pub const LYRICS_STAGE: &str = "lyrics";
pub const MUSIC_STAGE: &str = "music";
pub const TRANSCRIPTION_STAGE: &str = "transcription";

fn record_lookup(cache: &CacheStore, stage: &str, hit: bool) {
    if cache.is_enabled() {
        metrics::record_cache_lookup(stage, hit);
    }
}

/// Lyrics for `prompt`, cached under (prompt, model).
pub async fn generate_lyrics(
    generator: &dyn LyricGenerator,
    cache: &CacheStore,
    logger: &RunLogger,
    prompt: &str,
    model_id: &str,
) -> PipelineResult<String> {
    let key = cache_key(LYRICS_STAGE, &(prompt, model_id))?;

    if let Some(lyrics) = cache.get_text(&key).await? {
        record_lookup(cache, LYRICS_STAGE, true);
        logger.log_cache_hit("lyrics");
        return Ok(lyrics);
    }
    record_lookup(cache, LYRICS_STAGE, false);

    logger.log_start(&format!("writing lyrics with {}", model_id));
    let lyrics = generator
        .generate_lyrics(prompt, model_id)
        .await
        .map_err(|e| PipelineError::stage(LYRICS_STAGE, e))?;

    cache.put_text(&key, &lyrics).await?;
    logger.log_completion(&format!("{} characters", lyrics.chars().count()));
    Ok(lyrics)
}

/// Song for `lyrics` in `style`, written to `dest`.
///
/// Returns the audio path and its duration in seconds.
pub async fn generate_music(
    generator: &dyn MusicGenerator,
    probe: &dyn MediaProbe,
    cache: &CacheStore,
    logger: &RunLogger,
    lyrics: &str,
    style: &str,
    dest: &Path,
) -> PipelineResult<(PathBuf, f64)> {
    let key = cache_key(MUSIC_STAGE, &(lyrics, style))?;

    let hit = cache.restore_file(&key, "mp3", dest).await?;
    record_lookup(cache, MUSIC_STAGE, hit);
    if hit {
        logger.log_cache_hit("song");
    } else {
        logger.log_start("generating song");
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        generator
            .generate_music(lyrics, style, dest)
            .await
            .map_err(|e| PipelineError::stage(MUSIC_STAGE, e))?;
        cache.put_file(&key, "mp3", dest).await?;
    }

    let duration = probe.duration(dest).await?;
    logger.log_completion(&format!("song is {:.1}s", duration));
    Ok((dest.to_path_buf(), duration))
}

/// Timestamped transcription of `audio`, cached under the audio's content hash.
pub async fn transcribe(
    transcriber: &dyn Transcriber,
    cache: &CacheStore,
    logger: &RunLogger,
    audio: &Path,
) -> PipelineResult<Transcription> {
    let key = cache_key(TRANSCRIPTION_STAGE, &hash_file(audio).await?)?;

    if let Some(transcription) = cache.get_json::<Transcription>(&key).await? {
        record_lookup(cache, TRANSCRIPTION_STAGE, true);
        logger.log_cache_hit("transcription");
        return Ok(transcription);
    }
    record_lookup(cache, TRANSCRIPTION_STAGE, false);

    logger.log_start("transcribing song");
    let transcription = transcriber
        .transcribe(audio)
        .await
        .map_err(|e| PipelineError::stage(TRANSCRIPTION_STAGE, e))?;

    cache.put_json(&key, &transcription).await?;
    logger.log_completion(&format!("{} chunks", transcription.chunks.len()));
    Ok(transcription)
}
