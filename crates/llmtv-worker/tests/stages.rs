//! Cached upstream stages against fake services.

mod common;

use std::sync::atomic::Ordering;

use tempfile::TempDir;

use llmtv_cache::CacheStore;
use llmtv_models::{map_transcription, RunId};
use llmtv_worker::{stages, RunLogger};

use common::{FakeLyrics, FakeMusic, FakeTranscriber, FixedProbe};

fn logger() -> RunLogger {
    RunLogger::new(&RunId::new(), "test")
}

async fn cache_in(dir: &TempDir, enabled: bool) -> CacheStore {
    CacheStore::open(dir.path().join("cache"))
        .await
        .unwrap()
        .with_enabled(enabled)
}

#[tokio::test]
async fn test_lyrics_called_once_per_prompt_and_model() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir, true).await;
    let lyrics = FakeLyrics::new();

    let first = stages::generate_lyrics(&lyrics, &cache, &logger(), "cats", "openai/gpt-4o")
        .await
        .unwrap();
    let second = stages::generate_lyrics(&lyrics, &cache, &logger(), "cats", "openai/gpt-4o")
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(lyrics.calls.load(Ordering::SeqCst), 1);

    stages::generate_lyrics(&lyrics, &cache, &logger(), "cats", "anthropic/claude-3-5-sonnet")
        .await
        .unwrap();
    assert_eq!(lyrics.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_disabled_cache_calls_every_time() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir, false).await;
    let lyrics = FakeLyrics::new();

    let first = stages::generate_lyrics(&lyrics, &cache, &logger(), "cats", "openai/gpt-4o")
        .await
        .unwrap();
    let second = stages::generate_lyrics(&lyrics, &cache, &logger(), "cats", "openai/gpt-4o")
        .await
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(lyrics.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_music_restored_from_cache() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir, true).await;
    let music = FakeMusic::new();
    let probe = FixedProbe(20.0);
    let dest = dir.path().join("downloads").join("song.mp3");

    let (path, duration) =
        stages::generate_music(&music, &probe, &cache, &logger(), "la la", "pop", &dest)
            .await
            .unwrap();
    assert_eq!(path, dest);
    assert_eq!(duration, 20.0);
    let original = tokio::fs::read_to_string(&dest).await.unwrap();

    tokio::fs::remove_file(&dest).await.unwrap();
    let (path, _) = stages::generate_music(&music, &probe, &cache, &logger(), "la la", "pop", &dest)
        .await
        .unwrap();

    assert_eq!(music.calls.load(Ordering::SeqCst), 1);
    assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), original);
}

#[tokio::test]
async fn test_transcription_keyed_by_audio_content() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir, true).await;
    let transcriber = FakeTranscriber::new();

    let song = dir.path().join("song.mp3");
    tokio::fs::write(&song, b"first song").await.unwrap();
    let first = stages::transcribe(&transcriber, &cache, &logger(), &song)
        .await
        .unwrap();
    let again = stages::transcribe(&transcriber, &cache, &logger(), &song)
        .await
        .unwrap();
    assert_eq!(first, again);
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);

    tokio::fs::write(&song, b"second song").await.unwrap();
    stages::transcribe(&transcriber, &cache, &logger(), &song)
        .await
        .unwrap();
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_transcription_feeds_segment_mapper() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir, false).await;
    let song = dir.path().join("song.mp3");
    tokio::fs::write(&song, b"song").await.unwrap();

    let transcription = stages::transcribe(&FakeTranscriber::new(), &cache, &logger(), &song)
        .await
        .unwrap();
    let segments = map_transcription(&transcription, 20.0, 8.0).unwrap();

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].lyrics_text, "cats rule");
    assert_eq!(segments[1].lyrics_text, "the world");
    assert_eq!(segments[2].lyrics_text, "cats rule the world");
    assert_eq!(segments[2].end, 20.0);
}
