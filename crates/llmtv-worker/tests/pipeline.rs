//! Pipeline wiring up to (but not including) the ffmpeg render.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tempfile::TempDir;

use llmtv_models::MusicVideoRequest;
use llmtv_worker::{MusicVideoPipeline, PipelineConfig, PipelineError, PipelineServices};

use common::{
    fast_policy, FakeLyrics, FakeMusic, FakeTranscriber, FakeVideoApi, FixedProbe, SegmentScript,
};

fn config_in(dir: &TempDir) -> PipelineConfig {
    PipelineConfig {
        work_dir: dir.path().to_path_buf(),
        generation: fast_policy(),
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn test_segment_failure_aborts_before_assembly() {
    let dir = TempDir::new().unwrap();
    let lyrics = Arc::new(FakeLyrics::new());
    let video = Arc::new(FakeVideoApi::new(|i| SegmentScript {
        failing_submits: if i == 1 { 1 } else { 0 },
        fatal_submit: true,
        ..SegmentScript::default()
    }));
    let services = PipelineServices {
        lyrics: lyrics.clone(),
        music: Arc::new(FakeMusic::new()),
        transcriber: Arc::new(FakeTranscriber::segment_marked()),
        video: video.clone(),
        probe: Arc::new(FixedProbe(20.0)),
    };

    let pipeline = MusicVideoPipeline::new(config_in(&dir), services).await.unwrap();
    let request = MusicVideoRequest::new("cats taking over the world").with_style("synthwave");
    let err = pipeline.run(&request, None).await.unwrap_err();

    assert!(matches!(err, PipelineError::Batch(ref e) if e.segment_index() == Some(1)));
    assert!(dir.path().join("downloads").join("song.mp3").exists());
    assert!(!pipeline.config().default_output_path().exists());
    assert_eq!(lyrics.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let services = PipelineServices {
        lyrics: Arc::new(FakeLyrics::new()),
        music: Arc::new(FakeMusic::new()),
        transcriber: Arc::new(FakeTranscriber::new()),
        video: Arc::new(FakeVideoApi::healthy()),
        probe: Arc::new(FixedProbe(20.0)),
    };
    let config = PipelineConfig {
        max_parallel_segments: 0,
        ..config_in(&dir)
    };

    let result = MusicVideoPipeline::new(config, services).await;
    assert!(matches!(result, Err(PipelineError::Config(_))));
}

#[tokio::test]
async fn test_clear_cache_forgets_stage_results() {
    let dir = TempDir::new().unwrap();
    let services = PipelineServices {
        lyrics: Arc::new(FakeLyrics::new()),
        music: Arc::new(FakeMusic::new()),
        transcriber: Arc::new(FakeTranscriber::new()),
        video: Arc::new(FakeVideoApi::healthy()),
        probe: Arc::new(FixedProbe(20.0)),
    };
    let pipeline = MusicVideoPipeline::new(config_in(&dir), services).await.unwrap();
    pipeline.cache().put_text("abc", "cached lyrics").await.unwrap();

    pipeline.clear_cache().await.unwrap();

    assert_eq!(pipeline.cache().get_text("abc").await.unwrap(), None);
}

#[tokio::test]
async fn test_assembler_uses_configured_render_timeout() {
    let dir = TempDir::new().unwrap();
    let services = PipelineServices {
        lyrics: Arc::new(FakeLyrics::new()),
        music: Arc::new(FakeMusic::new()),
        transcriber: Arc::new(FakeTranscriber::new()),
        video: Arc::new(FakeVideoApi::healthy()),
        probe: Arc::new(FixedProbe(20.0)),
    };
    let config = PipelineConfig {
        render_timeout_secs: 45,
        ..config_in(&dir)
    };

    let pipeline = MusicVideoPipeline::new(config, services).await.unwrap();
    assert_eq!(pipeline.assembler().timeout_secs(), Some(45));
}
