//! Segment generator and segment job behavior against a fake video API.

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use llmtv_ai_client::AiError;
use llmtv_cache::CacheStore;
use llmtv_models::SegmentJobPhase;
use llmtv_worker::{
    default_transient_predicate, BatchGenerationError, GenerationPolicy, SegmentGenerator,
    SegmentJob, SegmentJobContext, SegmentJobError,
};

use common::{fast_policy, segments, FakeVideoApi, SegmentScript};

async fn cache_in(dir: &TempDir, enabled: bool) -> CacheStore {
    CacheStore::open(dir.path().join("cache"))
        .await
        .unwrap()
        .with_enabled(enabled)
}

fn generator(
    api: &Arc<FakeVideoApi>,
    cache: CacheStore,
    policy: GenerationPolicy,
    dir: &Path,
) -> SegmentGenerator {
    SegmentGenerator::new(api.clone(), cache, policy, dir.join("videos"))
}

#[tokio::test]
async fn test_reverse_completion_keeps_segment_order() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::healthy().with_reverse_completion(4));
    let gen = generator(&api, cache_in(&dir, false).await, fast_policy(), dir.path());

    let paths = gen.generate_all(&segments(4), Some("synthwave"), 4).await.unwrap();

    assert_eq!(api.completion_order(), vec![3, 2, 1, 0]);
    assert_eq!(paths.len(), 4);
    for (i, path) in paths.iter().enumerate() {
        assert_eq!(path, &dir.path().join("videos").join(format!("segment_{:03}.mp4", i)));
        assert_eq!(tokio::fs::read_to_string(path).await.unwrap(), format!("clip {}", i));
    }
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::new(|_| SegmentScript {
        polls_before_done: 3,
        ..SegmentScript::default()
    }));
    let gen = generator(&api, cache_in(&dir, false).await, fast_policy(), dir.path());

    let paths = gen.generate_all(&segments(6), None, 2).await.unwrap();

    assert_eq!(paths.len(), 6);
    assert!(api.peak_concurrency() <= 2, "peak {}", api.peak_concurrency());
    assert_eq!(api.submits(), 6);
}

#[tokio::test]
async fn test_transient_submit_failures_are_retried() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::new(|i| SegmentScript {
        polls_before_done: 1,
        failing_submits: if i == 1 { 2 } else { 0 },
        ..SegmentScript::default()
    }));
    let gen = generator(&api, cache_in(&dir, false).await, fast_policy(), dir.path());

    let paths = gen.generate_all(&segments(3), None, 3).await.unwrap();

    assert_eq!(paths.len(), 3);
    assert_eq!(api.submits_for(1), 3);
    assert_eq!(api.submits_for(0), 1);
}

#[tokio::test]
async fn test_exhausted_segment_fails_whole_batch() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::new(|i| SegmentScript {
        polls_before_done: 1,
        failing_submits: if i == 2 { u32::MAX } else { 0 },
        ..SegmentScript::default()
    }));
    let gen = generator(&api, cache_in(&dir, false).await, fast_policy(), dir.path());

    let err = gen.generate_all(&segments(4), None, 4).await.unwrap_err();

    match err {
        BatchGenerationError::Segment(SegmentJobError::Generation {
            index,
            attempts,
            source,
        }) => {
            assert_eq!(index, 2);
            assert_eq!(attempts, 3);
            assert!(matches!(source, AiError::Http { status: 503, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(api.submits_for(2), 3);
}

#[tokio::test]
async fn test_fatal_error_is_not_retried() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::new(|_| SegmentScript {
        failing_submits: 1,
        fatal_submit: true,
        ..SegmentScript::default()
    }));
    let gen = generator(&api, cache_in(&dir, false).await, fast_policy(), dir.path());

    let err = gen.generate_all(&segments(1), None, 1).await.unwrap_err();

    assert_eq!(err.segment_index(), Some(0));
    assert!(matches!(
        err,
        BatchGenerationError::Segment(SegmentJobError::Generation { attempts: 1, .. })
    ));
    assert_eq!(api.submits(), 1);
}

#[tokio::test]
async fn test_custom_predicate_controls_retries() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::new(|_| SegmentScript {
        failing_submits: 1,
        fatal_submit: true,
        ..SegmentScript::default()
    }));
    let gen = generator(&api, cache_in(&dir, false).await, fast_policy(), dir.path())
        .with_transient_predicate(Arc::new(|e: &AiError| {
            matches!(e, AiError::Http { status: 400, .. })
        }));

    let paths = gen.generate_all(&segments(1), None, 1).await.unwrap();

    assert_eq!(paths.len(), 1);
    assert_eq!(api.submits_for(0), 2);
}

#[tokio::test]
async fn test_poll_timeout_resubmits_then_fails() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::new(|_| SegmentScript {
        never_finishes: true,
        ..SegmentScript::default()
    }));
    let policy = GenerationPolicy {
        poll_timeout: Duration::from_millis(20),
        generation_attempts: 2,
        ..fast_policy()
    };
    let gen = generator(&api, cache_in(&dir, false).await, policy, dir.path());

    let err = gen.generate_all(&segments(1), None, 1).await.unwrap_err();

    match err {
        BatchGenerationError::Segment(job_error) => {
            assert_eq!(job_error.phase(), SegmentJobPhase::TimedOut);
            assert!(matches!(
                job_error,
                SegmentJobError::Generation {
                    attempts: 2,
                    source: AiError::Timeout(_),
                    ..
                }
            ));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(api.submits_for(0), 2);
    assert_eq!(api.downloads(), 0);
}

#[tokio::test]
async fn test_download_retries_with_fixed_delay() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::new(|_| SegmentScript {
        failing_downloads: 2,
        ..SegmentScript::default()
    }));
    let gen = generator(&api, cache_in(&dir, false).await, fast_policy(), dir.path());

    let paths = gen.generate_all(&segments(1), None, 1).await.unwrap();

    assert_eq!(api.downloads(), 3);
    assert_eq!(api.submits(), 1);
    assert_eq!(tokio::fs::read_to_string(&paths[0]).await.unwrap(), "clip 0");
}

#[tokio::test]
async fn test_download_exhaustion_fails_batch() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::new(|_| SegmentScript {
        failing_downloads: 10,
        ..SegmentScript::default()
    }));
    let gen = generator(&api, cache_in(&dir, false).await, fast_policy(), dir.path());

    let err = gen.generate_all(&segments(1), None, 1).await.unwrap_err();

    assert!(matches!(
        err,
        BatchGenerationError::Segment(SegmentJobError::Download { index: 0, attempts: 3, .. })
    ));
    assert_eq!(api.submits(), 1);
}

#[tokio::test]
async fn test_cached_segments_skip_remote_calls() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::healthy());
    let gen = generator(&api, cache_in(&dir, true).await, fast_policy(), dir.path());

    let first = gen.generate_all(&segments(3), Some("jazz"), 2).await.unwrap();
    assert_eq!(api.submits(), 3);

    tokio::fs::remove_dir_all(dir.path().join("videos")).await.unwrap();
    let second = gen.generate_all(&segments(3), Some("jazz"), 2).await.unwrap();

    assert_eq!(api.submits(), 3);
    assert_eq!(api.downloads(), 3);
    assert_eq!(first, second);
    for (i, path) in second.iter().enumerate() {
        assert_eq!(tokio::fs::read_to_string(path).await.unwrap(), format!("clip {}", i));
    }

    // A different style renders different prompts
    gen.generate_all(&segments(3), Some("metal"), 2).await.unwrap();
    assert_eq!(api.submits(), 6);
}

#[tokio::test]
async fn test_disabled_cache_always_generates() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::healthy());
    let gen = generator(&api, cache_in(&dir, false).await, fast_policy(), dir.path());

    gen.generate_all(&segments(2), None, 2).await.unwrap();
    gen.generate_all(&segments(2), None, 2).await.unwrap();

    assert_eq!(api.submits(), 4);
}

#[tokio::test]
async fn test_segment_job_phases() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeVideoApi::new(|_| SegmentScript {
        polls_before_done: 2,
        failing_submits: 1,
        ..SegmentScript::default()
    }));
    let ctx = SegmentJobContext {
        api: api.clone(),
        cache: cache_in(&dir, true).await,
        policy: fast_policy(),
        is_transient: default_transient_predicate(),
        output_dir: dir.path().join("videos"),
    };
    let prompt = "create a short music video visualizing these lyrics: segment-5";

    let job = SegmentJob::new(&ctx, 5, prompt);
    assert_eq!(job.phase(), None);
    let path = job.run().await.unwrap();
    assert_eq!(job.phase(), Some(SegmentJobPhase::Cached));
    assert_eq!(path, dir.path().join("videos").join("segment_005.mp4"));
    assert_eq!(api.submits_for(5), 2);

    let again = SegmentJob::new(&ctx, 5, prompt);
    again.run().await.unwrap();
    assert_eq!(again.phase(), Some(SegmentJobPhase::Cached));
    assert_eq!(api.submits_for(5), 2);
}
