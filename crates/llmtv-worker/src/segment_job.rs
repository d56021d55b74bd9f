//! One segment's trip through the remote video API.
//!
//! ```text
//! Submitted -> Polling -> Done -> Downloading -> Cached
//!                 |  \
//!                 |   TimedOut --(transient, attempts left)--> Submitted
//!                 Failed -------(transient, attempts left)--> Submitted
//! ```
//!
//! Generation (submit + poll) and download retry independently: generation
//! with exponential backoff, download with a fixed delay. A cache hit skips
//! straight to `Cached`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{debug, info, warn};

use llmtv_ai_client::{AiError, AiResult, MediaRef, OperationStatus, VideoGenerationApi};
use llmtv_cache::{cache_key, CacheStore};
use llmtv_models::SegmentJobPhase;

use crate::config::GenerationPolicy;
use crate::error::SegmentJobError;
use crate::metrics;
use crate::retry::{retry_async, Backoff, RetryConfig, TransientPredicate};

/// Cache namespace for generated clips.
pub const VIDEO_CACHE_NAMESPACE: &str = "video";

/// Everything a segment job shares with its siblings.
pub struct SegmentJobContext {
    pub api: Arc<dyn VideoGenerationApi>,
    pub cache: CacheStore,
    pub policy: GenerationPolicy,
    pub is_transient: TransientPredicate,
    /// Directory the `segment_NNN.mp4` files are written to
    pub output_dir: PathBuf,
}

/// Local file name for a segment.
pub fn segment_file_name(index: usize) -> String {
    format!("segment_{:03}.mp4", index)
}

/// Cache key for a rendered prompt at a segment position.
pub fn segment_cache_key(prompt: &str, index: usize) -> llmtv_cache::CacheResult<String> {
    cache_key(VIDEO_CACHE_NAMESPACE, &(prompt, index))
}

/// A single segment job.
pub struct SegmentJob<'a> {
    ctx: &'a SegmentJobContext,
    index: usize,
    prompt: String,
    phase: Mutex<Option<SegmentJobPhase>>,
    cache_hit: AtomicBool,
}

impl<'a> SegmentJob<'a> {
    pub fn new(ctx: &'a SegmentJobContext, index: usize, prompt: impl Into<String>) -> Self {
        Self {
            ctx,
            index,
            prompt: prompt.into(),
            phase: Mutex::new(None),
            cache_hit: AtomicBool::new(false),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Current phase; `None` before anything happened.
    pub fn phase(&self) -> Option<SegmentJobPhase> {
        self.phase.lock().ok().and_then(|p| *p)
    }

    pub fn output_path(&self) -> PathBuf {
        self.ctx.output_dir.join(segment_file_name(self.index))
    }

    fn advance(&self, next: SegmentJobPhase) {
        let Ok(mut phase) = self.phase.lock() else {
            return;
        };
        let valid = match *phase {
            Some(current) => current.can_transition_to(next),
            None => next.is_initial(),
        };
        if !valid {
            warn!(
                segment_index = self.index,
                from = ?*phase,
                to = %next,
                "Unexpected segment phase transition"
            );
        }
        debug!(segment_index = self.index, phase = %next, "Segment phase");
        *phase = Some(next);
    }

    /// Run the job to a local clip path.
    pub async fn run(&self) -> Result<PathBuf, SegmentJobError> {
        let started = Instant::now();
        let result = self.run_inner().await;

        let outcome = match &result {
            Err(_) => "failed",
            Ok(_) if self.cache_hit.load(Ordering::Relaxed) => "cache_hit",
            Ok(_) => "generated",
        };
        metrics::record_segment_result(outcome, started.elapsed().as_secs_f64());
        result
    }

    async fn run_inner(&self) -> Result<PathBuf, SegmentJobError> {
        let output_path = self.output_path();
        let cache_error = |source| SegmentJobError::Cache {
            index: self.index,
            source,
        };
        let key = segment_cache_key(&self.prompt, self.index).map_err(cache_error)?;

        if self.ctx.cache.is_enabled() {
            let hit = self
                .ctx
                .cache
                .restore_file(&key, "mp4", &output_path)
                .await
                .map_err(cache_error)?;
            metrics::record_cache_lookup(VIDEO_CACHE_NAMESPACE, hit);
            if hit {
                self.cache_hit.store(true, Ordering::Relaxed);
                self.advance(SegmentJobPhase::Cached);
                info!(segment_index = self.index, "Using cached video");
                return Ok(output_path);
            }
        }

        let media = self.generate().await?;
        self.download(&media, &output_path).await?;

        self.ctx
            .cache
            .put_file(&key, "mp4", &output_path)
            .await
            .map_err(cache_error)?;
        self.advance(SegmentJobPhase::Cached);

        Ok(output_path)
    }

    async fn generate(&self) -> Result<MediaRef, SegmentJobError> {
        let policy = &self.ctx.policy;
        let config = RetryConfig::new("segment_generation")
            .with_max_attempts(policy.generation_attempts)
            .with_base_delay(policy.generation_backoff)
            .with_backoff(Backoff::Exponential);

        let is_transient = |e: &AiError| (self.ctx.is_transient)(e);
        retry_async(&config, is_transient, |attempt| self.attempt_generation(attempt))
            .await
            .into_result()
            .map_err(|(source, attempts)| SegmentJobError::Generation {
                index: self.index,
                attempts,
                source,
            })
    }

    /// One submit + poll cycle.
    async fn attempt_generation(&self, attempt: u32) -> AiResult<MediaRef> {
        let policy = &self.ctx.policy;
        info!(
            segment_index = self.index,
            attempt,
            max_attempts = policy.generation_attempts,
            "Starting video generation"
        );
        metrics::record_segment_attempt();

        self.advance(SegmentJobPhase::Submitted);
        let handle = match self.ctx.api.submit(&self.prompt).await {
            Ok(handle) => handle,
            Err(e) => {
                self.advance(SegmentJobPhase::Failed);
                return Err(e);
            }
        };

        self.advance(SegmentJobPhase::Polling);
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            let elapsed = started.elapsed();
            if elapsed >= policy.poll_timeout {
                self.advance(SegmentJobPhase::TimedOut);
                return Err(AiError::timeout(format!(
                    "segment {} generation exceeded {}s",
                    self.index,
                    policy.poll_timeout.as_secs_f64()
                )));
            }

            tokio::time::sleep(policy.poll_interval).await;
            polls += 1;
            if policy.progress_log_every > 0 && polls % policy.progress_log_every == 0 {
                info!(
                    segment_index = self.index,
                    elapsed_secs = elapsed.as_secs(),
                    "Still generating..."
                );
            }

            match self.ctx.api.poll(&handle).await {
                Ok(OperationStatus::Pending) => continue,
                Ok(OperationStatus::Done(media)) => {
                    self.advance(SegmentJobPhase::Done);
                    info!(segment_index = self.index, polls, "Video generation complete");
                    return Ok(media);
                }
                Ok(OperationStatus::Failed(message)) => {
                    self.advance(SegmentJobPhase::Failed);
                    return Err(AiError::generation_failed(message));
                }
                Err(e) => {
                    self.advance(SegmentJobPhase::Failed);
                    return Err(e);
                }
            }
        }
    }

    async fn download(&self, media: &MediaRef, dest: &Path) -> Result<(), SegmentJobError> {
        let policy = &self.ctx.policy;
        let config = RetryConfig::new("segment_download")
            .with_max_attempts(policy.download_attempts)
            .with_base_delay(policy.download_delay)
            .with_backoff(Backoff::Fixed);

        let is_transient = |e: &AiError| (self.ctx.is_transient)(e);
        let result = retry_async(&config, is_transient, |attempt| {
            self.advance(SegmentJobPhase::Downloading);
            debug!(segment_index = self.index, attempt, "Downloading video");
            self.ctx.api.download(media, dest)
        })
        .await
        .into_result();

        match result {
            Ok(()) => {
                info!(segment_index = self.index, "Download complete");
                Ok(())
            }
            Err((source, attempts)) => {
                self.advance(SegmentJobPhase::Failed);
                Err(SegmentJobError::Download {
                    index: self.index,
                    attempts,
                    source,
                })
            }
        }
    }
}
