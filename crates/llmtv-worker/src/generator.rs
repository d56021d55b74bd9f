//! Bounded-concurrency generation of every segment clip.
//!
//! Each segment runs as its own [`SegmentJob`] on a `JoinSet`; a semaphore
//! caps how many talk to the remote API at once. Results land in a slot per
//! segment index, so the returned paths follow segment order no matter which
//! job finishes first. The first terminal failure aborts the rest and fails
//! the batch without a partial path list.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, Instrument};

use llmtv_ai_client::VideoGenerationApi;
use llmtv_cache::CacheStore;
use llmtv_models::{SegmentJobResult, VideoSegment};

use crate::config::GenerationPolicy;
use crate::error::{BatchGenerationError, SegmentJobError};
use crate::logging::RunLogger;
use crate::retry::{default_transient_predicate, TransientPredicate};
use crate::segment_job::{SegmentJob, SegmentJobContext};

/// Text prompt sent to the video model for one segment.
pub fn render_prompt(style: Option<&str>, lyrics: &str) -> String {
    match style.map(str::trim) {
        Some(style) if !style.is_empty() => format!(
            "create a short music video with this genre: {} visualizing these lyrics: {}",
            style, lyrics
        ),
        _ => format!(
            "create a short music video visualizing these lyrics: {}",
            lyrics
        ),
    }
}

/// Write-once result slots, one per segment index.
#[derive(Debug)]
pub struct ResultSlots {
    slots: Vec<Option<PathBuf>>,
}

impl ResultSlots {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub fn fill(&mut self, index: usize, path: PathBuf) -> Result<(), BatchGenerationError> {
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            BatchGenerationError::Worker(format!("result for unknown segment {}", index))
        })?;
        if slot.is_some() {
            return Err(BatchGenerationError::DuplicateResult(index));
        }
        *slot = Some(path);
        Ok(())
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Paths in segment order; every slot must be filled.
    pub fn into_paths(self) -> Result<Vec<PathBuf>, BatchGenerationError> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(BatchGenerationError::MissingResult(index)))
            .collect()
    }
}

/// Generates the clip for every segment of a song.
pub struct SegmentGenerator {
    api: Arc<dyn VideoGenerationApi>,
    cache: CacheStore,
    policy: GenerationPolicy,
    output_dir: PathBuf,
    is_transient: TransientPredicate,
    logger: Option<RunLogger>,
}

impl SegmentGenerator {
    pub fn new(
        api: Arc<dyn VideoGenerationApi>,
        cache: CacheStore,
        policy: GenerationPolicy,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api,
            cache,
            policy,
            output_dir: output_dir.into(),
            is_transient: default_transient_predicate(),
            logger: None,
        }
    }

    /// Replace the transient-error classification.
    pub fn with_transient_predicate(mut self, is_transient: TransientPredicate) -> Self {
        self.is_transient = is_transient;
        self
    }

    pub fn with_logger(mut self, logger: RunLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    fn context(&self) -> SegmentJobContext {
        SegmentJobContext {
            api: Arc::clone(&self.api),
            cache: self.cache.clone(),
            policy: self.policy.clone(),
            is_transient: Arc::clone(&self.is_transient),
            output_dir: self.output_dir.clone(),
        }
    }

    /// Generate all segments, at most `concurrency_limit` at a time.
    ///
    /// Returns one path per segment, in segment order.
    pub async fn generate_all(
        &self,
        segments: &[VideoSegment],
        style: Option<&str>,
        concurrency_limit: usize,
    ) -> Result<Vec<PathBuf>, BatchGenerationError> {
        if concurrency_limit == 0 {
            return Err(BatchGenerationError::InvalidConcurrency);
        }
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;

        let total = segments.len();
        let started = Instant::now();
        if let Some(logger) = &self.logger {
            logger.log_start(&format!(
                "generating {} segments, {} at a time",
                total, concurrency_limit
            ));
        }

        let ctx = Arc::new(self.context());
        let semaphore = Arc::new(Semaphore::new(concurrency_limit));
        let mut tasks: JoinSet<Result<SegmentJobResult<SegmentJobError>, BatchGenerationError>> =
            JoinSet::new();

        for (index, segment) in segments.iter().enumerate() {
            let prompt = render_prompt(style, &segment.lyrics_text);
            let ctx = Arc::clone(&ctx);
            let semaphore = Arc::clone(&semaphore);
            let span = match &self.logger {
                Some(logger) => {
                    tracing::info_span!("segment", run_id = %logger.run_id(), segment_index = index)
                }
                None => tracing::info_span!("segment", segment_index = index),
            };

            tasks.spawn(
                async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| BatchGenerationError::Worker(e.to_string()))?;
                    let job = SegmentJob::new(&ctx, index, prompt);
                    Ok(SegmentJobResult::from_result(index, job.run().await))
                }
                .instrument(span),
            );
        }

        let mut slots = ResultSlots::new(total);
        while let Some(joined) = tasks.join_next().await {
            let report = match joined {
                Ok(Ok(report)) => report,
                Ok(Err(e)) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(BatchGenerationError::Worker(e.to_string()));
                }
            };

            match report.outcome {
                Ok(path) => {
                    slots.fill(report.index, path)?;
                    info!(
                        segment_index = report.index,
                        completed = slots.filled(),
                        total,
                        "Segment ready"
                    );
                }
                Err(e) => {
                    error!(segment_index = report.index, phase = %e.phase(), "Segment failed: {}", e);
                    if let Some(logger) = &self.logger {
                        logger.log_error(&e.to_string());
                    }
                    tasks.abort_all();
                    return Err(e.into());
                }
            }
        }

        let paths = slots.into_paths()?;
        if let Some(logger) = &self.logger {
            logger.log_completion(&format!(
                "{} segments in {:.1}s",
                paths.len(),
                started.elapsed().as_secs_f64()
            ));
        }
        Ok(paths)
    }
}
