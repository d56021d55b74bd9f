//! Worker error types.

use thiserror::Error;

use llmtv_ai_client::AiError;
use llmtv_cache::CacheError;
use llmtv_media::MediaError;
use llmtv_models::{SegmentJobPhase, SegmentMapError};

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Terminal failure of one segment job.
#[derive(Debug, Error)]
pub enum SegmentJobError {
    #[error("segment {index}: generation failed after {attempts} attempt(s): {source}")]
    Generation {
        index: usize,
        attempts: u32,
        #[source]
        source: AiError,
    },

    #[error("segment {index}: download failed after {attempts} attempt(s): {source}")]
    Download {
        index: usize,
        attempts: u32,
        #[source]
        source: AiError,
    },

    #[error("segment {index}: cache error: {source}")]
    Cache {
        index: usize,
        #[source]
        source: CacheError,
    },
}

impl SegmentJobError {
    pub fn index(&self) -> usize {
        match self {
            SegmentJobError::Generation { index, .. }
            | SegmentJobError::Download { index, .. }
            | SegmentJobError::Cache { index, .. } => *index,
        }
    }

    /// Phase the job was in when it gave up.
    pub fn phase(&self) -> SegmentJobPhase {
        match self {
            SegmentJobError::Generation { source, .. } if matches!(source, AiError::Timeout(_)) => {
                SegmentJobPhase::TimedOut
            }
            SegmentJobError::Generation { .. } => SegmentJobPhase::Failed,
            SegmentJobError::Download { .. } => SegmentJobPhase::Downloading,
            SegmentJobError::Cache { .. } => SegmentJobPhase::Cached,
        }
    }
}

/// Failure of a whole segment batch. No partial path list accompanies it.
#[derive(Debug, Error)]
pub enum BatchGenerationError {
    #[error("segment generation failed: {0}")]
    Segment(#[from] SegmentJobError),

    #[error("concurrency limit must be at least 1")]
    InvalidConcurrency,

    #[error("segment {0} reported more than once")]
    DuplicateResult(usize),

    #[error("no result for segment {0}")]
    MissingResult(usize),

    #[error("segment worker aborted: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BatchGenerationError {
    /// Index of the segment that failed the batch, if one did.
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            BatchGenerationError::Segment(e) => Some(e.index()),
            BatchGenerationError::DuplicateResult(i) | BatchGenerationError::MissingResult(i) => {
                Some(*i)
            }
            _ => None,
        }
    }
}

/// Top-level pipeline failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: AiError,
    },

    #[error("Segment mapping failed: {0}")]
    SegmentMap(#[from] SegmentMapError),

    #[error("Video generation failed: {0}")]
    Batch(#[from] BatchGenerationError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn stage(stage: &'static str, source: AiError) -> Self {
        Self::Stage { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_error_phase_and_index() {
        let timed_out = SegmentJobError::Generation {
            index: 4,
            attempts: 3,
            source: AiError::timeout("600s"),
        };
        assert_eq!(timed_out.index(), 4);
        assert_eq!(timed_out.phase(), SegmentJobPhase::TimedOut);

        let download = SegmentJobError::Download {
            index: 1,
            attempts: 3,
            source: AiError::timeout("read"),
        };
        assert_eq!(download.phase(), SegmentJobPhase::Downloading);
    }

    #[test]
    fn test_batch_error_names_segment() {
        let batch: BatchGenerationError = SegmentJobError::Generation {
            index: 7,
            attempts: 1,
            source: AiError::generation_failed("filtered"),
        }
        .into();
        assert_eq!(batch.segment_index(), Some(7));
        assert!(batch.to_string().contains("segment 7"));
        assert_eq!(BatchGenerationError::InvalidConcurrency.segment_index(), None);
    }
}
