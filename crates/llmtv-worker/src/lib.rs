//! LLMTV pipeline worker.
//!
//! Turns a song concept into a music video: lyrics, music, transcription,
//! per-segment video generation and final assembly. Remote calls go through
//! the traits in `llmtv-ai-client`; every stage result is cached.

pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod retry;
pub mod segment_job;
pub mod stages;

pub use config::{GenerationPolicy, PipelineConfig};
pub use error::{BatchGenerationError, PipelineError, PipelineResult, SegmentJobError};
pub use generator::{render_prompt, ResultSlots, SegmentGenerator};
pub use logging::{init_tracing, RunLogger};
pub use pipeline::{MusicVideoPipeline, PipelineServices};
pub use retry::{
    default_transient_predicate, retry_async, Backoff, RetryConfig, RetryResult,
    TransientPredicate,
};
pub use segment_job::{segment_cache_key, segment_file_name, SegmentJob, SegmentJobContext};
