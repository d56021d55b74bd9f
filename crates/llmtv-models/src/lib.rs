//! Shared data models for the LLMTV pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Timestamped transcriptions
//! - Fixed-width video segments and the transcript-to-segment mapper
//! - Segment job results and run identifiers
//! - Output encoding configuration
//! - Music video requests

pub mod encoding;
pub mod job;
pub mod request;
pub mod segment;
pub mod transcript;

// Re-export common types
pub use encoding::EncodingConfig;
pub use job::{RunId, SegmentJobPhase, SegmentJobResult};
pub use request::{MusicVideoRequest, DEFAULT_LYRICS_MODEL, DEFAULT_STYLE_PROMPT, LYRICS_MODELS};
pub use segment::{
    map_to_segments, map_transcription, segment_count, SegmentMapError, VideoSegment,
    DEFAULT_WINDOW_SECONDS,
};
pub use transcript::{TranscriptChunk, Transcription};
