//! Timestamped transcription types.
//!
//! The wire format follows Whisper-style output:
//! `{"text": "...", "chunks": [{"text": "...", "timestamp": [0.0, 2.5]}]}`.
//! Either end of a chunk's timestamp may be `null`.

use serde::{Deserialize, Serialize};

/// A piece of transcribed text with an optional time range (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// Transcribed text for this chunk
    pub text: String,

    /// `(start, end)` in seconds; missing ends are `None`
    #[serde(rename = "timestamp", default)]
    pub time_range: (Option<f64>, Option<f64>),
}

impl TranscriptChunk {
    /// Create a chunk with a complete time range.
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            time_range: (Some(start), Some(end)),
        }
    }

    /// Create a chunk the transcription service could not place in time.
    pub fn untimed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            time_range: (None, None),
        }
    }

    /// Both ends of the time range, if present.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self.time_range {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Half-open overlap test against the window `[window_start, window_end)`.
    ///
    /// Chunks that only touch the window at a boundary do not overlap it.
    /// Chunks without a complete time range never overlap anything.
    pub fn overlaps(&self, window_start: f64, window_end: f64) -> bool {
        match self.bounds() {
            Some((start, end)) => start < window_end && end > window_start,
            None => false,
        }
    }
}

/// Full transcription of an audio track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    /// Full transcript text, used as the whole-song fallback
    #[serde(default)]
    pub text: String,

    /// Timestamped chunks in transcript order
    #[serde(default)]
    pub chunks: Vec<TranscriptChunk>,
}
