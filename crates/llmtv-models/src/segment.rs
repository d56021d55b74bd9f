//! Fixed-width video segments and the transcript-to-segment mapper.
//!
//! A song of `total_duration` seconds is cut into `ceil(total / width)`
//! contiguous windows. Each window carries the lyrics of every transcript
//! chunk that overlaps it, which becomes the prompt for that segment's clip.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transcript::{TranscriptChunk, Transcription};

/// Default segment width in seconds (the video model produces 8s clips).
pub const DEFAULT_WINDOW_SECONDS: f64 = 8.0;

/// One time window of the final video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSegment {
    /// Window start in seconds (inclusive)
    pub start: f64,
    /// Window end in seconds (exclusive)
    pub end: f64,
    /// Lyrics overlapping this window, or the whole-song fallback
    pub lyrics_text: String,
}

impl VideoSegment {
    /// Window length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Rejected mapper inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentMapError {
    #[error("Total duration must be positive and finite, got {0}")]
    InvalidDuration(f64),

    #[error("Window width must be positive and finite, got {0}")]
    InvalidWindow(f64),
}

/// Number of windows needed to cover `total_duration`.
pub fn segment_count(total_duration: f64, window_width: f64) -> Result<usize, SegmentMapError> {
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(SegmentMapError::InvalidDuration(total_duration));
    }
    if !window_width.is_finite() || window_width <= 0.0 {
        return Err(SegmentMapError::InvalidWindow(window_width));
    }
    let mut count = (total_duration / window_width).ceil() as usize;
    // Division can round up past an integer and leave an empty last window.
    while count > 1 && (count - 1) as f64 * window_width >= total_duration {
        count -= 1;
    }
    Ok(count)
}

/// Map transcript chunks onto fixed-width windows.
///
/// Window `i` spans `[i * width, min((i + 1) * width, total_duration))`. Its
/// text is the space-joined, trimmed text of every overlapping chunk in
/// transcript order, or `fallback_text` when nothing overlaps. An empty chunk
/// list gives every window the fallback verbatim.
///
/// # Errors
/// Non-positive or non-finite durations/widths are configuration errors.
pub fn map_to_segments(
    chunks: &[TranscriptChunk],
    total_duration: f64,
    window_width: f64,
    fallback_text: &str,
) -> Result<Vec<VideoSegment>, SegmentMapError> {
    let count = segment_count(total_duration, window_width)?;

    let segments = (0..count)
        .map(|i| {
            let start = i as f64 * window_width;
            let end = ((i + 1) as f64 * window_width).min(total_duration);

            let lyrics_text = if chunks.is_empty() {
                fallback_text.to_string()
            } else {
                overlapping_text(chunks, start, end)
                    .unwrap_or_else(|| fallback_text.to_string())
            };

            VideoSegment {
                start,
                end,
                lyrics_text,
            }
        })
        .collect();

    Ok(segments)
}

/// Map a full transcription, using its complete text as the fallback.
pub fn map_transcription(
    transcription: &Transcription,
    total_duration: f64,
    window_width: f64,
) -> Result<Vec<VideoSegment>, SegmentMapError> {
    map_to_segments(
        &transcription.chunks,
        total_duration,
        window_width,
        &transcription.text,
    )
}

fn overlapping_text(chunks: &[TranscriptChunk], start: f64, end: f64) -> Option<String> {
    let parts: Vec<&str> = chunks
        .iter()
        .filter(|chunk| chunk.overlaps(start, end))
        .map(|chunk| chunk.text.trim())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_gapless(segments: &[VideoSegment], total: f64) {
        assert_eq!(segments[0].start, 0.0);
        for pair in segments.windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert_eq!(pair[0].end, pair[1].start);
        }
        for segment in segments {
            assert!(segment.start < segment.end);
        }
        assert_eq!(segments.last().unwrap().end, total);
    }

    #[test]
    fn test_segment_count_matches_ceil() {
        for (total, width, expected) in [
            (16.0, 8.0, 2),
            (20.0, 8.0, 3),
            (0.5, 8.0, 1),
            (37.3, 8.0, 5),
            (9.0, 4.5, 2),
            (2.1, 0.3, 7),
            (0.3, 0.1, 3),
        ] {
            let segments = map_to_segments(&[], total, width, "x").unwrap();
            assert_eq!(segments.len(), expected, "total={total} width={width}");
            assert_gapless(&segments, total);
        }
    }

    #[test]
    fn test_final_window_is_shorter() {
        let segments = map_to_segments(&[], 20.0, 8.0, "x").unwrap();
        assert_eq!(segments[2].start, 16.0);
        assert_eq!(segments[2].end, 20.0);
        assert!(segments[2].duration() < 8.0);
    }

    #[test]
    fn test_empty_chunks_use_fallback_verbatim() {
        let fallback = "  the whole song  ";
        let segments = map_to_segments(&[], 20.0, 8.0, fallback).unwrap();

        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| s.lyrics_text == fallback));
    }

    #[test]
    fn test_overlapping_chunks_are_joined_in_order() {
        let chunks = vec![
            TranscriptChunk::new(" first line ", 0.5, 3.0),
            TranscriptChunk::new("second line", 6.0, 10.0),
            TranscriptChunk::new("third line", 12.0, 15.0),
        ];

        let segments = map_to_segments(&chunks, 16.0, 8.0, "fallback").unwrap();
        assert_eq!(segments[0].lyrics_text, "first line second line");
        assert_eq!(segments[1].lyrics_text, "second line third line");
    }

    #[test]
    fn test_boundary_chunks_stay_in_their_window() {
        let chunks = vec![
            TranscriptChunk::new("early", 2.0, 3.0),
            TranscriptChunk::new("late", 8.0, 9.0),
        ];

        let segments = map_to_segments(&chunks, 16.0, 8.0, "fallback").unwrap();
        assert_eq!(segments[0].lyrics_text, "early");
        assert_eq!(segments[1].lyrics_text, "late");
    }

    #[test]
    fn test_window_without_overlap_gets_fallback() {
        let chunks = vec![TranscriptChunk::new("intro", 0.0, 4.0)];
        let segments = map_to_segments(&chunks, 24.0, 8.0, "full text").unwrap();

        assert_eq!(segments[0].lyrics_text, "intro");
        assert_eq!(segments[1].lyrics_text, "full text");
        assert_eq!(segments[2].lyrics_text, "full text");
    }

    #[test]
    fn test_untimed_chunks_are_skipped() {
        let chunks = vec![
            TranscriptChunk::untimed("floating"),
            TranscriptChunk::new("timed", 1.0, 2.0),
            TranscriptChunk {
                text: "half".to_string(),
                time_range: (Some(3.0), None),
            },
        ];

        let segments = map_to_segments(&chunks, 8.0, 8.0, "fallback").unwrap();
        assert_eq!(segments[0].lyrics_text, "timed");
    }

    #[test]
    fn test_only_untimed_chunks_fall_back_per_window() {
        let chunks = vec![TranscriptChunk::untimed("floating")];
        let segments = map_to_segments(&chunks, 10.0, 8.0, "fallback").unwrap();
        assert!(segments.iter().all(|s| s.lyrics_text == "fallback"));
    }

    #[test]
    fn test_map_transcription_uses_full_text() {
        let transcription = Transcription {
            text: "everything".to_string(),
            chunks: vec![TranscriptChunk::new("start", 0.0, 1.0)],
        };

        let segments = map_transcription(&transcription, 12.0, 8.0).unwrap();
        assert_eq!(segments[0].lyrics_text, "start");
        assert_eq!(segments[1].lyrics_text, "everything");
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        assert_eq!(
            map_to_segments(&[], 0.0, 8.0, "x"),
            Err(SegmentMapError::InvalidDuration(0.0))
        );
        assert!(map_to_segments(&[], -3.0, 8.0, "x").is_err());
        assert!(map_to_segments(&[], f64::NAN, 8.0, "x").is_err());
    }

    #[test]
    fn test_rejects_non_positive_window() {
        assert_eq!(
            map_to_segments(&[], 10.0, 0.0, "x"),
            Err(SegmentMapError::InvalidWindow(0.0))
        );
    }
}
