//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; they are no-ops until a recorder
//! is installed by the embedding process.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Remote generation attempts (submit + poll) per segment.
    pub const SEGMENT_ATTEMPTS_TOTAL: &str = "llmtv_segment_attempts_total";

    /// Finished segment jobs by outcome.
    pub const SEGMENT_RESULTS_TOTAL: &str = "llmtv_segment_results_total";

    /// Retries by operation.
    pub const RETRIES_TOTAL: &str = "llmtv_retries_total";

    /// Cache lookups by stage and result.
    pub const CACHE_LOOKUPS_TOTAL: &str = "llmtv_cache_lookups_total";

    /// Wall time of one segment job in seconds.
    pub const SEGMENT_DURATION_SECONDS: &str = "llmtv_segment_duration_seconds";
}

pub fn record_segment_attempt() {
    counter!(names::SEGMENT_ATTEMPTS_TOTAL).increment(1);
}

/// Record a finished segment job.
pub fn record_segment_result(outcome: &str, elapsed_secs: f64) {
    counter!(
        names::SEGMENT_RESULTS_TOTAL,
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        names::SEGMENT_DURATION_SECONDS,
        "outcome" => outcome.to_string()
    )
    .record(elapsed_secs);
}

pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

pub fn record_cache_lookup(stage: &str, hit: bool) {
    counter!(
        names::CACHE_LOOKUPS_TOTAL,
        "stage" => stage.to_string(),
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::SEGMENT_ATTEMPTS_TOTAL.starts_with("llmtv_"));
        assert!(names::RETRIES_TOTAL.contains("retries"));
        assert!(names::SEGMENT_DURATION_SECONDS.ends_with("_seconds"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_segment_attempt();
        record_retry("segment_generation");
        record_cache_lookup("video", true);
        record_segment_result("generated", 1.5);
    }
}
