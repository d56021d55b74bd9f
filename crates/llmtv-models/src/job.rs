//! Run identifiers and per-segment job results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a single segment generation job.
///
/// `Submitted -> Polling -> {Done, TimedOut, Failed}`; a transient
/// `TimedOut`/`Failed` loops back to `Submitted`, `Done` moves on to
/// `Downloading -> {Cached, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentJobPhase {
    /// Remote job submitted, handle obtained
    Submitted,
    /// Waiting for the remote job to finish
    Polling,
    /// Remote job reported completion
    Done,
    /// Poll budget exhausted for this attempt
    TimedOut,
    /// Attempt failed
    Failed,
    /// Fetching the generated media
    Downloading,
    /// Media stored locally and in the cache
    Cached,
}

impl SegmentJobPhase {
    /// Whether the job ends here unless a retry restarts it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SegmentJobPhase::Cached | SegmentJobPhase::Failed)
    }

    /// Phases a job may enter first: a fresh submission or a cache hit.
    pub fn is_initial(&self) -> bool {
        matches!(self, SegmentJobPhase::Submitted | SegmentJobPhase::Cached)
    }

    /// Whether `next` may directly follow this phase.
    pub fn can_transition_to(&self, next: SegmentJobPhase) -> bool {
        use SegmentJobPhase::*;
        matches!(
            (self, next),
            (Submitted, Polling)
                | (Submitted, Failed)
                | (Polling, Done)
                | (Polling, TimedOut)
                | (Polling, Failed)
                | (TimedOut, Submitted)
                | (TimedOut, Failed)
                | (Failed, Submitted)
                | (Done, Downloading)
                | (Downloading, Downloading)
                | (Downloading, Cached)
                | (Downloading, Failed)
        )
    }
}

impl fmt::Display for SegmentJobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SegmentJobPhase::Submitted => "submitted",
            SegmentJobPhase::Polling => "polling",
            SegmentJobPhase::Done => "done",
            SegmentJobPhase::TimedOut => "timed_out",
            SegmentJobPhase::Failed => "failed",
            SegmentJobPhase::Downloading => "downloading",
            SegmentJobPhase::Cached => "cached",
        };
        write!(f, "{}", s)
    }
}

/// Outcome reported by one segment worker.
///
/// Exactly one of a local path or an error is carried.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentJobResult<E = String> {
    /// 0-based segment number
    pub index: usize,
    /// Local clip path, or the job's terminal error
    pub outcome: Result<PathBuf, E>,
}

impl<E> SegmentJobResult<E> {
    pub fn success(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            outcome: Ok(path.into()),
        }
    }

    pub fn failure(index: usize, error: E) -> Self {
        Self {
            index,
            outcome: Err(error),
        }
    }

    pub fn from_result(index: usize, outcome: Result<PathBuf, E>) -> Self {
        Self { index, outcome }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&E> {
        self.outcome.as_ref().err()
    }
}
