//! Pipeline configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use llmtv_models::{DEFAULT_LYRICS_MODEL, DEFAULT_WINDOW_SECONDS};

use crate::error::{PipelineError, PipelineResult};

/// How one segment job waits for and retries remote work.
#[derive(Debug, Clone)]
pub struct GenerationPolicy {
    /// Delay between operation polls
    pub poll_interval: Duration,
    /// Poll budget for one attempt
    pub poll_timeout: Duration,
    /// Emit a "still generating" log every this many polls
    pub progress_log_every: u32,
    /// Submit+poll attempts in total
    pub generation_attempts: u32,
    /// First backoff delay between generation attempts (doubles each time)
    pub generation_backoff: Duration,
    /// Download attempts in total
    pub download_attempts: u32,
    /// Fixed delay between download attempts
    pub download_delay: Duration,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(600), // 10 minutes per attempt
            progress_log_every: 6,
            generation_attempts: 3,
            generation_backoff: Duration::from_secs(5),
            download_attempts: 3,
            download_delay: Duration::from_secs(5),
        }
    }
}

impl GenerationPolicy {
    /// Create policy from environment variables.
    pub fn from_env() -> Self {
        Self {
            poll_interval: Duration::from_secs(env_or("LLMTV_POLL_INTERVAL_SECS", 10)),
            poll_timeout: Duration::from_secs(env_or("LLMTV_POLL_TIMEOUT_SECS", 600)),
            progress_log_every: 6,
            generation_attempts: env_or("LLMTV_GENERATION_ATTEMPTS", 3),
            generation_backoff: Duration::from_secs(env_or("LLMTV_GENERATION_BACKOFF_SECS", 5)),
            download_attempts: env_or("LLMTV_DOWNLOAD_ATTEMPTS", 3),
            download_delay: Duration::from_secs(env_or("LLMTV_DOWNLOAD_DELAY_SECS", 5)),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root for `downloads/` and `videos/`
    pub work_dir: PathBuf,
    /// Cache directory; relative paths are resolved against `work_dir`
    pub cache_dir: PathBuf,
    pub use_cache: bool,
    /// Width of the segment worker pool
    pub max_parallel_segments: usize,
    /// Segment window width in seconds
    pub segment_seconds: f64,
    /// Default lyrics model id
    pub lyrics_model: String,
    /// Kill the final ffmpeg render after this many seconds
    pub render_timeout_secs: u64,
    pub generation: GenerationPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            cache_dir: PathBuf::from("cache"),
            use_cache: true,
            max_parallel_segments: 4,
            segment_seconds: DEFAULT_WINDOW_SECONDS,
            lyrics_model: DEFAULT_LYRICS_MODEL.to_string(),
            render_timeout_secs: 1800,
            generation: GenerationPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("LLMTV_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            cache_dir: std::env::var("LLMTV_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("cache")),
            use_cache: std::env::var("LLMTV_USE_CACHE")
                .ok()
                .map(|v| parse_bool(&v))
                .unwrap_or(true),
            max_parallel_segments: env_or("LLMTV_MAX_PARALLEL_SEGMENTS", 4),
            segment_seconds: env_or("LLMTV_SEGMENT_SECONDS", DEFAULT_WINDOW_SECONDS),
            lyrics_model: std::env::var("LLMTV_LYRICS_MODEL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LYRICS_MODEL.to_string()),
            render_timeout_secs: env_or("LLMTV_RENDER_TIMEOUT_SECS", 1800),
            generation: GenerationPolicy::from_env(),
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_parallel_segments == 0 {
            return Err(PipelineError::config("max_parallel_segments must be at least 1"));
        }
        if !self.segment_seconds.is_finite() || self.segment_seconds <= 0.0 {
            return Err(PipelineError::config(format!(
                "segment_seconds must be positive, got {}",
                self.segment_seconds
            )));
        }
        if self.generation.generation_attempts == 0 || self.generation.download_attempts == 0 {
            return Err(PipelineError::config("retry attempts must be at least 1"));
        }
        if self.render_timeout_secs == 0 {
            return Err(PipelineError::config("render_timeout_secs must be at least 1"));
        }
        if self.generation.poll_interval.is_zero() {
            return Err(PipelineError::config("poll_interval must be non-zero"));
        }
        Ok(())
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.work_dir.join("downloads")
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.work_dir.join("videos")
    }

    pub fn song_path(&self) -> PathBuf {
        self.downloads_dir().join("song.mp3")
    }

    pub fn default_output_path(&self) -> PathBuf {
        self.downloads_dir().join("final_video.mp4")
    }

    pub fn resolved_cache_dir(&self) -> PathBuf {
        resolve(&self.work_dir, &self.cache_dir)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
