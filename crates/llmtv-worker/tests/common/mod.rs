//! Hand-written fakes for the remote services.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use llmtv_ai_client::{
    AiError, AiResult, LyricGenerator, MediaRef, MusicGenerator, OperationHandle, OperationStatus,
    Transcriber, VideoGenerationApi,
};
use llmtv_media::{MediaProbe, MediaResult};
use llmtv_models::{TranscriptChunk, Transcription, VideoSegment};
use llmtv_worker::GenerationPolicy;

/// How the fake video API treats one segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentScript {
    /// Pending polls before the operation is done
    pub polls_before_done: u32,
    /// Leading submits that fail
    pub failing_submits: u32,
    /// Whether those submit failures are 503 (transient) or 400 (fatal)
    pub fatal_submit: bool,
    /// Operation stays pending forever
    pub never_finishes: bool,
    /// Leading downloads that fail with an IO error
    pub failing_downloads: u32,
}

#[derive(Default)]
struct SegmentState {
    submits: u32,
    downloads: u32,
    remaining_polls: u32,
}

/// In-memory [`VideoGenerationApi`] driven by per-segment scripts.
///
/// Segment indexes are read from the `segment-N` marker at the end of each
/// prompt.
pub struct FakeVideoApi {
    script: Box<dyn Fn(usize) -> SegmentScript + Send + Sync>,
    state: Mutex<HashMap<usize, SegmentState>>,
    completions: Mutex<Vec<usize>>,
    reverse_completion: Option<usize>,
    active: AtomicU32,
    pub max_active: AtomicU32,
    pub submit_calls: AtomicU32,
    pub poll_calls: AtomicU32,
    pub download_calls: AtomicU32,
}

impl FakeVideoApi {
    pub fn new(script: impl Fn(usize) -> SegmentScript + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            state: Mutex::new(HashMap::new()),
            completions: Mutex::new(Vec::new()),
            reverse_completion: None,
            active: AtomicU32::new(0),
            max_active: AtomicU32::new(0),
            submit_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
            download_calls: AtomicU32::new(0),
        }
    }

    /// Always finishes after one pending poll.
    pub fn healthy() -> Self {
        Self::new(|_| SegmentScript {
            polls_before_done: 1,
            ..SegmentScript::default()
        })
    }

    /// Hold each download of `0..count` until the next index has finished,
    /// so segments complete in reverse order. Needs `count` concurrent jobs.
    pub fn with_reverse_completion(mut self, count: usize) -> Self {
        self.reverse_completion = Some(count);
        self
    }

    /// Most jobs seen between submit and finished download at once.
    pub fn peak_concurrency(&self) -> u32 {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Segment indexes in the order their downloads completed.
    pub fn completion_order(&self) -> Vec<usize> {
        self.completions.lock().unwrap().clone()
    }

    pub fn submits_for(&self, index: usize) -> u32 {
        self.state
            .lock()
            .unwrap()
            .get(&index)
            .map(|s| s.submits)
            .unwrap_or(0)
    }

    pub fn submits(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> u32 {
        self.download_calls.load(Ordering::SeqCst)
    }
}

fn segment_index(text: &str) -> usize {
    text.rsplit("segment-")
        .next()
        .and_then(|n| n.trim().parse().ok())
        .expect("prompt carries a segment marker")
}

#[async_trait]
impl VideoGenerationApi for FakeVideoApi {
    async fn submit(&self, prompt: &str) -> AiResult<OperationHandle> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let index = segment_index(prompt);
        let script = (self.script)(index);

        let mut state = self.state.lock().unwrap();
        let entry = state.entry(index).or_default();
        entry.submits += 1;
        if entry.submits <= script.failing_submits {
            let status = if script.fatal_submit { 400 } else { 503 };
            return Err(AiError::Http {
                status,
                body: format!("submit {} rejected", entry.submits),
            });
        }
        entry.remaining_polls = script.polls_before_done;
        drop(state);

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        Ok(OperationHandle::new(format!("operations/segment-{}", index)))
    }

    async fn poll(&self, handle: &OperationHandle) -> AiResult<OperationStatus> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let index = segment_index(handle.as_str());
        let script = (self.script)(index);
        if script.never_finishes {
            return Ok(OperationStatus::Pending);
        }

        let mut state = self.state.lock().unwrap();
        let entry = state.entry(index).or_default();
        if entry.remaining_polls > 0 {
            entry.remaining_polls -= 1;
            return Ok(OperationStatus::Pending);
        }
        Ok(OperationStatus::Done(MediaRef::new(format!(
            "https://videos.test/segment-{}",
            index
        ))))
    }

    async fn download(&self, media: &MediaRef, dest: &Path) -> AiResult<()> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let index = segment_index(&media.uri);
        let script = (self.script)(index);

        let attempt = {
            let mut state = self.state.lock().unwrap();
            let entry = state.entry(index).or_default();
            entry.downloads += 1;
            entry.downloads
        };
        if attempt <= script.failing_downloads {
            return Err(AiError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )));
        }

        if let Some(count) = self.reverse_completion {
            if index + 1 < count {
                while !self.completions.lock().unwrap().contains(&(index + 1)) {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, format!("clip {}", index)).await?;
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completions.lock().unwrap().push(index);
        Ok(())
    }
}

/// Policy with millisecond delays.
pub fn fast_policy() -> GenerationPolicy {
    GenerationPolicy {
        poll_interval: Duration::from_millis(2),
        poll_timeout: Duration::from_millis(500),
        progress_log_every: 6,
        generation_attempts: 3,
        generation_backoff: Duration::from_millis(1),
        download_attempts: 3,
        download_delay: Duration::from_millis(1),
    }
}

/// `count` eight-second segments with `segment-N` lyrics.
pub fn segments(count: usize) -> Vec<VideoSegment> {
    (0..count)
        .map(|i| VideoSegment {
            start: i as f64 * 8.0,
            end: (i + 1) as f64 * 8.0,
            lyrics_text: format!("la la segment-{}", i),
        })
        .collect()
}

pub struct FakeLyrics {
    pub calls: AtomicU32,
}

impl FakeLyrics {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl LyricGenerator for FakeLyrics {
    async fn generate_lyrics(&self, prompt: &str, model_id: &str) -> AiResult<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[Verse]\n{} ({}) take {}", prompt, model_id, n))
    }
}

pub struct FakeMusic {
    pub calls: AtomicU32,
}

impl FakeMusic {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl MusicGenerator for FakeMusic {
    async fn generate_music(&self, lyrics: &str, style: &str, dest: &Path) -> AiResult<()> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(dest, format!("{}|{}|{}", lyrics, style, n)).await?;
        Ok(())
    }
}

pub struct FakeTranscriber {
    pub calls: AtomicU32,
    segment_marked: bool,
}

impl FakeTranscriber {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
            segment_marked: false,
        }
    }

    /// One `segment-N` chunk at the start of each eight-second window.
    pub fn segment_marked() -> Self {
        Self {
            calls: AtomicU32::new(0),
            segment_marked: true,
        }
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio_path: &Path) -> AiResult<Transcription> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.segment_marked {
            let chunks: Vec<TranscriptChunk> = (0..8)
                .map(|i| {
                    let start = i as f64 * 8.0;
                    TranscriptChunk::new(format!("segment-{}", i), start, start + 1.0)
                })
                .collect();
            return Ok(Transcription {
                text: "segment-0".to_string(),
                chunks,
            });
        }
        Ok(Transcription {
            text: "cats rule the world".to_string(),
            chunks: vec![
                TranscriptChunk::new("cats rule", 0.0, 2.5),
                TranscriptChunk::new("the world", 9.0, 11.0),
            ],
        })
    }
}

/// Probe reporting the same duration for every file.
pub struct FixedProbe(pub f64);

#[async_trait]
impl MediaProbe for FixedProbe {
    async fn duration(&self, _path: &Path) -> MediaResult<f64> {
        Ok(self.0)
    }
}
