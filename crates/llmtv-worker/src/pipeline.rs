//! End-to-end prompt-to-music-video pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use llmtv_ai_client::{
    AiClientConfig, ChatLyricGenerator, LyricGenerator, MusicGenerator, ReplicateMusicGenerator,
    ReplicateTranscriber, Transcriber, VeoClient, VideoGenerationApi,
};
use llmtv_cache::CacheStore;
use llmtv_media::{Assembler, FfprobeProbe, MediaProbe};
use llmtv_models::{map_transcription, MusicVideoRequest, RunId};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::generator::SegmentGenerator;
use crate::logging::RunLogger;
use crate::stages;

/// Remote services and local probes the pipeline drives.
#[derive(Clone)]
pub struct PipelineServices {
    pub lyrics: Arc<dyn LyricGenerator>,
    pub music: Arc<dyn MusicGenerator>,
    pub transcriber: Arc<dyn Transcriber>,
    pub video: Arc<dyn VideoGenerationApi>,
    pub probe: Arc<dyn MediaProbe>,
}

impl PipelineServices {
    /// Production clients.
    ///
    /// Fails if the Gemini or Replicate credentials are missing; the lyrics
    /// provider key is only checked when lyrics are actually requested.
    pub fn from_config(config: &AiClientConfig) -> PipelineResult<Self> {
        let setup = |e: llmtv_ai_client::AiError| PipelineError::config(e.to_string());
        Ok(Self {
            lyrics: Arc::new(ChatLyricGenerator::new(config.clone()).map_err(setup)?),
            music: Arc::new(ReplicateMusicGenerator::new(config).map_err(setup)?),
            transcriber: Arc::new(ReplicateTranscriber::new(config).map_err(setup)?),
            video: Arc::new(VeoClient::new(config).map_err(setup)?),
            probe: Arc::new(FfprobeProbe),
        })
    }
}

pub struct MusicVideoPipeline {
    config: PipelineConfig,
    services: PipelineServices,
    cache: CacheStore,
}

impl MusicVideoPipeline {
    pub async fn new(config: PipelineConfig, services: PipelineServices) -> PipelineResult<Self> {
        config.validate()?;
        let cache = CacheStore::open(config.resolved_cache_dir())
            .await?
            .with_enabled(config.use_cache);
        Ok(Self {
            config,
            services,
            cache,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Assembler for the final render, bounded by the configured timeout.
    pub fn assembler(&self) -> Assembler {
        Assembler::new(Arc::clone(&self.services.probe))
            .with_timeout(self.config.render_timeout_secs)
    }

    /// Wipe every cached stage result.
    pub async fn clear_cache(&self) -> PipelineResult<()> {
        self.cache.clear().await?;
        Ok(())
    }

    /// Run every stage for `request` and return the final video path.
    ///
    /// `output` defaults to `downloads/final_video.mp4` under the work dir.
    pub async fn run(
        &self,
        request: &MusicVideoRequest,
        output: Option<&Path>,
    ) -> PipelineResult<PathBuf> {
        let started = Instant::now();
        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, "pipeline");
        logger.log_start(&request.concept_prompt);

        tokio::fs::create_dir_all(self.config.downloads_dir()).await?;
        tokio::fs::create_dir_all(self.config.videos_dir()).await?;

        let lyrics = stages::generate_lyrics(
            self.services.lyrics.as_ref(),
            &self.cache,
            &logger.for_stage(stages::LYRICS_STAGE),
            &request.concept_prompt,
            &request.lyrics_model,
        )
        .await?;

        let style = request.style_prompt();
        let (song, duration) = stages::generate_music(
            self.services.music.as_ref(),
            self.services.probe.as_ref(),
            &self.cache,
            &logger.for_stage(stages::MUSIC_STAGE),
            &lyrics,
            &style,
            &self.config.song_path(),
        )
        .await?;

        let transcription = stages::transcribe(
            self.services.transcriber.as_ref(),
            &self.cache,
            &logger.for_stage(stages::TRANSCRIPTION_STAGE),
            &song,
        )
        .await?;

        let segments = map_transcription(&transcription, duration, self.config.segment_seconds)?;
        logger.log_progress(&format!(
            "{} segments of {}s for {:.1}s of audio",
            segments.len(),
            self.config.segment_seconds,
            duration
        ));

        let generator = SegmentGenerator::new(
            Arc::clone(&self.services.video),
            self.cache.clone(),
            self.config.generation.clone(),
            self.config.videos_dir(),
        )
        .with_logger(logger.for_stage("video"));
        let clips = generator
            .generate_all(&segments, Some(style.as_str()), self.config.max_parallel_segments)
            .await?;

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.default_output_path());
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let assemble_logger = logger.for_stage("assemble");
        assemble_logger.log_start(&format!("{} clips", clips.len()));
        let final_path = self
            .assembler()
            .assemble(&clips, &song, duration, &output)
            .await?;
        assemble_logger.log_completion(&final_path.display().to_string());

        logger.log_completion(&format!(
            "{} in {:.1}s",
            final_path.display(),
            started.elapsed().as_secs_f64()
        ));
        Ok(final_path)
    }
}
