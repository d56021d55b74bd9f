//! Final music video assembly.
//!
//! Generated clips are walked in order and accumulated until they cover the
//! song. The clip that would overflow is trimmed to the remaining time and
//! later clips are dropped. The retained clips are concatenated without gaps,
//! the song replaces whatever audio the clips had, and the result is clamped
//! to the song's own length.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use llmtv_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{move_file, temp_sibling};
use crate::probe::MediaProbe;

/// Durations closer than this are treated as equal.
const DURATION_EPSILON: f64 = 1e-3;

/// How much of one clip goes into the output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipCut {
    /// Position in the input clip list
    pub index: usize,
    /// Seconds taken from the start of the clip
    pub duration: f64,
    /// Whether the clip was shortened
    pub trimmed: bool,
}

/// Which clips to use and how much of each.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyPlan {
    pub cuts: Vec<ClipCut>,
    /// Sum of cut durations
    pub total: f64,
}

/// Decide how to cover `target` seconds with clips of the given durations.
///
/// Fails on an empty list and when the clips run out before the target; the
/// output is never padded.
pub fn plan_assembly(durations: &[f64], target: f64) -> MediaResult<AssemblyPlan> {
    if !target.is_finite() || target <= 0.0 {
        return Err(MediaError::invalid_duration(format!(
            "target duration must be positive, got {}",
            target
        )));
    }
    if durations.is_empty() {
        return Err(MediaError::NoClips);
    }

    let mut cuts = Vec::new();
    let mut total = 0.0;

    for (index, &duration) in durations.iter().enumerate() {
        let remaining = target - total;
        if remaining <= DURATION_EPSILON {
            break;
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(MediaError::invalid_duration(format!(
                "clip {} has duration {}",
                index, duration
            )));
        }

        let trimmed = duration > remaining + DURATION_EPSILON;
        let taken = if trimmed { remaining } else { duration };
        cuts.push(ClipCut {
            index,
            duration: taken,
            trimmed,
        });
        total += taken;
    }

    if total < target - DURATION_EPSILON {
        return Err(MediaError::InsufficientFootage {
            available: total,
            required: target,
        });
    }

    Ok(AssemblyPlan { cuts, total })
}

/// Build the FFmpeg command for a plan.
///
/// Inputs are the retained clips in plan order followed by the audio track.
pub fn build_assembly_command(
    clip_paths: &[PathBuf],
    plan: &AssemblyPlan,
    audio_path: &Path,
    output_duration: f64,
    output: &Path,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(output);
    let mut filter = String::new();

    for (input, cut) in plan.cuts.iter().enumerate() {
        cmd = cmd.input(&clip_paths[cut.index]);
        filter.push_str(&format!(
            "[{input}:v]trim=duration={:.3},setpts=PTS-STARTPTS,fps={},setsar=1[v{input}];",
            cut.duration, encoding.frame_rate
        ));
    }

    let audio_input = plan.cuts.len();
    cmd = cmd.input(audio_path);

    for input in 0..plan.cuts.len() {
        filter.push_str(&format!("[v{input}]"));
    }
    filter.push_str(&format!("concat=n={}:v=1:a=0[outv]", plan.cuts.len()));

    cmd.filter_complex(filter)
        .map("[outv]")
        .map(format!("{}:a:0", audio_input))
        .encoding(encoding)
        .duration(output_duration)
        .output_args(["-movflags", "+faststart"])
        .format("mp4")
}

/// Assembles clips and a song into the final video.
pub struct Assembler {
    probe: Arc<dyn MediaProbe>,
    encoding: EncodingConfig,
    timeout_secs: Option<u64>,
}

impl Assembler {
    pub fn new(probe: Arc<dyn MediaProbe>) -> Self {
        Self {
            probe,
            encoding: EncodingConfig::default(),
            timeout_secs: None,
        }
    }

    /// Kill the render if it runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout_secs(&self) -> Option<u64> {
        self.timeout_secs
    }

    /// Render `clip_paths` + `audio_path` to `output`, covering
    /// `target_duration` seconds (or the audio's length, if shorter).
    ///
    /// Nothing is written to `output` unless the render succeeds.
    pub async fn assemble(
        &self,
        clip_paths: &[PathBuf],
        audio_path: &Path,
        target_duration: f64,
        output: &Path,
    ) -> MediaResult<PathBuf> {
        if clip_paths.is_empty() {
            return Err(MediaError::NoClips);
        }

        // Only probe as many clips as the target needs.
        let mut durations = Vec::new();
        let mut covered = 0.0;
        for path in clip_paths {
            if covered >= target_duration - DURATION_EPSILON {
                break;
            }
            let duration = self.probe.duration(path).await?;
            debug!(clip = %path.display(), duration, "Probed clip");
            covered += duration;
            durations.push(duration);
        }

        let plan = plan_assembly(&durations, target_duration)?;
        let audio_duration = self.probe.duration(audio_path).await?;
        let output_duration = target_duration.min(audio_duration);

        info!(
            clips = plan.cuts.len(),
            target_duration,
            audio_duration,
            output_duration,
            "Assembling music video"
        );

        let partial = temp_sibling(output);
        if let Some(parent) = partial.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let cmd = build_assembly_command(
            clip_paths,
            &plan,
            audio_path,
            output_duration,
            &partial,
            &self.encoding,
        );

        let mut runner = FfmpegRunner::new();
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }

        let rendered = runner
            .run_with_progress(&cmd, move |progress| {
                debug!(
                    percent = %format!("{:.1}", progress.percentage(output_duration)),
                    speed = progress.speed,
                    "Render progress"
                );
            })
            .await;

        if let Err(e) = rendered {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        if let Err(e) = move_file(&partial, output).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        info!(output = %output.display(), "Music video assembled");
        Ok(output.to_path_buf())
    }
}
