//! FFmpeg CLI wrapper for the LLMTV pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with any number of inputs
//! - Progress parsing from `-progress pipe:2`
//! - Duration probing through the [`MediaProbe`] seam
//! - Final assembly: trim, concatenate and mux the generated clips

pub mod assemble;
pub mod command;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod progress;

pub use assemble::{build_assembly_command, plan_assembly, Assembler, AssemblyPlan, ClipCut};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{move_file, temp_sibling};
pub use probe::{probe_duration, FfprobeProbe, MediaProbe};
pub use progress::FfmpegProgress;
