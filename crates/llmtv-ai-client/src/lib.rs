//! HTTP clients for the remote AI services the pipeline chains together.
//!
//! Each service sits behind an async trait ([`LyricGenerator`],
//! [`MusicGenerator`], [`Transcriber`], [`VideoGenerationApi`]) so the worker
//! can be driven by fakes in tests.

pub mod config;
pub mod error;
mod http;
pub mod lyrics;
pub mod music;
pub mod replicate;
pub mod transcribe;
pub mod types;
pub mod veo;

pub use config::AiClientConfig;
pub use error::{AiError, AiResult};
pub use lyrics::{finalize_lyrics, parse_model_id, ChatLyricGenerator, LyricsProvider};
pub use music::ReplicateMusicGenerator;
pub use replicate::ReplicateClient;
pub use transcribe::ReplicateTranscriber;
pub use types::{
    LyricGenerator, MediaRef, MusicGenerator, OperationHandle, OperationStatus, Transcriber,
    VideoGenerationApi,
};
pub use veo::VeoClient;
