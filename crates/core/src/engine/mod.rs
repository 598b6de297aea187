//! Transcoding engine port and its FFmpeg implementation.
//!
//! An [`Engine`] owns a private scratch filesystem. Callers write input
//! bytes under flat names, run a fixed argument list that refers to those
//! names, read the produced output back and delete what they wrote.
//!
//! # Example
//!
//! ```ignore
//! use mediaconv_core::engine::{Engine, EngineConfig, ExecRequest, FfmpegEngine};
//!
//! let engine = FfmpegEngine::new(EngineConfig::default())?;
//! engine.load().await?;
//!
//! engine.write_file("input.mp4", &video_bytes).await?;
//! engine
//!     .exec(ExecRequest::new(["-i", "input.mp4", "-vn", "output.mp3"]), None)
//!     .await?;
//! let mp3 = engine.read_file("output.mp3").await?;
//! ```

mod assets;
mod capabilities;
mod config;
mod error;
mod ffmpeg;
mod probe;
mod scratch;
mod traits;
mod types;

pub use assets::{resolve_binaries, AssetFetcher, EngineAsset, EngineBinaries};
pub use capabilities::{EncoderCapabilities, REQUIRED_ENCODERS};
pub use config::{EngineConfig, RemoteAssetsConfig};
pub use error::EngineError;
pub use ffmpeg::FfmpegEngine;
pub use probe::{parse_probe_output, probe_file};
pub use scratch::ScratchDir;
pub use traits::Engine;
pub use types::{ExecProgress, ExecRequest, MediaInfo};
