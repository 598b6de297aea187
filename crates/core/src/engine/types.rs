//! Types shared by engine implementations.

use serde::{Deserialize, Serialize};

/// A single engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecRequest {
    /// Argument list, relative to the engine's scratch filesystem.
    pub args: Vec<String>,
    /// Expected output duration, used to turn elapsed media time into a percentage.
    pub expected_duration_secs: Option<f64>,
}

impl ExecRequest {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            expected_duration_secs: None,
        }
    }

    pub fn with_expected_duration(mut self, secs: Option<f64>) -> Self {
        self.expected_duration_secs = secs;
        self
    }
}

/// Progress reported while the engine runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecProgress {
    /// Completion percentage (0-100). Zero when the duration is unknown.
    pub percent: f32,
    /// Media time written so far.
    pub time_secs: f64,
    /// Encoding speed as reported by the engine (e.g. "2.5x").
    pub speed: Option<String>,
}

impl ExecProgress {
    pub(crate) fn at(time_secs: f64, expected: Option<f64>, speed: Option<String>) -> Self {
        let percent = match expected {
            Some(dur) if dur > 0.0 => (time_secs / dur * 100.0).clamp(0.0, 100.0) as f32,
            _ => 0.0,
        };
        Self {
            percent,
            time_secs,
            speed,
        }
    }
}

/// Stream and container information for a media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub size_bytes: u64,
    pub duration_secs: f64,
    /// First entry of the container's format list (e.g. "mp3", "mov").
    pub format: String,
    pub audio_codec: Option<String>,
    pub audio_sample_rate: Option<u32>,
    pub audio_channels: Option<u8>,
    pub video_codec: Option<String>,
    pub video_width: Option<u32>,
    pub video_height: Option<u32>,
}

impl MediaInfo {
    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }

    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }
}
