//! Testing utilities and mock implementations.
//!
//! [`MockEngine`] stands in for the FFmpeg engine so workflows and the HTTP
//! layer can be exercised without an encoder installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediaconv_core::testing::{fixtures, MockEngine};
//! use mediaconv_core::workflow::ImageToVideo;
//!
//! let engine = MockEngine::new();
//! engine.set_output(b"mp4 bytes".to_vec()).await;
//!
//! let workflow = ImageToVideo::new(Arc::new(engine.clone()));
//! workflow.select_image(Some(fixtures::image("cover.jpg"))).await;
//! workflow.select_audio(Some(fixtures::audio("song.mp3"))).await;
//! ```

mod mock_engine;

pub use mock_engine::MockEngine;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::engine::MediaInfo;
    use crate::workflow::SelectedFile;

    /// A selected JPEG with placeholder bytes.
    pub fn image(name: &str) -> SelectedFile {
        SelectedFile::new(
            name,
            Some("image/jpeg".to_string()),
            vec![0xFF, 0xD8, 0xFF, 0xE0],
        )
    }

    /// A selected MP3 with placeholder bytes.
    pub fn audio(name: &str) -> SelectedFile {
        SelectedFile::new(name, Some("audio/mpeg".to_string()), b"ID3\x04".to_vec())
    }

    /// A selected MP4 with placeholder bytes.
    pub fn video(name: &str) -> SelectedFile {
        SelectedFile::new(
            name,
            Some("video/mp4".to_string()),
            b"\x00\x00\x00\x18ftypmp42".to_vec(),
        )
    }

    /// Probe answer for a video that has no audio stream.
    pub fn silent_video_info(duration_secs: f64) -> MediaInfo {
        MediaInfo {
            size_bytes: 1024,
            duration_secs,
            format: "mov".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(640),
            video_height: Some(360),
            ..MediaInfo::default()
        }
    }
}
