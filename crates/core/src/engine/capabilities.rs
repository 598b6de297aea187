//! Encoder capability detection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Encoders the fixed workflow command lines rely on.
pub const REQUIRED_ENCODERS: &[&str] = &["libx264", "aac", "libmp3lame"];

/// Software encoders detected in the engine build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderCapabilities {
    /// H.264 via x264
    pub libx264: bool,
    /// Native AAC
    pub aac: bool,
    /// MP3 via LAME
    pub libmp3lame: bool,
}

impl EncoderCapabilities {
    /// Detect available encoders by probing ffmpeg.
    pub async fn detect(ffmpeg_path: &Path) -> Self {
        let output = Command::new(ffmpeg_path)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;

        match output {
            Ok(o) if o.status.success() => Self::parse(&String::from_utf8_lossy(&o.stdout)),
            _ => Self::default(),
        }
    }

    /// Parses `ffmpeg -encoders` output.
    ///
    /// Each encoder line looks like ` V....D libx264  libx264 H.264 ...`; the
    /// second column is the encoder name.
    pub fn parse(listing: &str) -> Self {
        let names: Vec<&str> = listing
            .lines()
            .filter_map(|line| {
                let mut cols = line.split_whitespace();
                let flags = cols.next()?;
                let name = cols.next()?;
                (flags.len() == 6).then_some(name)
            })
            .collect();

        Self {
            libx264: names.contains(&"libx264"),
            aac: names.contains(&"aac"),
            libmp3lame: names.contains(&"libmp3lame"),
        }
    }

    /// Whether a named encoder is available.
    pub fn supports(&self, encoder: &str) -> bool {
        match encoder {
            "libx264" => self.libx264,
            "aac" => self.aac,
            "libmp3lame" => self.libmp3lame,
            _ => false,
        }
    }

    /// Required encoders that this build lacks.
    pub fn missing(&self) -> Vec<&'static str> {
        REQUIRED_ENCODERS
            .iter()
            .copied()
            .filter(|e| !self.supports(e))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10 (codec h264)
 A....D aac                  AAC (Advanced Audio Coding)
 A....D ac3                  ATSC A/52A (AC-3)
";

    #[test]
    fn test_default_capabilities() {
        let caps = EncoderCapabilities::default();
        assert!(!caps.libx264);
        assert_eq!(caps.missing(), vec!["libx264", "aac", "libmp3lame"]);
    }

    #[test]
    fn test_parse_listing() {
        let caps = EncoderCapabilities::parse(LISTING);
        assert!(caps.libx264);
        assert!(caps.aac);
        assert!(!caps.libmp3lame);
        assert_eq!(caps.missing(), vec!["libmp3lame"]);
    }

    #[test]
    fn test_legend_lines_are_not_encoders() {
        let caps = EncoderCapabilities::parse(" A..... = aac\n");
        assert!(!caps.aac);
    }
}
