//! Media inspection through ffprobe.

use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

use super::error::EngineError;
use super::types::MediaInfo;

/// Runs ffprobe against a file and parses its JSON report.
pub async fn probe_file(ffprobe_path: &Path, path: &Path) -> Result<MediaInfo, EngineError> {
    let output = Command::new(ffprobe_path)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::BinaryNotFound {
                    path: ffprobe_path.to_path_buf(),
                }
            } else {
                EngineError::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(EngineError::probe_failed(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parses `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_probe_output(output: &str) -> Result<MediaInfo, EngineError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        format: Option<ProbeFormat>,
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        format_name: String,
        duration: Option<String>,
        size: Option<String>,
    }

    #[derive(Deserialize)]
    struct ProbeStream {
        codec_type: String,
        codec_name: Option<String>,
        sample_rate: Option<String>,
        channels: Option<u8>,
        width: Option<u32>,
        height: Option<u32>,
        disposition: Option<ProbeDisposition>,
    }

    #[derive(Deserialize)]
    struct ProbeDisposition {
        #[serde(default)]
        attached_pic: u8,
    }

    let probe: ProbeOutput = serde_json::from_str(output)
        .map_err(|e| EngineError::probe_failed(format!("Failed to parse ffprobe output: {}", e)))?;

    let format = probe
        .format
        .ok_or_else(|| EngineError::probe_failed("No container format detected"))?;

    let duration_secs = format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let size_bytes = format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");

    // Cover art embedded in audio files shows up as a video stream.
    let video_stream = probe.streams.iter().find(|s| {
        s.codec_type == "video"
            && s.disposition
                .as_ref()
                .map_or(true, |d| d.attached_pic == 0)
    });

    let format_name = format
        .format_name
        .split(',')
        .next()
        .unwrap_or("unknown")
        .to_string();

    Ok(MediaInfo {
        size_bytes,
        duration_secs,
        format: format_name,
        audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
        audio_sample_rate: audio_stream
            .and_then(|s| s.sample_rate.as_ref())
            .and_then(|r| r.parse::<u32>().ok()),
        audio_channels: audio_stream.and_then(|s| s.channels),
        video_codec: video_stream.and_then(|s| s.codec_name.clone()),
        video_width: video_stream.and_then(|s| s.width),
        video_height: video_stream.and_then(|s| s.height),
    })
}
