//! Configuration for the engine module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to ffmpeg binary. Ignored when `assets` is set.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary. Ignored when `assets` is set.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Parent directory for per-engine scratch directories.
    #[serde(default = "default_scratch_root")]
    pub scratch_root: PathBuf,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound for a single engine run. `None` waits indefinitely.
    #[serde(default)]
    pub exec_timeout_secs: Option<u64>,

    /// Fetch the engine binaries from a remote location instead of using local paths.
    #[serde(default)]
    pub assets: Option<RemoteAssetsConfig>,
}

/// Remote location of the engine binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAssetsConfig {
    /// Versioned base URL; `{base_url}/ffmpeg` and `{base_url}/ffprobe` are fetched.
    pub base_url: String,

    /// Directory the fetched binaries are cached in.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Expected SHA-256 of the ffmpeg binary (lowercase hex).
    #[serde(default)]
    pub ffmpeg_sha256: Option<String>,

    /// Expected SHA-256 of the ffprobe binary (lowercase hex).
    #[serde(default)]
    pub ffprobe_sha256: Option<String>,

    /// Request timeout for each asset in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_scratch_root() -> PathBuf {
    std::env::temp_dir()
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("mediaconv-engine")
}

fn default_fetch_timeout() -> u64 {
    120
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            scratch_root: default_scratch_root(),
            log_level: default_log_level(),
            exec_timeout_secs: None,
            assets: None,
        }
    }
}

impl RemoteAssetsConfig {
    /// Creates a remote asset config with default cache and timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cache_dir: default_cache_dir(),
            ffmpeg_sha256: None,
            ffprobe_sha256: None,
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl EngineConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the scratch root directory.
    pub fn with_scratch_root(mut self, scratch_root: PathBuf) -> Self {
        self.scratch_root = scratch_root;
        self
    }

    /// Sets the execution timeout in seconds.
    pub fn with_exec_timeout(mut self, timeout_secs: u64) -> Self {
        self.exec_timeout_secs = Some(timeout_secs);
        self
    }

    /// Fetches the engine binaries from a remote location.
    pub fn with_assets(mut self, assets: RemoteAssetsConfig) -> Self {
        self.assets = Some(assets);
        self
    }
}
