//! FFmpeg-based engine implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::assets::{resolve_binaries, EngineBinaries};
use super::capabilities::EncoderCapabilities;
use super::config::EngineConfig;
use super::error::EngineError;
use super::probe::probe_file;
use super::scratch::ScratchDir;
use super::traits::Engine;
use super::types::{ExecProgress, ExecRequest, MediaInfo};

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg-based engine running in a private scratch directory.
///
/// The scratch directory lives as long as the engine and is removed when the
/// engine is dropped.
pub struct FfmpegEngine {
    config: EngineConfig,
    scratch: ScratchDir,
    binaries: RwLock<Option<EngineBinaries>>,
}

impl FfmpegEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let scratch = ScratchDir::new_in(&config.scratch_root)?;
        debug!(scratch = %scratch.root().display(), "Created engine scratch directory");
        Ok(Self {
            config,
            scratch,
            binaries: RwLock::new(None),
        })
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Result<Self, EngineError> {
        Self::new(EngineConfig::default())
    }

    /// Directory the engine reads and writes scratch files in.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.root()
    }

    /// Binaries resolved by the last successful `load`.
    pub async fn binaries(&self) -> Result<EngineBinaries, EngineError> {
        self.binaries
            .read()
            .await
            .clone()
            .ok_or(EngineError::NotLoaded)
    }

    /// Builds the full ffmpeg argument list: process-level flags, then the request.
    fn build_args(&self, request: &ExecRequest) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-nostats".to_string(),
        ];
        args.extend(request.args.iter().cloned());
        args
    }

    /// Checks that a binary starts and answers a version query.
    async fn verify_binary(path: &Path) -> Result<(), EngineError> {
        let output = Command::new(path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::BinaryNotFound {
                        path: path.to_path_buf(),
                    }
                } else {
                    EngineError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(EngineError::StartupFailed {
                reason: format!(
                    "{} -version exited with code {:?}",
                    path.display(),
                    output.status.code()
                ),
            });
        }
        Ok(())
    }

    /// Runs ffmpeg, forwarding progress parsed from its `-progress` output.
    async fn run(
        &self,
        ffmpeg_path: &Path,
        request: &ExecRequest,
        progress_tx: Option<mpsc::Sender<ExecProgress>>,
    ) -> Result<(), EngineError> {
        let args = self.build_args(request);
        debug!(args = ?args, "Running ffmpeg");

        let mut child = Command::new(ffmpeg_path)
            .args(&args)
            .current_dir(self.scratch.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::BinaryNotFound {
                        path: ffmpeg_path.to_path_buf(),
                    }
                } else {
                    EngineError::Io(e)
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("ffmpeg stdout was not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("ffmpeg stderr was not captured"))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let time_regex = Regex::new(r"^out_time_(?:ms|us)=(\d+)$").ok();
        let speed_regex = Regex::new(r"^speed=\s*(\d+\.?\d*)x$").ok();
        let expected = request.expected_duration_secs;

        let run = async {
            let mut lines = BufReader::new(stdout).lines();
            let mut current_time = 0.0;
            let mut current_speed = None;

            while let Some(line) = lines.next_line().await? {
                let line = line.trim();

                if let Some(caps) = time_regex.as_ref().and_then(|re| re.captures(line)) {
                    if let Ok(us) = caps[1].parse::<f64>() {
                        // Both keys carry microseconds.
                        current_time = us / 1_000_000.0;
                    }
                } else if let Some(caps) = speed_regex.as_ref().and_then(|re| re.captures(line)) {
                    current_speed = Some(format!("{}x", &caps[1]));
                } else if line.starts_with("progress=") {
                    if let Some(ref tx) = progress_tx {
                        let _ = tx.try_send(ExecProgress::at(
                            current_time,
                            expected,
                            current_speed.clone(),
                        ));
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<ExitStatus, std::io::Error>(status)
        };

        let outcome: Option<std::io::Result<ExitStatus>> = match self.config.exec_timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), run).await.ok(),
            None => Some(run.await),
        };

        let status = match outcome {
            Some(status) => status?,
            None => {
                let _ = child.kill().await;
                stderr_task.abort();
                return Err(EngineError::Timeout {
                    timeout_secs: self.config.exec_timeout_secs.unwrap_or_default(),
                });
            }
        };

        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(EngineError::ExecFailed {
                code: status.code(),
                stderr: tail_lines(&stderr, STDERR_TAIL_LINES),
            });
        }

        Ok(())
    }
}

/// Keeps the last `n` non-empty lines of a block of text.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[async_trait]
impl Engine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn load(&self) -> Result<(), EngineError> {
        let binaries = resolve_binaries(&self.config).await?;

        Self::verify_binary(&binaries.ffmpeg).await?;
        Self::verify_binary(&binaries.ffprobe).await?;

        let capabilities = EncoderCapabilities::detect(&binaries.ffmpeg).await;
        let missing = capabilities.missing();
        if !missing.is_empty() {
            warn!(
                missing = ?missing,
                "Engine lacks encoders used by the conversion workflows"
            );
        }

        info!(
            ffmpeg = %binaries.ffmpeg.display(),
            ffprobe = %binaries.ffprobe.display(),
            "Engine loaded"
        );
        *self.binaries.write().await = Some(binaries);
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), EngineError> {
        self.scratch.write(name, data).await
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.scratch.read(name).await
    }

    async fn delete_file(&self, name: &str) -> Result<(), EngineError> {
        self.scratch.remove(name).await
    }

    async fn probe(&self, name: &str) -> Result<MediaInfo, EngineError> {
        let binaries = self.binaries().await?;
        let path = self.scratch.resolve(name)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(EngineError::FileNotFound {
                name: name.to_string(),
            });
        }
        probe_file(&binaries.ffprobe, &path).await
    }

    async fn exec(
        &self,
        request: ExecRequest,
        progress_tx: Option<mpsc::Sender<ExecProgress>>,
    ) -> Result<(), EngineError> {
        let binaries = self.binaries().await?;
        let start = Instant::now();

        self.run(&binaries.ffmpeg, &request, progress_tx).await?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ffmpeg finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn engine_in(root: &TempDir) -> FfmpegEngine {
        FfmpegEngine::new(EngineConfig::default().with_scratch_root(root.path().to_path_buf()))
            .unwrap()
    }

    #[test]
    fn test_build_args_prepends_process_flags() {
        let root = TempDir::new().unwrap();
        let engine = engine_in(&root);
        let request = ExecRequest::new(["-i", "input.mp4", "-vn", "output.mp3"]);

        let args = engine.build_args(&request);

        assert_eq!(&args[..3], ["-hide_banner", "-nostdin", "-y"]);
        assert!(args.windows(2).any(|w| w == ["-loglevel", "error"]));
        assert!(args.windows(2).any(|w| w == ["-progress", "pipe:1"]));
        assert_eq!(&args[args.len() - 4..], ["-i", "input.mp4", "-vn", "output.mp3"]);
    }

    #[test]
    fn test_tail_lines() {
        let text = "a\n\nb\nc\n  \nd\n";
        assert_eq!(tail_lines(text, 2), "c\nd");
        assert_eq!(tail_lines(text, 10), "a\nb\nc\nd");
        assert_eq!(tail_lines("", 3), "");
    }

    #[tokio::test]
    async fn test_exec_before_load_fails() {
        let root = TempDir::new().unwrap();
        let engine = engine_in(&root);

        let result = engine.exec(ExecRequest::new(["-version"]), None).await;
        assert!(matches!(result, Err(EngineError::NotLoaded)));

        engine.write_file("input.mp4", b"x").await.unwrap();
        let result = engine.probe("input.mp4").await;
        assert!(matches!(result, Err(EngineError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_load_with_missing_binary() {
        let root = TempDir::new().unwrap();
        let config = EngineConfig::with_paths(
            PathBuf::from("/nonexistent/ffmpeg"),
            PathBuf::from("/nonexistent/ffprobe"),
        )
        .with_scratch_root(root.path().to_path_buf());
        let engine = FfmpegEngine::new(config).unwrap();

        let result = engine.load().await;
        assert!(matches!(result, Err(EngineError::BinaryNotFound { .. })));
        assert!(matches!(engine.binaries().await, Err(EngineError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_scratch_files_live_in_scratch_dir() {
        let root = TempDir::new().unwrap();
        let engine = engine_in(&root);

        engine.write_file("input.jpg", b"image").await.unwrap();
        assert!(engine.scratch_dir().join("input.jpg").exists());
        assert_eq!(engine.read_file("input.jpg").await.unwrap(), b"image");

        engine.delete_file("input.jpg").await.unwrap();
        assert!(!engine.scratch_dir().join("input.jpg").exists());

        let scratch = engine.scratch_dir().to_path_buf();
        drop(engine);
        assert!(!scratch.exists());
    }
}
