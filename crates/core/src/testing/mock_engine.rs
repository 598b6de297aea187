//! Mock engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use crate::engine::{Engine, EngineError, ExecProgress, ExecRequest, MediaInfo};

/// Mock implementation of the Engine trait.
///
/// Keeps its scratch filesystem in memory and provides controllable behavior
/// for testing:
/// - Count load and exec calls
/// - Inject load, write, probe and exec failures
/// - Control probe results per scratch name
/// - Slow down exec to observe a running conversion
///
/// Clones share state, so a test can keep a handle after giving the engine
/// to a workflow.
///
/// # Example
///
/// ```rust,ignore
/// use mediaconv_core::testing::MockEngine;
/// use mediaconv_core::workflow::VideoToAudio;
///
/// let engine = MockEngine::new();
/// let workflow = VideoToAudio::new(Arc::new(engine.clone()));
///
/// workflow.select_video(Some(file)).await;
/// workflow.convert().await?;
///
/// assert_eq!(engine.load_count(), 1);
/// assert!(engine.files().await.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct MockEngine {
    /// In-memory scratch filesystem.
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// Pre-configured probe results by scratch name.
    probe_results: Arc<RwLock<HashMap<String, MediaInfo>>>,
    /// Recorded exec requests.
    requests: Arc<RwLock<Vec<ExecRequest>>>,
    next_load_error: Arc<RwLock<Option<EngineError>>>,
    next_write_error: Arc<RwLock<Option<EngineError>>>,
    next_probe_error: Arc<RwLock<Option<EngineError>>>,
    next_exec_error: Arc<RwLock<Option<EngineError>>>,
    /// Bytes written to the output name on a successful exec.
    output: Arc<RwLock<Vec<u8>>>,
    /// Simulated exec duration in milliseconds.
    exec_duration_ms: Arc<RwLock<u64>>,
    loaded: Arc<AtomicBool>,
    load_count: Arc<AtomicUsize>,
    exec_count: Arc<AtomicUsize>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            next_load_error: Arc::new(RwLock::new(None)),
            next_write_error: Arc::new(RwLock::new(None)),
            next_probe_error: Arc::new(RwLock::new(None)),
            next_exec_error: Arc::new(RwLock::new(None)),
            output: Arc::new(RwLock::new(b"mock output".to_vec())),
            exec_duration_ms: Arc::new(RwLock::new(0)),
            loaded: Arc::new(AtomicBool::new(false)),
            load_count: Arc::new(AtomicUsize::new(0)),
            exec_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `load` calls, failed ones included.
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn exec_count(&self) -> usize {
        self.exec_count.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Names currently present in the scratch filesystem.
    pub async fn files(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get all recorded exec requests.
    pub async fn recorded_requests(&self) -> Vec<ExecRequest> {
        self.requests.read().await.clone()
    }

    /// Set a probe result for a specific scratch name.
    pub async fn set_probe_result(&self, name: impl Into<String>, info: MediaInfo) {
        self.probe_results.write().await.insert(name.into(), info);
    }

    /// Configure the next `load` to fail with the given error.
    pub async fn set_next_load_error(&self, error: EngineError) {
        *self.next_load_error.write().await = Some(error);
    }

    /// Configure the next `write_file` to fail with the given error.
    pub async fn set_next_write_error(&self, error: EngineError) {
        *self.next_write_error.write().await = Some(error);
    }

    /// Configure the next `probe` to fail with the given error.
    pub async fn set_next_probe_error(&self, error: EngineError) {
        *self.next_probe_error.write().await = Some(error);
    }

    /// Configure the next `exec` to fail with the given error.
    pub async fn set_next_exec_error(&self, error: EngineError) {
        *self.next_exec_error.write().await = Some(error);
    }

    /// Set the bytes a successful exec writes to its output.
    pub async fn set_output(&self, data: impl Into<Vec<u8>>) {
        *self.output.write().await = data.into();
    }

    /// Set the simulated exec duration.
    pub async fn set_exec_duration(&self, duration: Duration) {
        *self.exec_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Default probe answer: ten seconds, with audio, plus video for `.mp4`.
    fn default_info(name: &str, size_bytes: u64) -> MediaInfo {
        let is_video = name.ends_with(".mp4");
        MediaInfo {
            size_bytes,
            duration_secs: 10.0,
            format: name.rsplit('.').next().unwrap_or("unknown").to_string(),
            audio_codec: Some("aac".to_string()),
            audio_sample_rate: Some(44100),
            audio_channels: Some(2),
            video_codec: is_video.then(|| "h264".to_string()),
            video_width: is_video.then_some(1280),
            video_height: is_video.then_some(720),
        }
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load(&self) -> Result<(), EngineError> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.next_load_error.write().await.take() {
            return Err(err);
        }
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), EngineError> {
        if let Some(err) = self.next_write_error.write().await.take() {
            return Err(err);
        }
        self.files
            .write()
            .await
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.files
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::FileNotFound {
                name: name.to_string(),
            })
    }

    async fn delete_file(&self, name: &str) -> Result<(), EngineError> {
        self.files
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::FileNotFound {
                name: name.to_string(),
            })
    }

    async fn probe(&self, name: &str) -> Result<MediaInfo, EngineError> {
        if !self.is_loaded() {
            return Err(EngineError::NotLoaded);
        }
        if let Some(err) = self.next_probe_error.write().await.take() {
            return Err(err);
        }

        let size_bytes = match self.files.read().await.get(name) {
            Some(data) => data.len() as u64,
            None => {
                return Err(EngineError::FileNotFound {
                    name: name.to_string(),
                })
            }
        };

        // Check for pre-configured result
        if let Some(info) = self.probe_results.read().await.get(name) {
            return Ok(info.clone());
        }
        Ok(Self::default_info(name, size_bytes))
    }

    async fn exec(
        &self,
        request: ExecRequest,
        progress_tx: Option<mpsc::Sender<ExecProgress>>,
    ) -> Result<(), EngineError> {
        if !self.is_loaded() {
            return Err(EngineError::NotLoaded);
        }
        self.exec_count.fetch_add(1, Ordering::SeqCst);
        self.requests.write().await.push(request.clone());

        let expected = request.expected_duration_secs;
        if let Some(tx) = &progress_tx {
            let half = expected.map_or(0.0, |d| d / 2.0);
            let _ = tx.try_send(ExecProgress::at(half, expected, Some("1x".to_string())));
        }

        let duration_ms = *self.exec_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        if let Some(err) = self.next_exec_error.write().await.take() {
            return Err(err);
        }

        let Some(output) = request.args.last() else {
            return Err(EngineError::ExecFailed {
                code: Some(1),
                stderr: "At least one output file must be specified".to_string(),
            });
        };
        let data = self.output.read().await.clone();
        self.files.write().await.insert(output.clone(), data);

        if let Some(tx) = &progress_tx {
            let _ = tx.try_send(ExecProgress::at(
                expected.unwrap_or(0.0),
                expected,
                Some("1x".to_string()),
            ));
        }
        Ok(())
    }
}
