//! Trait definitions for the engine module.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::EngineError;
use super::types::{ExecProgress, ExecRequest, MediaInfo};

/// A transcoding engine with its own scratch filesystem.
///
/// File names are flat (no directories) and scoped to one engine instance.
/// Every argument list handed to [`Engine::exec`] refers to inputs and
/// outputs by those names.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Prepares the engine for use. Safe to call again after a failure.
    async fn load(&self) -> Result<(), EngineError>;

    /// Creates or replaces a scratch file.
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), EngineError>;

    /// Reads a scratch file.
    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError>;

    /// Removes a scratch file. Fails with [`EngineError::FileNotFound`] if absent.
    async fn delete_file(&self, name: &str) -> Result<(), EngineError>;

    /// Inspects a scratch file.
    async fn probe(&self, name: &str) -> Result<MediaInfo, EngineError>;

    /// Runs the engine with a fixed argument list.
    ///
    /// Progress updates are sent on a best-effort basis; a full or dropped
    /// channel does not affect the run.
    async fn exec(
        &self,
        request: ExecRequest,
        progress_tx: Option<mpsc::Sender<ExecProgress>>,
    ) -> Result<(), EngineError>;
}
