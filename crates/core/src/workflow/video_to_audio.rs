//! Audio extraction from a video.

use std::sync::Arc;

use crate::engine::Engine;

use super::controller::Workflow;
use super::error::WorkflowError;
use super::recipe::VIDEO_TO_AUDIO;
use super::types::{ConversionOutput, InputSlot, SelectedFile, WorkflowSnapshot};

/// Typed front-end over the video-to-audio [`Workflow`].
pub struct VideoToAudio {
    workflow: Arc<Workflow>,
}

impl VideoToAudio {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            workflow: Arc::new(Workflow::new(&VIDEO_TO_AUDIO, engine)),
        }
    }

    pub async fn select_video(&self, file: Option<SelectedFile>) {
        self.workflow.store_selection(InputSlot::Video, file).await;
    }

    /// Produces `output.mp3`. A video without an audio stream fails with
    /// [`WorkflowError::NoAudioTrack`].
    pub async fn convert(&self) -> Result<ConversionOutput, WorkflowError> {
        self.workflow.convert().await
    }

    pub async fn download(&self) -> Option<ConversionOutput> {
        self.workflow.download().await
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        self.workflow.snapshot().await
    }

    /// The untyped workflow, shareable with spawned tasks.
    pub fn workflow(&self) -> &Arc<Workflow> {
        &self.workflow
    }
}
