//! Still image + audio track into an MP4 video.

use std::sync::Arc;

use crate::engine::Engine;

use super::controller::Workflow;
use super::error::WorkflowError;
use super::recipe::IMAGE_TO_VIDEO;
use super::types::{ConversionOutput, InputSlot, SelectedFile, WorkflowSnapshot};

/// Typed front-end over the image-to-video [`Workflow`].
pub struct ImageToVideo {
    workflow: Arc<Workflow>,
}

impl ImageToVideo {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            workflow: Arc::new(Workflow::new(&IMAGE_TO_VIDEO, engine)),
        }
    }

    pub async fn select_image(&self, file: Option<SelectedFile>) {
        self.workflow.store_selection(InputSlot::Image, file).await;
    }

    pub async fn select_audio(&self, file: Option<SelectedFile>) {
        self.workflow.store_selection(InputSlot::Audio, file).await;
    }

    /// Produces `output.mp4` from the selected image and audio. An audio
    /// file without an audio stream fails with [`WorkflowError::NoAudioTrack`].
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
