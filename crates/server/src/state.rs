use std::sync::Arc;

use mediaconv_core::{Config, ImageToVideo, VideoToAudio, Workflow};

/// Shared application state
pub struct AppState {
    config: Config,
    image_to_video: ImageToVideo,
    video_to_audio: VideoToAudio,
}

impl AppState {
    pub fn new(config: Config, image_to_video: ImageToVideo, video_to_audio: VideoToAudio) -> Self {
        Self {
            config,
            image_to_video,
            video_to_audio,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Looks a workflow up by its route id.
    pub fn workflow(&self, id: &str) -> Option<Arc<Workflow>> {
        self.workflows()
            .into_iter()
            .find(|w| w.recipe().id == id)
            .cloned()
    }

    /// Both workflows, in landing page order.
    pub fn workflows(&self) -> [&Arc<Workflow>; 2] {
        [
            self.image_to_video.workflow(),
            self.video_to_audio.workflow(),
        ]
    }
}
