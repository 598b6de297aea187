//! Conversion workflows.
//!
//! A [`Workflow`] runs one fixed [`Recipe`] against an [`Engine`](crate::engine::Engine):
//! it keeps the selected inputs, loads the engine on first use, feeds the
//! inputs into the engine's scratch filesystem, runs the recipe and keeps the
//! produced file until the next successful conversion replaces it.
//!
//! [`ImageToVideo`] and [`VideoToAudio`] are typed front-ends over the two
//! recipes.

mod controller;
mod error;
mod image_to_video;
mod recipe;
mod types;
mod video_to_audio;

pub use controller::Workflow;
pub use error::WorkflowError;
pub use image_to_video::ImageToVideo;
pub use recipe::{Recipe, RecipeInput, IMAGE_TO_VIDEO, RECIPES, VIDEO_TO_AUDIO};
pub use types::{
    ConversionOutput, FailureKind, FailureReport, InputSlot, OutputSummary, SelectedFile,
    SelectionSummary, WorkflowSnapshot,
};
pub use video_to_audio::VideoToAudio;
