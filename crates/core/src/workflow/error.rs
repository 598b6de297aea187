//! Error types for the workflow module.

use chrono::Utc;
use thiserror::Error;

use crate::engine::EngineError;

use super::types::{FailureKind, FailureReport, InputSlot};

/// Errors returned by [`Workflow::convert`](super::Workflow::convert) and friends.
///
/// `MissingInput`, `UnsupportedSlot` and `Busy` are refusals: nothing ran and
/// no state changed. Every other variant is a failed attempt.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A required input has not been selected.
    #[error("No {slot} file selected")]
    MissingInput { slot: InputSlot },

    /// The slot does not belong to this workflow.
    #[error("This workflow has no {slot} input")]
    UnsupportedSlot { slot: InputSlot },

    /// A conversion is already running on this workflow.
    #[error("A conversion is already running")]
    Busy,

    /// The engine could not be loaded.
    #[error("Failed to load the conversion engine: {0}")]
    EngineLoad(#[source] EngineError),

    /// Exchanging files with the engine failed.
    #[error("Failed to exchange files with the conversion engine: {0}")]
    Storage(#[source] EngineError),

    /// The engine could not decode an input.
    #[error("The selected {} could not be decoded: {source}", .slot.map_or("file", |s| s.as_str()))]
    InvalidInput {
        slot: Option<InputSlot>,
        source: EngineError,
    },

    /// An input that must carry sound has no audio stream.
    #[error("The selected {slot} has no audio track")]
    NoAudioTrack { slot: InputSlot },

    /// The engine failed for a reason unrelated to the inputs.
    #[error("Conversion failed: {0}")]
    Execution(#[source] EngineError),

    /// The engine reported success but produced nothing.
    #[error("Conversion produced an empty {output}")]
    EmptyOutput { output: &'static str },
}

impl WorkflowError {
    /// Failure category, or `None` for refusals.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::MissingInput { .. } | Self::UnsupportedSlot { .. } | Self::Busy => None,
            Self::EngineLoad(_) => Some(FailureKind::EngineLoad),
            Self::Storage(_) => Some(FailureKind::Storage),
            Self::InvalidInput { .. } | Self::NoAudioTrack { .. } => Some(FailureKind::InvalidInput),
            Self::Execution(_) | Self::EmptyOutput { .. } => Some(FailureKind::Execution),
        }
    }

    /// Whether the same request may succeed if tried again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Busy => true,
            _ => self.failure_kind().is_some_and(|k| k.is_retryable()),
        }
    }

    /// Message shown to the user in the page's error alert.
    pub fn user_message(&self) -> String {
        match self {
            Self::EngineLoad(_) => {
                "The conversion engine could not be loaded. Check your connection and try again."
                    .to_string()
            }
            Self::Storage(_) => {
                "The files could not be handed to the conversion engine. Please try again."
                    .to_string()
            }
            Self::InvalidInput { slot, .. } => format!(
                "The selected {} could not be read. Please choose a different file.",
                slot.map_or("file", |s| s.as_str())
            ),
            Self::NoAudioTrack { slot } => format!(
                "The selected {} has no audio track. Please choose a file with sound.",
                slot
            ),
            Self::Execution(_) | Self::EmptyOutput { .. } => {
                "The conversion failed. Please try again.".to_string()
            }
            refusal => refusal.to_string(),
        }
    }

    /// Report stored in the workflow state, or `None` for refusals.
    pub fn report(&self) -> Option<FailureReport> {
        self.failure_kind().map(|kind| FailureReport {
            kind,
            message: self.user_message(),
            retryable: kind.is_retryable(),
            at: Utc::now(),
        })
    }
}
