//! Types for the workflow module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// A named input position of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSlot {
    Image,
    Audio,
    Video,
}

impl InputSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// File picker accept filter for this slot.
    pub fn accept(&self) -> &'static str {
        match self {
            Self::Image => "image/*",
            Self::Audio => "audio/*",
            Self::Video => "video/*",
        }
    }
}

impl fmt::Display for InputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            other => Err(format!("unknown input slot: {}", other)),
        }
    }
}

/// A file picked by the user for one slot. The payload is never mutated.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: Option<String>,
    data: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type,
            data: data.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn summary(&self, slot: InputSlot) -> SelectionSummary {
        SelectionSummary {
            slot,
            name: self.name.clone(),
            content_type: self.content_type.clone(),
            size_bytes: self.size_bytes(),
        }
    }
}

/// Selected file metadata, without its bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionSummary {
    pub slot: InputSlot,
    pub name: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
}

/// The product of a successful conversion.
///
/// `id` is the handle the presentation layer uses to address the result; it
/// changes with every conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub id: Uuid,
    pub filename: String,
    pub mime: String,
    pub created_at: DateTime<Utc>,
    data: Arc<[u8]>,
}

impl ConversionOutput {
    pub fn new(filename: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            mime: mime.into(),
            created_at: Utc::now(),
            data: data.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn summary(&self) -> OutputSummary {
        OutputSummary {
            id: self.id,
            filename: self.filename.clone(),
            mime: self.mime.clone(),
            size_bytes: self.size_bytes(),
            created_at: self.created_at,
        }
    }
}

/// Result metadata, without its bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSummary {
    pub id: Uuid,
    pub filename: String,
    pub mime: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Category of a failed conversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The engine could not be loaded; the next attempt retries the load.
    EngineLoad,
    /// Writing inputs to or reading output from the engine failed.
    Storage,
    /// The selected file cannot be converted; pick another one.
    InvalidInput,
    /// The engine failed for a reason unrelated to the input.
    Execution,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EngineLoad => "engine_load",
            Self::Storage => "storage",
            Self::InvalidInput => "invalid_input",
            Self::Execution => "execution",
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidInput)
    }
}

/// The last failed attempt, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub message: String,
    pub retryable: bool,
    pub at: DateTime<Utc>,
}

/// Serializable view of a workflow for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub workflow: &'static str,
    pub title: &'static str,
    pub busy: bool,
    pub engine_ready: bool,
    /// Completion percentage of the running conversion.
    pub progress: Option<f32>,
    pub selections: Vec<SelectionSummary>,
    /// Slots that still need a file before `convert` is accepted.
    pub missing: Vec<InputSlot>,
    pub result: Option<OutputSummary>,
    pub last_error: Option<FailureReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_parse_and_accept() {
        assert_eq!("video".parse::<InputSlot>().unwrap(), InputSlot::Video);
        assert!("subtitle".parse::<InputSlot>().is_err());
        assert_eq!(InputSlot::Image.accept(), "image/*");
        assert_eq!(InputSlot::Audio.accept(), "audio/*");
        assert_eq!(InputSlot::Video.to_string(), "video");
    }

    #[test]
    fn test_output_ids_are_unique() {
        let a = ConversionOutput::new("output.mp3", "audio/mpeg", vec![1, 2, 3]);
        let b = ConversionOutput::new("output.mp3", "audio/mpeg", vec![1, 2, 3]);
        assert_ne!(a.id, b.id);
        assert_eq!(a.summary().size_bytes, 3);
        assert_eq!(a.data(), &[1, 2, 3]);
    }

    #[test]
    fn test_failure_kind_serialization() {
        let json = serde_json::to_string(&FailureKind::EngineLoad).unwrap();
        assert_eq!(json, "\"engine_load\"");
        assert_eq!(FailureKind::InvalidInput.as_str(), "invalid_input");
        assert!(FailureKind::Storage.is_retryable());
        assert!(!FailureKind::InvalidInput.is_retryable());
    }
}
