pub mod config;
pub mod engine;
pub mod testing;
pub mod workflow;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, LoggingConfig, ServerConfig,
};
pub use engine::{Engine, EngineConfig, EngineError, FfmpegEngine};
pub use workflow::{
    ConversionOutput, FailureKind, ImageToVideo, InputSlot, SelectedFile, VideoToAudio, Workflow,
    WorkflowError, WorkflowSnapshot,
};
