// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod probe_ffprobe;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::{EncoderPreset, FfmpegTranscoder};
pub use probe_ffprobe::FfprobeAnalyzer;
pub use toml_config::{AppConfig, EncoderSettings, InputSettings, LoggingSettings};
pub use tracing_log::init_logging;
