// TOML config adapter - Application configuration from file and environment

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adapters::exec_ffmpeg::EncoderPreset;
use crate::domain::model::ConversionSettings;
use crate::error::{TrimFitError, TrimFitResult};

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "trimfit.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub conversion: ConversionSettings,
    pub encoder: EncoderSettings,
    pub input: InputSettings,
    pub logging: LoggingSettings,
}

/// External tool locations and encoder tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub preset: EncoderPreset,
    pub threads: usize,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            preset: EncoderPreset::default(),
            threads: num_cpus::get(),
        }
    }
}

/// Trim input handling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Reject malformed seconds instead of reading them as zero
    pub strict_time_parsing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from `trimfit.toml` when present, then apply
    /// environment overrides and validate
    pub fn load(path: Option<&Path>) -> TrimFitResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load_from_path(fallback)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file without overrides
    pub fn load_from_path(path: &Path) -> TrimFitResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TrimFitError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = Self::from_toml_str(&content).map_err(|message| {
            TrimFitError::ConfigParse {
                path: path.to_path_buf(),
                message,
            }
        })?;

        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Apply `TRIMFIT_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> TrimFitResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TRIMFIT_TARGET_BYTES") {
            self.conversion.target_bytes = parse_env("TRIMFIT_TARGET_BYTES", &value)?;
        }
        if let Some(value) = lookup("TRIMFIT_MAX_ATTEMPTS") {
            self.conversion.max_attempts = parse_env("TRIMFIT_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = lookup("TRIMFIT_LOG_LEVEL") {
            self.logging.level = value.trim().to_ascii_lowercase();
        }
        if let Some(value) = lookup("TRIMFIT_FFMPEG") {
            self.encoder.ffmpeg_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("TRIMFIT_FFPROBE") {
            self.encoder.ffprobe_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("TRIMFIT_PRESET") {
            self.encoder.preset = parse_env("TRIMFIT_PRESET", &value)?;
        }
        Ok(())
    }

    /// Reject values the controller cannot work with
    pub fn validate(&self) -> TrimFitResult<()> {
        let conversion = &self.conversion;

        if conversion.target_bytes == 0 {
            return Err(TrimFitError::invalid(
                "conversion.target_bytes",
                "must be greater than zero",
            ));
        }
        if conversion.max_attempts == 0 {
            return Err(TrimFitError::invalid(
                "conversion.max_attempts",
                "must be at least 1",
            ));
        }
        if conversion.audio_bitrate_bps == 0 {
            return Err(TrimFitError::invalid(
                "conversion.audio_bitrate_bps",
                "must be greater than zero",
            ));
        }
        if conversion.min_video_bitrate_bps == 0 {
            return Err(TrimFitError::invalid(
                "conversion.min_video_bitrate_bps",
                "must be greater than zero",
            ));
        }

        for (field, value) in [
            ("conversion.overhead_ratio", conversion.overhead_ratio),
            ("conversion.safety_margin", conversion.safety_margin),
            ("conversion.fallback_factor", conversion.fallback_factor),
            ("conversion.downscale_bpp_threshold", conversion.downscale_bpp_threshold),
        ] {
            if !(value.is_finite() && value > 0.0 && value <= 1.0) {
                return Err(TrimFitError::invalid(
                    field,
                    format!("{} is outside (0, 1]", value),
                ));
            }
        }

        if conversion.downscale_dimension == 0 {
            return Err(TrimFitError::invalid(
                "conversion.downscale_dimension",
                "must be greater than zero",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(TrimFitError::invalid(
                "logging.level",
                format!(
                    "unknown level '{}' (expected one of {})",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> TrimFitResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| TrimFitError::invalid(key, format!("'{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.conversion.target_bytes, 9_800_000);
        assert_eq!(config.conversion.max_attempts, 5);
        assert_eq!(config.logging.level, "info");
        assert!(!config.input.strict_time_parsing);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [conversion]
            target_bytes = 7500000

            [encoder]
            preset = "quality"

            [input]
            strict_time_parsing = true
            "#,
        )
        .unwrap();

        assert_eq!(config.conversion.target_bytes, 7_500_000);
        assert_eq!(config.conversion.max_attempts, 5);
        assert_eq!(config.encoder.preset, EncoderPreset::Quality);
        assert_eq!(config.encoder.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert!(config.input.strict_time_parsing);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"\njson = true").unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/trimfit.toml")));
        assert!(matches!(result, Err(TrimFitError::ConfigRead { .. })));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[conversion]\ntarget_bytes = \"lots\"").unwrap();

        let result = AppConfig::load_from_path(file.path());
        assert!(matches!(result, Err(TrimFitError::ConfigParse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("TRIMFIT_TARGET_BYTES", "5000000"),
                ("TRIMFIT_MAX_ATTEMPTS", "3"),
                ("TRIMFIT_LOG_LEVEL", "WARN"),
                ("TRIMFIT_FFMPEG", "/opt/ffmpeg/bin/ffmpeg"),
                ("TRIMFIT_PRESET", "fast"),
            ]))
            .unwrap();

        assert_eq!(config.conversion.target_bytes, 5_000_000);
        assert_eq!(config.conversion.max_attempts, 3);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(
            config.encoder.ffmpeg_path,
            PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.encoder.preset, EncoderPreset::Fast);
        assert_eq!(config.encoder.ffprobe_path, PathBuf::from("ffprobe"));
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(env(&[("TRIMFIT_MAX_ATTEMPTS", "many")]));
        assert!(matches!(result, Err(TrimFitError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_validate_rejects_nonsense() {
        let mut config = AppConfig::default();
        config.conversion.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.conversion.safety_margin = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.conversion.target_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
