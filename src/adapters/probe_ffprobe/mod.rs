//! FFprobe adapter for media analysis
//!
//! Runs `ffprobe` as a subprocess and reads its JSON stream listing.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// FFprobe-based media analyzer
#[derive(Debug, Clone)]
pub struct FfprobeAnalyzer {
    ffprobe_path: PathBuf,
}

impl FfprobeAnalyzer {
    /// Create new FFprobe analyzer
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

impl Default for FfprobeAnalyzer {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl MediaAnalyzer for FfprobeAnalyzer {
    async fn analyze(&self, source: &SourceHandle) -> Result<AnalysisResult, DomainError> {
        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.args(["-v", "quiet", "-print_format", "json", "-show_streams"])
            .arg(source.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(cmd = ?cmd, "Running ffprobe");

        let output = cmd.output().await.map_err(|e| {
            DomainError::Analysis(format!(
                "Failed to run {}: {}",
                self.ffprobe_path.display(),
                e
            ))
        })?;

        if !output.status.success() {
            return Err(DomainError::Analysis(format!(
                "ffprobe could not read {}: {}",
                source,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let json: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| DomainError::Analysis(format!("Failed to parse ffprobe output: {}", e)))?;

        parse_probe_output(&json)
    }
}

/// Turn ffprobe's `-show_streams` JSON into an analysis result
pub fn parse_probe_output(json: &Value) -> Result<AnalysisResult, DomainError> {
    let streams = json
        .get("streams")
        .and_then(Value::as_array)
        .ok_or_else(|| DomainError::Analysis("Missing streams in ffprobe output".to_string()))?;

    let is_type = |stream: &&Value, kind: &str| {
        stream.get("codec_type").and_then(Value::as_str) == Some(kind)
    };

    let video = streams
        .iter()
        .find(|s| is_type(s, "video") && !is_attached_picture(s))
        .ok_or_else(|| DomainError::Analysis("No video track found".to_string()))?;
    let has_audio = streams.iter().any(|s| is_type(&s, "audio"));

    let width = video.get("width").and_then(Value::as_u64).unwrap_or(0) as u32;
    let height = video.get("height").and_then(Value::as_u64).unwrap_or(0) as u32;

    let (display_width, display_height) = if is_quarter_turn(rotation_degrees(video)) {
        (height, width)
    } else {
        (width, height)
    };

    let fps = ["avg_frame_rate", "r_frame_rate"]
        .iter()
        .filter_map(|key| video.get(*key).and_then(Value::as_str))
        .find_map(parse_frame_rate)
        .unwrap_or(FALLBACK_FPS);

    AnalysisResult::new(display_width, display_height, fps, has_audio)
}

/// Cover art shows up as a one-frame video stream
fn is_attached_picture(stream: &Value) -> bool {
    stream
        .get("disposition")
        .and_then(|d| d.get("attached_pic"))
        .and_then(Value::as_i64)
        == Some(1)
}

/// Rotation from the `rotate` tag or the display matrix side data
fn rotation_degrees(stream: &Value) -> i64 {
    let from_tag = stream
        .get("tags")
        .and_then(|t| t.get("rotate"))
        .and_then(Value::as_str)
        .and_then(|s| s.trim().parse::<i64>().ok());

    let from_side_data = || {
        stream
            .get("side_data_list")
            .and_then(Value::as_array)?
            .iter()
            .find_map(|data| data.get("rotation").and_then(Value::as_i64))
    };

    from_tag.or_else(from_side_data).unwrap_or(0)
}

fn is_quarter_turn(degrees: i64) -> bool {
    degrees.rem_euclid(180) == 90
}

/// Parse "30000/1001" or "25" into frames per second
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };

    (value.is_finite() && value > 0.0).then_some(value)
}
