//! FFmpeg execution adapter
//!
//! Runs the `ffmpeg` binary for one encode attempt and hands the produced
//! MP4 back as an owned buffer.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Lines of ffmpeg stderr kept in an encode error
const STDERR_TAIL_LINES: usize = 6;

/// Speed/quality trade-off handed to libx264
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderPreset {
    Fast,
    #[default]
    Balanced,
    Quality,
}

impl EncoderPreset {
    /// libx264 `-preset` name
    pub fn x264_preset(self) -> &'static str {
        match self {
            EncoderPreset::Fast => "veryfast",
            EncoderPreset::Balanced => "medium",
            EncoderPreset::Quality => "slow",
        }
    }
}

impl FromStr for EncoderPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(EncoderPreset::Fast),
            "balanced" => Ok(EncoderPreset::Balanced),
            "quality" => Ok(EncoderPreset::Quality),
            other => Err(format!(
                "unknown preset '{}' (expected fast, balanced or quality)",
                other
            )),
        }
    }
}

impl fmt::Display for EncoderPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncoderPreset::Fast => "fast",
            EncoderPreset::Balanced => "balanced",
            EncoderPreset::Quality => "quality",
        };
        f.write_str(name)
    }
}

/// FFmpeg-based transcode engine
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
    preset: EncoderPreset,
    threads: usize,
}

impl FfmpegTranscoder {
    /// Create new FFmpeg transcoder
    pub fn new(ffmpeg_path: impl Into<PathBuf>, preset: EncoderPreset, threads: usize) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            preset,
            threads: threads.max(1),
        }
    }

    pub fn preset(&self) -> EncoderPreset {
        self.preset
    }

    /// Build the ffmpeg command line for one attempt
    pub fn build_args(
        &self,
        input: &Path,
        window: &TrimWindow,
        plan: &EncodePlan,
        output: &Path,
    ) -> Vec<OsString> {
        let bitrate = plan.video_bitrate_bps;
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-ss".into(),
            format!("{:.3}", window.start_seconds),
            "-t".into(),
            format!("{:.3}", window.duration()),
        ];

        let mut encode_args: Vec<String> = vec![
            "-map".into(),
            "0:v:0".into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            self.preset.x264_preset().into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-b:v".into(),
            bitrate.to_string(),
            "-maxrate".into(),
            bitrate.to_string(),
            "-bufsize".into(),
            bitrate.saturating_mul(2).to_string(),
        ];

        if let Some(scale) = plan.scale {
            let filter = match scale {
                ScaleTarget::Width(width) => format!("scale={}:-2", width),
                ScaleTarget::Height(height) => format!("scale=-2:{}", height),
            };
            encode_args.extend(["-vf".into(), filter]);
        }

        match plan.audio {
            Some(audio) => encode_args.extend([
                "-map".into(),
                "0:a:0".into(),
                "-c:a".into(),
                "aac".into(),
                "-ac".into(),
                audio.channel_count.to_string(),
                "-b:a".into(),
                audio.bitrate_bps.to_string(),
            ]),
            None => encode_args.push("-an".into()),
        }

        encode_args.extend([
            "-threads".into(),
            self.threads.to_string(),
            "-movflags".into(),
            "+faststart".into(),
            "-f".into(),
            "mp4".into(),
        ]);

        args.push("-i".into());
        let mut args: Vec<OsString> = args.into_iter().map(OsString::from).collect();
        args.push(input.as_os_str().to_owned());
        args.extend(encode_args.into_iter().map(OsString::from));
        args.push(output.as_os_str().to_owned());
        args
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", EncoderPreset::default(), num_cpus::get())
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegTranscoder {
    async fn encode(
        &self,
        source: &SourceHandle,
        window: &TrimWindow,
        plan: &EncodePlan,
    ) -> Result<EncodedOutput, DomainError> {
        let scratch = tempfile::Builder::new()
            .prefix("trimfit-")
            .suffix(".mp4")
            .tempfile()
            .map_err(|e| DomainError::Encode(format!("Failed to create scratch file: {}", e)))?
            .into_temp_path();

        let args = self.build_args(source.path(), window, plan, &scratch);
        debug!(
            ffmpeg = %self.ffmpeg_path.display(),
            bitrate_bps = plan.video_bitrate_bps,
            "Running ffmpeg"
        );

        let output = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DomainError::Encode(format!(
                    "Failed to run {}: {}",
                    self.ffmpeg_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let tail = stderr_tail(&output.stderr);
            warn!(code = ?output.status.code(), stderr = %tail, "ffmpeg failed");
            return Err(DomainError::Encode(match output.status.code() {
                Some(code) => format!("ffmpeg exited with status {}: {}", code, tail),
                None => format!("ffmpeg was terminated: {}", tail),
            }));
        }

        let buffer = tokio::fs::read(&scratch)
            .await
            .map_err(|e| DomainError::Encode(format!("Failed to read encoded output: {}", e)))?;

        if buffer.is_empty() {
            return Err(DomainError::Encode(
                "ffmpeg produced an empty file".to_string(),
            ));
        }

        Ok(EncodedOutput::from_buffer(buffer))
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
