// Domain models - Core types and data structures

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Lowest frame rate an analysis result may report
pub const MIN_ESTIMATED_FPS: f64 = 15.0;
/// Highest frame rate an analysis result may report
pub const MAX_ESTIMATED_FPS: f64 = 120.0;
/// Frame rate assumed when sampling produced nothing usable
pub const FALLBACK_FPS: f64 = 30.0;
/// Shortest trim window accepted; matches the millisecond precision of encoder seek arguments
pub const MIN_TRIM_SECONDS: f64 = 0.001;

/// Opaque, read-only reference to the input media
///
/// Owned by the UI layer; the controller clones it for the lifetime of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHandle(Arc<Path>);

impl SourceHandle {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(Arc::from(path.as_ref()))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Section of the source to keep, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl TrimWindow {
    /// Create a new trim window with validation
    pub fn new(start_seconds: f64, end_seconds: f64) -> Result<Self, DomainError> {
        if !start_seconds.is_finite() || !end_seconds.is_finite() {
            return Err(DomainError::Validation(
                "Start and end times must be finite".to_string(),
            ));
        }
        if start_seconds < 0.0 {
            return Err(DomainError::Validation(
                "Start time cannot be negative".to_string(),
            ));
        }
        if end_seconds <= start_seconds {
            return Err(DomainError::Validation(format!(
                "End time ({}s) must be after start time ({}s)",
                end_seconds, start_seconds
            )));
        }
        if end_seconds - start_seconds < MIN_TRIM_SECONDS {
            return Err(DomainError::Validation(format!(
                "Trim window must be at least {}s long",
                MIN_TRIM_SECONDS
            )));
        }

        Ok(Self {
            start_seconds,
            end_seconds,
        })
    }

    /// Length of the kept section
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

impl fmt::Display for TrimWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s-{:.3}s", self.start_seconds, self.end_seconds)
    }
}

/// What the media analyzer learned about a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub display_width: u32,
    pub display_height: u32,
    pub estimated_fps: f64,
    pub has_audio: bool,
}

impl AnalysisResult {
    /// Create new analysis result; the frame rate estimate is clamped to
    /// [`MIN_ESTIMATED_FPS`, `MAX_ESTIMATED_FPS`]
    pub fn new(
        display_width: u32,
        display_height: u32,
        estimated_fps: f64,
        has_audio: bool,
    ) -> Result<Self, DomainError> {
        if display_width == 0 || display_height == 0 {
            return Err(DomainError::Analysis(format!(
                "Video track has invalid display size {}x{}",
                display_width, display_height
            )));
        }

        let estimated_fps = if estimated_fps.is_finite() {
            estimated_fps.clamp(MIN_ESTIMATED_FPS, MAX_ESTIMATED_FPS)
        } else {
            FALLBACK_FPS
        };

        Ok(Self {
            display_width,
            display_height,
            estimated_fps,
            has_audio,
        })
    }

    /// Landscape iff width >= height
    pub fn is_landscape(&self) -> bool {
        self.display_width >= self.display_height
    }

    /// Pixels per second at source resolution
    pub fn pixel_rate(&self) -> f64 {
        self.display_width as f64 * self.display_height as f64 * self.estimated_fps
    }
}

/// Single output dimension; the engine infers the other from the aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleTarget {
    Width(u32),
    Height(u32),
}

/// Audio settings for the output track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSpec {
    pub channel_count: u8,
    pub bitrate_bps: u64,
}

impl AudioSpec {
    pub fn mono(bitrate_bps: u64) -> Self {
        Self {
            channel_count: 1,
            bitrate_bps,
        }
    }
}

/// Encode parameters, corrected between attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodePlan {
    pub video_bitrate_bps: u64,
    pub scale: Option<ScaleTarget>,
    pub audio: Option<AudioSpec>,
}

impl EncodePlan {
    pub fn target_width(&self) -> Option<u32> {
        match self.scale {
            Some(ScaleTarget::Width(width)) => Some(width),
            _ => None,
        }
    }

    pub fn target_height(&self) -> Option<u32> {
        match self.scale {
            Some(ScaleTarget::Height(height)) => Some(height),
            _ => None,
        }
    }
}

/// Buffer produced by one encode attempt
///
/// Ownership moves to the caller; dropping it releases the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedOutput {
    pub buffer: Vec<u8>,
    pub size_bytes: u64,
}

impl EncodedOutput {
    /// Wrap a buffer, taking its length as the size
    pub fn from_buffer(buffer: Vec<u8>) -> Self {
        let size_bytes = buffer.len() as u64;
        Self { buffer, size_bytes }
    }
}

/// Identity of a job within one controller instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Analyzing,
    Encoding { attempt: u32 },
    Done,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

/// One user-initiated trim+compress request
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub source: SourceHandle,
    pub state: JobState,
    pub trim_window: Option<TrimWindow>,
}

impl Job {
    pub fn new(id: JobId, source: SourceHandle) -> Self {
        Self {
            id,
            source,
            state: JobState::Idle,
            trim_window: None,
        }
    }

    /// Move to the next state; terminal states are final
    pub fn transition(&mut self, next: JobState) {
        if self.state.is_terminal() {
            return;
        }
        tracing::debug!(job_id = %self.id, from = ?self.state, to = ?next, "Job state change");
        self.state = next;
    }
}

/// Playable media produced by a successful job
#[derive(Debug)]
pub struct OutputArtifact {
    pub id: u64,
    pub job_id: JobId,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    data: Arc<[u8]>,
    // Never shared, so only the holder of the artifact keeps handles live
    live: Arc<()>,
}

impl OutputArtifact {
    pub fn new(id: u64, job_id: JobId, output: EncodedOutput) -> Self {
        Self {
            id,
            job_id,
            size_bytes: output.size_bytes,
            created_at: Utc::now(),
            data: Arc::from(output.buffer),
            live: Arc::new(()),
        }
    }

    /// Handle for the UI layer; stays valid only while this artifact is held
    pub fn handle(&self) -> ArtifactHandle {
        ArtifactHandle {
            id: self.id,
            job_id: self.job_id,
            size_bytes: self.size_bytes,
            created_at: self.created_at,
            data: Arc::downgrade(&self.data),
            live: Arc::downgrade(&self.live),
        }
    }
}

/// UI-facing reference to the live output artifact
///
/// The controller keeps ownership of the bytes. Once the artifact is
/// released the handle is dead and [`ArtifactHandle::bytes`] returns `None`,
/// even while an earlier `bytes()` borrow is still being read.
#[derive(Debug, Clone)]
pub struct ArtifactHandle {
    pub id: u64,
    pub job_id: JobId,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    data: Weak<[u8]>,
    live: Weak<()>,
}

impl ArtifactHandle {
    pub fn is_live(&self) -> bool {
        self.live.strong_count() > 0
    }

    /// Borrow the encoded bytes if the artifact is still held
    ///
    /// The returned buffer outlives a later release, but does not keep
    /// this handle live.
    pub fn bytes(&self) -> Option<Arc<[u8]>> {
        if !self.is_live() {
            return None;
        }
        self.data.upgrade()
    }
}

/// Status stream value observed by the UI layer
#[derive(Debug, Clone)]
pub enum ConversionStatus {
    Idle,
    Analyzing,
    Encoding { attempt: u32, max_attempts: u32 },
    Done { handle: ArtifactHandle, size_bytes: u64 },
    Error { message: String },
}

impl ConversionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConversionStatus::Done { .. } | ConversionStatus::Error { .. }
        )
    }
}

impl fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionStatus::Idle => write!(f, "idle"),
            ConversionStatus::Analyzing => write!(f, "analyzing"),
            ConversionStatus::Encoding {
                attempt,
                max_attempts,
            } => write!(f, "encoding (attempt {}/{})", attempt, max_attempts),
            ConversionStatus::Done { size_bytes, .. } => write!(f, "done ({} bytes)", size_bytes),
            ConversionStatus::Error { message } => write!(f, "error: {}", message),
        }
    }
}

/// Budget and correction constants for a conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    /// Hard ceiling for the output, with headroom under a 10MB limit
    pub target_bytes: u64,
    pub max_attempts: u32,
    pub min_video_bitrate_bps: u64,
    pub audio_bitrate_bps: u64,
    pub overhead_floor_bytes: u64,
    pub overhead_ratio: f64,
    pub safety_margin: f64,
    pub fallback_factor: f64,
    pub downscale_bpp_threshold: f64,
    pub downscale_dimension: u32,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            target_bytes: 9_800_000,
            max_attempts: 5,
            min_video_bitrate_bps: 150_000,
            audio_bitrate_bps: 96_000,
            overhead_floor_bytes: 150_000,
            overhead_ratio: 0.015,
            safety_margin: 0.92,
            fallback_factor: 0.85,
            downscale_bpp_threshold: 0.02,
            downscale_dimension: 1080,
        }
    }
}
