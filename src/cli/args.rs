//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::adapters::EncoderPreset;

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start time (MM:SS, default 0:00)
    #[arg(short, long)]
    pub start: Option<String>,

    /// End time (MM:SS)
    #[arg(short, long)]
    pub end: Option<String>,

    /// Output file path (default: <input stem>_trimfit.mp4)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Size budget in bytes
    #[arg(long)]
    pub target_bytes: Option<u64>,

    /// Maximum encode attempts
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Quality preference (fast, balanced, quality)
    #[arg(long)]
    pub preset: Option<EncoderPreset>,

    /// Replace the output file if it exists
    #[arg(short, long)]
    pub force: bool,

    /// Print the result summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start time (MM:SS, default 0:00)
    #[arg(short, long)]
    pub start: Option<String>,

    /// End time (MM:SS)
    #[arg(short, long)]
    pub end: Option<String>,

    /// Size budget in bytes
    #[arg(long)]
    pub target_bytes: Option<u64>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
