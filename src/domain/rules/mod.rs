// Domain rules - Budget derivation, bitrate correction and input validation

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::utils::time::TimeParser;

/// Turns raw start/end text into a trim window
pub struct TrimValidator;

impl TrimValidator {
    /// Validate the user's start/end text
    ///
    /// An absent start means 0; an absent end is an error.
    pub fn validate(
        parser: &TimeParser,
        start_text: &str,
        end_text: &str,
    ) -> Result<TrimWindow, DomainError> {
        let start = parser.parse_clock(start_text).unwrap_or(0.0);
        let end = parser.parse_clock(end_text).ok_or_else(|| {
            DomainError::Validation(format!("End time '{}' is missing or unreadable", end_text))
        })?;

        TrimWindow::new(start, end)
    }
}

/// Derives the first encode plan from the analysis and the budget
pub struct ParameterDeriver;

/// Intermediate numbers behind a derived plan, kept for logging and dry runs
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BudgetBreakdown {
    pub duration_seconds: f64,
    pub overhead_bytes: u64,
    pub audio_bytes: u64,
    pub video_bytes: u64,
    pub bits_per_pixel: f64,
}

impl ParameterDeriver {
    /// Compute the initial plan
    pub fn derive(
        analysis: &AnalysisResult,
        window: &TrimWindow,
        settings: &ConversionSettings,
    ) -> Result<EncodePlan, DomainError> {
        Self::derive_with_breakdown(analysis, window, settings).map(|(plan, _)| plan)
    }

    /// Compute the initial plan along with the budget split behind it
    pub fn derive_with_breakdown(
        analysis: &AnalysisResult,
        window: &TrimWindow,
        settings: &ConversionSettings,
    ) -> Result<(EncodePlan, BudgetBreakdown), DomainError> {
        let duration = window.duration();
        let target = settings.target_bytes;

        let overhead_bytes = settings
            .overhead_floor_bytes
            .max((target as f64 * settings.overhead_ratio).round() as u64);

        let audio_bytes = if analysis.has_audio {
            (settings.audio_bitrate_bps as f64 * duration / 8.0).ceil() as u64
        } else {
            0
        };

        let video_bytes = target as i128 - overhead_bytes as i128 - audio_bytes as i128;
        if video_bytes <= 0 {
            return Err(DomainError::BudgetExhausted {
                target_bytes: target,
                duration_seconds: duration,
                overhead_bytes,
                audio_bytes,
            });
        }
        let video_bytes = video_bytes as u64;

        let derived_bitrate = (video_bytes as f64 * 8.0 / duration).floor() as u64;
        let video_bitrate_bps = if derived_bitrate < settings.min_video_bitrate_bps {
            tracing::warn!(
                derived_bitrate,
                floor = settings.min_video_bitrate_bps,
                "Derived bitrate below floor, raising it"
            );
            settings.min_video_bitrate_bps
        } else {
            derived_bitrate
        };

        let pixel_rate = analysis.pixel_rate();
        let bits_per_pixel = if pixel_rate > 0.0 {
            video_bitrate_bps as f64 / pixel_rate
        } else {
            f64::INFINITY
        };

        let plan = EncodePlan {
            video_bitrate_bps,
            scale: Self::downscale_target(analysis, bits_per_pixel, settings),
            audio: analysis
                .has_audio
                .then(|| AudioSpec::mono(settings.audio_bitrate_bps)),
        };

        let breakdown = BudgetBreakdown {
            duration_seconds: duration,
            overhead_bytes,
            audio_bytes,
            video_bytes,
            bits_per_pixel,
        };

        Ok((plan, breakdown))
    }

    /// Downscale only when the source is both large and starved of bits
    fn downscale_target(
        analysis: &AnalysisResult,
        bits_per_pixel: f64,
        settings: &ConversionSettings,
    ) -> Option<ScaleTarget> {
        let landscape = analysis.is_landscape();
        let short_side = if landscape {
            analysis.display_height
        } else {
            analysis.display_width
        };

        if short_side <= settings.downscale_dimension
            || bits_per_pixel >= settings.downscale_bpp_threshold
        {
            return None;
        }

        if landscape {
            Some(ScaleTarget::Height(settings.downscale_dimension))
        } else {
            Some(ScaleTarget::Width(settings.downscale_dimension))
        }
    }
}

/// Corrects the video bitrate after an attempt overshoots the budget
pub struct BitrateCorrector;

impl BitrateCorrector {
    /// Next bitrate: never higher than `current_bps`, strictly lower unless
    /// already at the floor
    pub fn next_bitrate(current_bps: u64, size_bytes: u64, settings: &ConversionSettings) -> u64 {
        let ratio = if size_bytes == 0 {
            1.0
        } else {
            settings.target_bytes as f64 / size_bytes as f64
        };

        let candidate = (current_bps as f64 * ratio * settings.safety_margin).floor() as u64;
        let next = if candidate < current_bps {
            candidate
        } else {
            (current_bps as f64 * settings.fallback_factor).floor() as u64
        };

        next.max(settings.min_video_bitrate_bps)
    }
}
