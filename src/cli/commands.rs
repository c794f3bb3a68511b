//! Command implementations

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::json;
use tracing::{info, warn};

use crate::adapters::AppConfig;
use crate::app::{AppContainer, ConversionReport, DefaultAppContainer, JobOutcome, PlanPreview};
use crate::cli::args::{ConvertArgs, InspectArgs, PlanArgs};
use crate::domain::model::{AnalysisResult, ConversionStatus, SourceHandle};
use crate::output::{default_output_path, write_artifact, OverwritePolicy};
use crate::utils::format_file_size;
use crate::utils::time::TimeParser;

/// Execute the convert command
pub async fn convert(args: ConvertArgs, mut config: AppConfig) -> Result<()> {
    if let Some(target_bytes) = args.target_bytes {
        config.conversion.target_bytes = target_bytes;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.conversion.max_attempts = max_attempts;
    }
    if let Some(preset) = args.preset {
        config.encoder.preset = preset;
    }
    config.validate()?;

    ensure_input(&args.input)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    let policy = if args.force {
        OverwritePolicy::Always
    } else {
        OverwritePolicy::Never
    };
    if policy == OverwritePolicy::Never && output_path.exists() {
        bail!(
            "Output file already exists: {} (pass --force to replace it)",
            output_path.display()
        );
    }

    info!(
        input = %args.input.display(),
        output = %output_path.display(),
        target_bytes = config.conversion.target_bytes,
        preset = %config.encoder.preset,
        "Starting convert command"
    );

    let container = DefaultAppContainer::new(&config);
    let controller = container.convert_interactor();
    let mut status_rx = controller.subscribe();

    let job = controller.start_conversion(
        SourceHandle::new(&args.input),
        args.start.as_deref().unwrap_or_default(),
        args.end.as_deref().unwrap_or_default(),
    );
    tokio::pin!(job);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            outcome = &mut job => break outcome,
            changed = status_rx.changed() => {
                if changed.is_ok() {
                    let status = status_rx.borrow_and_update().clone();
                    print_status(&status);
                }
            }
            _ = &mut ctrl_c => {
                controller.cancel_current();
                warn!("Interrupted, conversion cancelled");
                bail!("Conversion cancelled");
            }
        }
    };

    let result = match outcome {
        JobOutcome::Completed(report) => {
            finish_conversion(&report, &output_path, policy, &config, args.json)
        }
        JobOutcome::Failed(e) => Err(anyhow!(e)),
        JobOutcome::Superseded => Err(anyhow!("Conversion was superseded")),
    };

    controller.shutdown();
    result
}

fn finish_conversion(
    report: &ConversionReport,
    output_path: &Path,
    policy: OverwritePolicy,
    config: &AppConfig,
    json: bool,
) -> Result<()> {
    let bytes = report
        .handle
        .bytes()
        .ok_or_else(|| anyhow!("Output artifact was released before it could be written"))?;
    write_artifact(output_path, &bytes, policy)?;

    let clock = TimeParser::new();
    if json {
        let summary = json!({
            "output": output_path,
            "artifact": {
                "id": report.handle.id,
                "job_id": report.handle.job_id,
                "created_at": report.handle.created_at,
            },
            "size_bytes": report.size_bytes,
            "target_bytes": config.conversion.target_bytes,
            "window": report.window,
            "analysis": report.analysis,
            "final_plan": report.final_plan,
            "attempts": report.attempts,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Output:    {}", output_path.display());
        println!(
            "Range:     {} - {}",
            clock.format_clock(report.window.start_seconds),
            clock.format_clock(report.window.end_seconds)
        );
        println!(
            "Size:      {} (budget {})",
            format_file_size(report.size_bytes),
            format_file_size(config.conversion.target_bytes)
        );
        for attempt in &report.attempts {
            println!(
                "Attempt {}: {} bps -> {} bytes",
                attempt.attempt, attempt.video_bitrate_bps, attempt.size_bytes
            );
        }
    }

    Ok(())
}

/// Execute the inspect command
pub async fn inspect(args: InspectArgs, config: AppConfig) -> Result<()> {
    ensure_input(&args.input)?;

    let container = DefaultAppContainer::new(&config);
    let analysis = container
        .inspect_interactor()
        .inspect(&SourceHandle::new(&args.input))
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&args.input, &analysis);
    }
    Ok(())
}

/// Execute the plan command
pub async fn plan(args: PlanArgs, mut config: AppConfig) -> Result<()> {
    if let Some(target_bytes) = args.target_bytes {
        config.conversion.target_bytes = target_bytes;
    }
    config.validate()?;
    ensure_input(&args.input)?;

    let container = DefaultAppContainer::new(&config);
    let preview = container
        .inspect_interactor()
        .plan(
            &SourceHandle::new(&args.input),
            args.start.as_deref().unwrap_or_default(),
            args.end.as_deref().unwrap_or_default(),
        )
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
    } else {
        print_analysis(&args.input, &preview.analysis);
        print_plan(&preview);
    }
    Ok(())
}

fn ensure_input(input: &Path) -> Result<()> {
    let metadata = std::fs::metadata(input)
        .with_context(|| format!("Input file does not exist: {}", input.display()))?;
    if !metadata.is_file() {
        bail!("Input is not a file: {}", input.display());
    }
    Ok(())
}

fn print_status(status: &ConversionStatus) {
    match status {
        ConversionStatus::Idle => {}
        other => eprintln!("[trimfit] {}", other),
    }
}

fn print_analysis(input: &Path, analysis: &AnalysisResult) {
    println!("File:      {}", input.display());
    println!(
        "Display:   {}x{} ({})",
        analysis.display_width,
        analysis.display_height,
        if analysis.is_landscape() {
            "landscape"
        } else {
            "portrait"
        }
    );
    println!("Frame rate: {:.2} fps", analysis.estimated_fps);
    println!("Audio:     {}", if analysis.has_audio { "yes" } else { "no" });
}

fn print_plan(preview: &PlanPreview) {
    let clock = TimeParser::new();
    let breakdown = &preview.breakdown;

    println!(
        "Range:     {} - {} ({:.2}s)",
        clock.format_clock(preview.window.start_seconds),
        clock.format_clock(preview.window.end_seconds),
        breakdown.duration_seconds
    );
    println!("Budget:    {}", format_file_size(preview.target_bytes));
    println!("  overhead {} bytes", breakdown.overhead_bytes);
    println!("  audio    {} bytes", breakdown.audio_bytes);
    println!("  video    {} bytes", breakdown.video_bytes);
    println!("Video:     {} bps", preview.plan.video_bitrate_bps);
    println!("Bits/pixel: {:.4}", breakdown.bits_per_pixel);
    match (preview.plan.target_width(), preview.plan.target_height()) {
        (Some(width), _) => println!("Scale:     width {}", width),
        (_, Some(height)) => println!("Scale:     height {}", height),
        _ => println!("Scale:     source size"),
    }
    match preview.plan.audio {
        Some(audio) => println!(
            "Audio:     {} ch @ {} bps",
            audio.channel_count, audio.bitrate_bps
        ),
        None => println!("Audio:     none"),
    }
}
