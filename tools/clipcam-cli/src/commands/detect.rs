//! Detect zoom blocks in a telemetry log.

use std::path::PathBuf;

use clipcam_common::config::{AppConfig, ZoomDetectionSettings};
use clipcam_processing_core::zoom_detect::{detect_zoom_blocks, ZoomDetectionConfig};
use clipcam_project_model::event::RecordingMetadata;

pub struct DetectArgs {
    pub events: PathBuf,
    pub width: u32,
    pub height: u32,
    pub start_ms: f64,
    pub end_ms: Option<f64>,
    pub max_per_minute: Option<f64>,
    pub min_gap_ms: Option<f64>,
    pub clip_id: Option<String>,
}

pub fn run(config: &AppConfig, args: DetectArgs) -> anyhow::Result<()> {
    let events = super::load_events(&args.events)?;
    let mut telemetry = RecordingMetadata::from_events(&events);
    telemetry.sort_by_time();

    let end_ms = args
        .end_ms
        .unwrap_or_else(|| events.iter().map(|e| e.timestamp).fold(0.0, f64::max));
    if end_ms <= args.start_ms {
        anyhow::bail!("Empty source range {}..{end_ms} ms", args.start_ms);
    }

    // Command-line flags sit above the config file, which sits above the
    // generation defaults.
    let cli_settings = ZoomDetectionSettings {
        max_zooms_per_minute: args.max_per_minute,
        min_gap_ms: args.min_gap_ms,
        ..Default::default()
    };
    let detection = ZoomDetectionConfig::default()
        .with_overrides(&config.zoom_detection)
        .with_overrides(&cli_settings);

    let blocks = detect_zoom_blocks(
        &telemetry,
        args.start_ms..end_ms,
        (args.width, args.height),
        &detection,
    );
    tracing::info!(events = events.len(), blocks = blocks.len(), "Zoom detection finished");

    if let Some(clip_id) = args.clip_id {
        let effects: Vec<_> = blocks
            .iter()
            .enumerate()
            .map(|(i, block)| block.to_effect(format!("auto-zoom-{}", i + 1), clip_id.clone()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&effects)?);
        return Ok(());
    }

    println!(
        "Detected {} zoom blocks in {:.1}s of telemetry",
        blocks.len(),
        (end_ms - args.start_ms) / 1000.0
    );
    for block in &blocks {
        println!(
            "  {:>8.0} - {:>8.0} ms  {:.2}x at ({:.3}, {:.3})  {:?}",
            block.start_time, block.end_time, block.scale, block.target_x, block.target_y, block.reason
        );
    }

    Ok(())
}
