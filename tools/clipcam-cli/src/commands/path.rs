//! Build the full camera path for a project.

use std::path::PathBuf;

use clipcam_common::config::AppConfig;
use clipcam_processing_core::cache::TelemetryCaches;
use clipcam_project_model::event::RecordingMetadata;
use clipcam_render_engine::{calculate_full_camera_path, SnapshotContext};
use clipcam_timeline::boundary::OverlapContext;
use clipcam_timeline::layout::build_multi_track_layout;

pub fn run(
    config: &AppConfig,
    path: PathBuf,
    events: Vec<String>,
    output: Option<PathBuf>,
    frame: Option<i64>,
) -> anyhow::Result<()> {
    let mut project = super::load_project(&path)?;

    for spec in &events {
        let (recording_id, events_path) = spec
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected <RECORDING_ID>=<PATH>, got {spec}"))?;
        let recording = project
            .recordings
            .iter_mut()
            .find(|r| r.id == recording_id)
            .ok_or_else(|| anyhow::anyhow!("Unknown recording: {recording_id}"))?;
        let parsed = super::load_events(&PathBuf::from(events_path))?;
        let mut metadata = RecordingMetadata::from_events(&parsed);
        metadata.sort_by_time();
        println!("  Attached {} events to {recording_id}", parsed.len());
        recording.metadata = Some(metadata);
    }

    let layout = build_multi_track_layout(&project.tracks, project.settings.fps);
    let caches = TelemetryCaches::new(&config.cache);
    let context = SnapshotContext {
        layout: &layout,
        effects: &project.effects,
        recordings: &project,
        output_width: project.settings.width,
        output_height: project.settings.height,
        camera: &project.settings.camera,
        smoothing: &config.smoothing,
        caches: &caches,
        overlap: OverlapContext {
            is_rendering: true,
            is_scrubbing: false,
        },
    };

    let Some(camera_path) = calculate_full_camera_path(&context) else {
        println!("Project has no clips; nothing to render.");
        return Ok(());
    };

    let zoomed = camera_path.iter().filter(|s| !s.camera.is_identity()).count();
    println!(
        "Camera path: {} frames @ {}fps, {} with an active camera",
        camera_path.len(),
        project.settings.fps,
        zoomed
    );

    if let Some(frame) = frame {
        let snapshot = camera_path
            .get(frame)
            .ok_or_else(|| anyhow::anyhow!("Frame {frame} is outside 0..{}", camera_path.len()))?;
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    }

    if let Some(output) = output {
        let json = serde_json::to_string(&camera_path)?;
        std::fs::write(&output, json)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", output.display()))?;
        println!("  Wrote {}", output.display());
    }

    Ok(())
}
