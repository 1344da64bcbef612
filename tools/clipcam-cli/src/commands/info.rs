//! Show project information.

use std::path::PathBuf;

use clipcam_project_model::effect::EffectKind;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let project = super::load_project(&path)?;
    let settings = &project.settings;

    println!("Project: {}", project.name);
    println!("  ID: {}", project.id);
    println!("  Output: {}x{} @ {}fps", settings.width, settings.height, settings.fps);
    println!(
        "  Camera: stiffness {}, damping {} (critical {:.1}), mass {}",
        settings.camera.stiffness,
        settings.camera.damping,
        settings.camera.critical_damping(),
        settings.camera.mass
    );
    println!();

    println!("Recordings:");
    for recording in &project.recordings {
        let events = recording
            .metadata
            .as_ref()
            .map(|m| m.mouse_events.len() + m.click_events.len() + m.keyboard_events.len() + m.scroll_events.len())
            .unwrap_or(0);
        println!(
            "  {}: {}x{}, {:.1}s, {:?}, {} events",
            recording.id,
            recording.width,
            recording.height,
            recording.duration / 1000.0,
            recording.source_type,
            events
        );
    }
    println!();

    println!("Tracks:");
    for (i, track) in project.tracks.iter().enumerate() {
        let end = track.clips.iter().map(|c| c.end_time()).fold(0.0, f64::max);
        println!("  [{i}] {}: {} clips, ends at {:.1}s", track.id, track.clips.len(), end / 1000.0);
    }
    println!();

    println!("Effects:");
    for kind in EffectKind::ALL {
        let count = project.effects.iter().filter(|e| e.kind() == kind).count();
        if count > 0 {
            println!("  {kind:?}: {count}");
        }
    }

    let problems = project.validate();
    if !problems.is_empty() {
        println!();
        println!("Validation:");
        for problem in &problems {
            println!("  {problem}");
        }
    }

    Ok(())
}
