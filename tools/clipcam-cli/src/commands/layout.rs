//! Show the frame layout of a project.

use std::path::PathBuf;

use clipcam_timeline::layout::build_multi_track_layout;
use clipcam_timeline::resolver::{find_active_frame_layout_index, find_active_frame_layout_indices};

pub fn run(path: PathBuf, fps: Option<f64>, frame: Option<i64>) -> anyhow::Result<()> {
    let project = super::load_project(&path)?;
    let fps = fps.unwrap_or(project.settings.fps);
    if !(fps.is_finite() && fps > 0.0) {
        anyhow::bail!("Frame rate must be positive, got {fps}");
    }

    let layout = build_multi_track_layout(&project.tracks, fps);
    println!("Layout: {} items, {} frames @ {fps}fps", layout.len(), layout.total_frames());
    println!();

    println!(
        "  {:>3}  {:>5}  {:<16} {:<16} {:>8} {:>8}  {:>5} {:>8}",
        "#", "track", "clip", "recording", "start", "end", "group", "span"
    );
    for (i, item) in layout.iter().enumerate() {
        println!(
            "  {:>3}  {:>5}  {:<16} {:<16} {:>8} {:>8}  {:>5} {:>8}",
            i,
            item.track_index,
            item.clip.id,
            item.clip.recording_id,
            item.start_frame,
            item.end_frame,
            item.group_id,
            item.group_duration,
        );
    }

    if let Some(frame) = frame {
        println!();
        match find_active_frame_layout_index(&layout, frame) {
            Some(index) => println!("Frame {frame}: active item {index} ({})", layout[index].clip.id),
            None => println!("Frame {frame}: no active item"),
        }
        let layers = find_active_frame_layout_indices(&layout, frame);
        if layers.len() > 1 {
            println!("  Layers (bottom first): {layers:?}");
        }
    }

    Ok(())
}
