//! Decoder warm-up windows around cuts.
//!
//! Near a cut between two contiguous groups the preview renderer keeps the
//! neighbouring clip's decoder alive so the switch does not stall. The
//! window is shorter for high-resolution sources to bound the number of
//! concurrent decode streams. Export renders frames independently and never
//! needs a window.

use clipcam_project_model::project::RecordingLookup;
use serde::Serialize;

use crate::layout::{FrameLayout, FrameLayoutItem};

/// Minimum overlap window, in frames.
pub const MIN_OVERLAP_FRAMES: i64 = 8;

/// Overlap window for sources taller than 1080 px.
pub const HIGH_RES_OVERLAP_SECS: f64 = 0.35;

/// Overlap window for everything else.
pub const DEFAULT_OVERLAP_SECS: f64 = 0.5;

/// Caller state that may affect overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlapContext {
    /// Export render: no overlap at all.
    pub is_rendering: bool,
    /// Interactive scrubbing. Overlap is computed the same way as playback.
    pub is_scrubbing: bool,
}

/// Which neighbouring decoders to keep warm at a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoundaryOverlapState {
    pub active_index: Option<usize>,
    /// Previous item on the same track, if any.
    pub previous_index: Option<usize>,
    /// Next item on the same track, if any.
    pub next_index: Option<usize>,
    /// Keep the previous clip's decoder alive just after a cut.
    pub hold_previous: bool,
    /// Start the next clip's decoder just before a cut.
    pub prewarm_next: bool,
    /// Window size used, in frames (0 when suppressed).
    pub overlap_frames: i64,
}

/// Overlap window in frames for a source of the given height.
pub fn overlap_window_frames(fps: f64, source_height: u32) -> i64 {
    if fps <= 0.0 {
        return MIN_OVERLAP_FRAMES;
    }
    let secs = if source_height > 1080 {
        HIGH_RES_OVERLAP_SECS
    } else {
        DEFAULT_OVERLAP_SECS
    };
    ((secs * fps).round() as i64).max(MIN_OVERLAP_FRAMES)
}

/// Compute overlap state for `frame`, whose active item is `active_index`.
pub fn compute_boundary_overlap<L>(
    layout: &FrameLayout,
    frame: i64,
    active_index: Option<usize>,
    recordings: &L,
    context: OverlapContext,
) -> BoundaryOverlapState
where
    L: RecordingLookup + ?Sized,
{
    let Some(index) = active_index.filter(|i| *i < layout.len()) else {
        return BoundaryOverlapState::default();
    };
    let current = &layout[index];
    let previous_index = same_track_neighbour(layout, index, Direction::Back);
    let next_index = same_track_neighbour(layout, index, Direction::Forward);

    let mut state = BoundaryOverlapState {
        active_index: Some(index),
        previous_index,
        next_index,
        ..Default::default()
    };
    if context.is_rendering {
        return state;
    }

    let height_of = |item: &FrameLayoutItem| {
        recordings
            .get_recording(&item.clip.recording_id)
            .map(|r| r.height)
            .unwrap_or(0)
    };
    let current_height = height_of(current);

    if let Some(prev) = previous_index.map(|i| &layout[i]) {
        let window = overlap_window_frames(layout.fps(), current_height.max(height_of(prev)));
        state.overlap_frames = state.overlap_frames.max(window);
        state.hold_previous = is_cut(prev, current) && frame - current.start_frame < window;
    }

    if let Some(next) = next_index.map(|i| &layout[i]) {
        let window = overlap_window_frames(layout.fps(), current_height.max(height_of(next)));
        state.overlap_frames = state.overlap_frames.max(window);
        state.prewarm_next = is_cut(current, next) && current.end_frame - frame <= window;
    }

    state
}

enum Direction {
    Back,
    Forward,
}

fn same_track_neighbour(layout: &FrameLayout, index: usize, direction: Direction) -> Option<usize> {
    let track = layout[index].track_index;
    match direction {
        Direction::Back => (0..index).rev().find(|&i| layout[i].track_index == track),
        Direction::Forward => (index + 1..layout.len()).find(|&i| layout[i].track_index == track),
    }
}

/// A decoder switch happens between adjacent items of different groups.
fn is_cut(before: &FrameLayoutItem, after: &FrameLayoutItem) -> bool {
    before.group_id != after.group_id && after.start_frame - before.end_frame <= 1
}
