//! Active-item lookups by frame.
//!
//! All lookups are binary searches over `start_frame`. Boundary ownership
//! goes to the item that starts at a frame, never the one ending there.

use crate::layout::{FrameLayout, FrameLayoutItem};

/// Index of the item to show at `frame`.
///
/// Returns the last item with `start_frame <= frame` when it covers the
/// frame. If the frame lands in a gap, before the first item, or past the
/// end, the nearest item is returned instead: playback should show a
/// plausible frame rather than black. `None` only for an empty layout.
pub fn find_active_frame_layout_index(layout: &FrameLayout, frame: i64) -> Option<usize> {
    let items = layout.items();
    if items.is_empty() {
        return None;
    }

    let upper = items.partition_point(|item| item.start_frame <= frame);
    if upper == 0 {
        return Some(0);
    }

    let candidate = upper - 1;
    let item = &items[candidate];
    if item.start_frame == frame || frame < item.end_frame {
        return Some(candidate);
    }

    // An earlier, longer item (another track) may still cover the frame.
    let mut i = candidate;
    while i > 0 && layout.reach(i - 1) > frame {
        i -= 1;
        if items[i].contains(frame) {
            return Some(i);
        }
    }

    tracing::debug!(frame, "Frame outside every layout item, using nearest");
    Some(nearest_index(items, candidate, frame))
}

/// The item at [`find_active_frame_layout_index`].
pub fn find_active_frame_layout_item(layout: &FrameLayout, frame: i64) -> Option<&FrameLayoutItem> {
    find_active_frame_layout_index(layout, frame).map(|i| &layout[i])
}

/// Indices of every item whose range contains `frame`, in layout order
/// (bottom track first on shared start frames).
///
/// Cost is bounded by the number of overlapping items, not the layout size.
pub fn find_active_frame_layout_indices(layout: &FrameLayout, frame: i64) -> Vec<usize> {
    let items = layout.items();
    let mut i = items.partition_point(|item| item.start_frame <= frame);
    let mut active = vec![];

    while i > 0 && layout.reach(i - 1) > frame {
        i -= 1;
        if frame < items[i].end_frame {
            active.push(i);
        }
    }

    active.reverse();
    active
}

/// Every item whose range contains `frame`.
pub fn find_active_frame_layout_items(layout: &FrameLayout, frame: i64) -> Vec<&FrameLayoutItem> {
    find_active_frame_layout_indices(layout, frame)
        .into_iter()
        .map(|i| &layout[i])
        .collect()
}

/// `candidate` ends at or before `frame`; pick between it and its successor.
fn nearest_index(items: &[FrameLayoutItem], candidate: usize, frame: i64) -> usize {
    let behind = frame - (items[candidate].end_frame - 1);
    match items.get(candidate + 1) {
        Some(next) if next.start_frame - frame < behind => candidate + 1,
        _ => candidate,
    }
}
