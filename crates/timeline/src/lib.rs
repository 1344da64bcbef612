//! Clipcam Timeline — frame-indexed resolution of clips and effects.
//!
//! - **Layout:** Convert ordered clips into frame ranges and detect
//!   contiguous playback groups
//! - **Resolver:** Binary-search lookups for what is active at a frame
//! - **Boundary:** Decoder pre-warm windows around cuts
//! - **Effects:** Per-frame effect selection and inheritance onto
//!   generated overlay clips
//!
//! Everything here is a pure function of its inputs. No I/O, no caches.

pub mod boundary;
pub mod effects;
pub mod layout;
pub mod resolver;

pub use boundary::{compute_boundary_overlap, overlap_window_frames, BoundaryOverlapState, OverlapContext};
pub use effects::{
    resolve_active_effects, resolve_effective_clip_data, resolve_effective_layers,
    EffectiveClipData, ResolvedEffects,
};
pub use layout::{build_frame_layout, build_multi_track_layout, try_build_frame_layout, FrameLayout, FrameLayoutItem, GroupId};
pub use resolver::{
    find_active_frame_layout_index, find_active_frame_layout_indices, find_active_frame_layout_item,
    find_active_frame_layout_items,
};
