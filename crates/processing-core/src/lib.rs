//! Clipcam Processing Core — telemetry analysis and the virtual camera.
//!
//! - **Telemetry:** cursor velocity, exponential position smoothing, motion
//!   clusters, and zoom-block detection from recorded input events
//! - **Camera:** spring-damped physics with dead zone, visibility clamping,
//!   and overscan-aware output framing
//! - **Caches:** bounded LRU caches for analysis results, injected by the
//!   caller
//!
//! This crate is pure computation — no I/O, no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod cache;
pub mod camera;
pub mod cursor_smooth;
pub mod cursor_velocity;
pub mod framing;
pub mod motion_cluster;
pub mod visibility;
pub mod zoom_detect;

pub use cache::{AnalysisCache, TelemetryCaches};
pub use camera::{step, CameraInput, CameraPhysicsState, CameraTransform, ZoomTarget};
pub use cursor_smooth::{interpolate_mouse_position, smoothed_cursor_position, smoothed_cursor_position_cached};
pub use cursor_velocity::{calculate_cursor_velocity, CursorVelocity};
pub use framing::{compute_output_framing, OutputFraming};
pub use motion_cluster::{detect_motion_clusters, detect_motion_clusters_cached, MotionCluster};
pub use visibility::{clamp_center, clamp_to_content, clamp_to_cursor, CursorGlyph};
pub use zoom_detect::{detect_zoom_blocks, detect_zoom_blocks_cached, ZoomBlock, ZoomDetectionConfig, ZoomReason};
