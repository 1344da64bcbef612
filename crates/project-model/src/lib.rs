//! Clipcam Project Model
//!
//! Defines the data contracts the timeline engine consumes:
//! - **Events:** Recording-relative mouse, click, keyboard and scroll telemetry
//! - **Effects:** A flat list of time-ranged, type-tagged effects
//! - **Project:** Recordings, clips, tracks, and output settings
//! - **Viewport:** Normalized camera windows and pixel-space rectangles
//!
//! Timeline positions are in milliseconds. Telemetry coordinates are in
//! recording pixels; camera targets are normalized to `[0.0, 1.0]`.

pub mod effect;
pub mod event;
pub mod project;
pub mod viewport;

pub use effect::*;
pub use event::*;
pub use project::*;
pub use viewport::*;
