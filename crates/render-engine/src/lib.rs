//! Clipcam Render Engine
//!
//! Composition root of the timeline engine. Combines frame layout, effect
//! resolution, telemetry analysis, and camera physics into one
//! [`FrameSnapshot`] per output frame.
//!
//! # Pipeline Architecture
//!
//! ```text
//! clips ──── Frame Layout ──── Active Item ──┐
//!                                            ├── Effect Resolution
//! effects ───────────────────────────────────┘         │
//!                                                      ├── Output Framing
//! events.jsonl ── Cursor Smoothing ──┐                 │
//!                                    └──── Camera Step ┘
//!                                               │
//!                                               ▼
//!                                         FrameSnapshot
//! ```
//!
//! Export builds the whole path once with [`calculate_full_camera_path`]
//! and indexes into it; preview steps live with [`PreviewCamera`].

pub mod camera_path;
pub mod snapshot;

pub use camera_path::{calculate_full_camera_path, CameraPath, PlaybackMode, PreviewCamera};
pub use snapshot::{ClipSnapshot, FrameInputs, FrameSnapshot, SnapshotContext};
