//! Clipcam Common Utilities
//!
//! Shared infrastructure for all Clipcam crates:
//! - Error types and result aliases
//! - Frame clock: validated frame rates and ms/frame conversion
//! - Temporal geometry: clamp, lerp, easing, and binary-search primitives
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod math;

pub use clock::*;
pub use config::*;
pub use error::*;
