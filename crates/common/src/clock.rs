//! Frame clock utilities.
//!
//! Timeline positions are authored in milliseconds but resolved in frames.
//! Every conversion in Clipcam goes through this module so that layout,
//! effect resolution and the camera path all agree on the same rounding:
//! `frame = round(ms * fps / 1000)`.

use serde::{Deserialize, Serialize};

use crate::error::{ClipcamError, ClipcamResult};

/// A validated, strictly positive and finite frame rate.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FrameRate(f64);

impl FrameRate {
    /// Validate a raw frames-per-second value.
    pub fn new(fps: f64) -> ClipcamResult<Self> {
        if fps.is_finite() && fps > 0.0 {
            Ok(Self(fps))
        } else {
            Err(ClipcamError::InvalidFrameRate { fps })
        }
    }

    /// Frames per second.
    pub fn fps(self) -> f64 {
        self.0
    }

    /// Duration of a single frame in milliseconds.
    pub fn frame_duration_ms(self) -> f64 {
        1000.0 / self.0
    }

    /// Convert milliseconds to the nearest frame index.
    pub fn ms_to_frame(self, ms: f64) -> i64 {
        ms_to_frame(ms, self.0)
    }

    /// Convert a frame index to its start time in milliseconds.
    pub fn frame_to_ms(self, frame: i64) -> f64 {
        frame_to_ms(frame, self.0)
    }
}

impl TryFrom<f64> for FrameRate {
    type Error = ClipcamError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FrameRate> for f64 {
    fn from(value: FrameRate) -> Self {
        value.0
    }
}

/// `round(ms * fps / 1000)`. Callers must pass a positive fps.
pub fn ms_to_frame(ms: f64, fps: f64) -> i64 {
    (ms * fps / 1000.0).round() as i64
}

/// Start time of `frame` in milliseconds.
pub fn frame_to_ms(frame: i64, fps: f64) -> f64 {
    frame as f64 * 1000.0 / fps
}
