//! Cursor velocity and stop detection.

use clipcam_common::config::VelocityConfig;
use clipcam_common::math::last_index_at_or_before;
use clipcam_project_model::event::MouseEvent;
use serde::Serialize;

/// Pointer velocity at a query time, in source pixels per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CursorVelocity {
    pub velocity: f64,
    pub vx: f64,
    pub vy: f64,
    /// Time (ms) since which the pointer has been still, if it is still.
    pub stopped_since_ms: Option<f64>,
}

impl CursorVelocity {
    pub fn is_stopped(&self) -> bool {
        self.stopped_since_ms.is_some()
    }

    fn stopped_at(time_ms: f64) -> Self {
        Self {
            stopped_since_ms: Some(time_ms),
            ..Default::default()
        }
    }
}

/// Velocity over the lookback window ending at `time_ms`.
///
/// With fewer than two samples in the window, or when every sample stays
/// within the jitter threshold of the first one on both axes, the pointer is
/// reported as stopped. Before the first event it is stopped at `time_ms`.
/// `events` must be sorted by time.
pub fn calculate_cursor_velocity(
    events: &[MouseEvent],
    time_ms: f64,
    config: &VelocityConfig,
) -> CursorVelocity {
    let Some(last) = last_index_at_or_before(events, time_ms, |e| e.timestamp) else {
        return CursorVelocity::stopped_at(time_ms);
    };

    let window_start = time_ms - config.lookback_ms;
    let mut first = last;
    while first > 0 && events[first - 1].timestamp >= window_start {
        first -= 1;
    }
    if events[first].timestamp < window_start {
        // Even the latest sample is older than the window.
        return CursorVelocity::stopped_at(events[last].timestamp);
    }

    let window = &events[first..=last];
    if window.len() < 2 {
        return CursorVelocity::stopped_at(window[0].timestamp);
    }

    let origin = window[0];
    let jitter = config.jitter_threshold_px;
    let still = window
        .iter()
        .all(|e| (e.x - origin.x).abs() <= jitter && (e.y - origin.y).abs() <= jitter);
    if still {
        return CursorVelocity::stopped_at(origin.timestamp);
    }

    let end = window[window.len() - 1];
    let dt_secs = (end.timestamp - origin.timestamp) / 1000.0;
    if dt_secs <= 0.0 {
        return CursorVelocity::stopped_at(origin.timestamp);
    }

    let vx = (end.x - origin.x) / dt_secs;
    let vy = (end.y - origin.y) / dt_secs;
    CursorVelocity {
        velocity: vx.hypot(vy),
        vx,
        vy,
        stopped_since_ms: None,
    }
}
