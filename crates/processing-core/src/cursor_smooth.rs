//! Cursor position interpolation and exponential smoothing.
//!
//! Smoothing here is a pure function of `(events, time)`: it samples the
//! raw stream over a short lookback window and takes an exponentially
//! weighted average. Frames rendered in any order get the same answer,
//! which a running low-pass filter cannot guarantee.

use clipcam_common::config::SmoothingConfig;
use clipcam_common::math::{clamp01, last_index_at_or_before, lerp};
use clipcam_project_model::event::MouseEvent;
use clipcam_project_model::viewport::Point2D;

use crate::cache::{SmoothingKey, TelemetryCaches};

/// Raw pointer position (source pixels) at `time_ms`, linearly interpolated
/// between the surrounding samples and held at the stream ends.
pub fn interpolate_mouse_position(events: &[MouseEvent], time_ms: f64) -> Option<(f64, f64)> {
    let first = events.first()?;
    let Some(index) = last_index_at_or_before(events, time_ms, |e| e.timestamp) else {
        return Some((first.x, first.y));
    };

    let a = events[index];
    let Some(b) = events.get(index + 1) else {
        return Some((a.x, a.y));
    };

    let span = b.timestamp - a.timestamp;
    if span < 1e-6 {
        return Some((a.x, a.y));
    }
    let t = (time_ms - a.timestamp) / span;
    Some((lerp(a.x, b.x, t), lerp(a.y, b.y, t)))
}

/// Exponentially weighted cursor position at `time_ms`, normalized to the
/// recording size.
///
/// `config.steps` samples are taken evenly across the window ending at
/// `time_ms`; a sample `age` ms old is weighted by `exp(-age / tau)`.
pub fn smoothed_cursor_position(
    events: &[MouseEvent],
    time_ms: f64,
    width: u32,
    height: u32,
    config: &SmoothingConfig,
) -> Option<Point2D> {
    if events.is_empty() || width == 0 || height == 0 {
        return None;
    }

    let steps = config.steps.max(1);
    let (x, y) = if steps == 1 || config.tau_ms <= 0.0 || config.window_ms <= 0.0 {
        interpolate_mouse_position(events, time_ms)?
    } else {
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut total_weight = 0.0;
        for i in 0..steps {
            let age = config.window_ms * (1.0 - i as f64 / (steps - 1) as f64);
            let Some((px, py)) = interpolate_mouse_position(events, time_ms - age) else {
                continue;
            };
            let weight = (-age / config.tau_ms).exp();
            sum_x += px * weight;
            sum_y += py * weight;
            total_weight += weight;
        }
        if total_weight <= 0.0 {
            return None;
        }
        (sum_x / total_weight, sum_y / total_weight)
    };

    Some(Point2D::new(
        clamp01(x / width as f64),
        clamp01(y / height as f64),
    ))
}

/// [`smoothed_cursor_position`] through the smoothing cache.
///
/// `stream_id` names the recording `events` came from; entries are never
/// shared across ids.
pub fn smoothed_cursor_position_cached(
    caches: &TelemetryCaches,
    stream_id: &str,
    events: &[MouseEvent],
    time_ms: f64,
    width: u32,
    height: u32,
    config: &SmoothingConfig,
) -> Option<Point2D> {
    let key = SmoothingKey::new(stream_id, events, time_ms, (width, height), config);
    caches.smoothing.get_or_insert_with(key, || {
        smoothed_cursor_position(events, time_ms, width, height, config)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> Vec<MouseEvent> {
        vec![
            MouseEvent::new(0.0, 0.0, 0.0),
            MouseEvent::new(1000.0, 1000.0, 500.0),
            MouseEvent::new(2000.0, 1000.0, 500.0),
        ]
    }

    #[test]
    fn test_interpolation() {
        let events = stream();
        assert_eq!(interpolate_mouse_position(&events, 500.0), Some((500.0, 250.0)));
        assert_eq!(interpolate_mouse_position(&events, -10.0), Some((0.0, 0.0)));
        assert_eq!(interpolate_mouse_position(&events, 9000.0), Some((1000.0, 500.0)));
        assert_eq!(interpolate_mouse_position(&[], 0.0), None);
    }

    #[test]
    fn test_still_cursor_smooths_to_itself() {
        let events = stream();
        let p = smoothed_cursor_position(&events, 2000.0, 2000, 1000, &SmoothingConfig::default())
            .unwrap();
        assert!((p.x - 0.5).abs() < 1e-12);
        assert!((p.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_smoothing_lags_motion() {
        let events = stream();
        let raw = interpolate_mouse_position(&events, 800.0).unwrap();
        let smoothed =
            smoothed_cursor_position(&events, 800.0, 2000, 1000, &SmoothingConfig::default())
                .unwrap();
        // Moving right, the weighted past pulls the result left of raw.
        assert!(smoothed.x < raw.0 / 2000.0);
        assert!(smoothed.x > (raw.0 - 600.0) / 2000.0);
    }

    #[test]
    fn test_result_independent_of_query_order() {
        let events = stream();
        let config = SmoothingConfig::default();
        let caches = TelemetryCaches::default();
        let times = [900.0, 100.0, 1500.0, 100.0, 900.0];

        let forward: Vec<_> = times
            .iter()
            .map(|&t| smoothed_cursor_position_cached(&caches, "rec", &events, t, 2000, 1000, &config))
            .collect();
        let fresh: Vec<_> = times
            .iter()
            .rev()
            .map(|&t| smoothed_cursor_position(&events, t, 2000, 1000, &config))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        assert_eq!(forward, fresh);
        assert_eq!(caches.smoothing.len(), 3);
    }

    #[test]
    fn test_cache_keeps_recordings_with_equal_edges_apart() {
        let config = SmoothingConfig::default();
        let caches = TelemetryCaches::default();
        let left = vec![MouseEvent::new(0.0, 200.0, 200.0), MouseEvent::new(5000.0, 200.0, 200.0)];
        let right = vec![MouseEvent::new(0.0, 1700.0, 900.0), MouseEvent::new(5000.0, 1700.0, 900.0)];

        let a = smoothed_cursor_position_cached(&caches, "rec-a", &left, 2500.0, 1920, 1080, &config)
            .unwrap();
        let b = smoothed_cursor_position_cached(&caches, "rec-b", &right, 2500.0, 1920, 1080, &config)
            .unwrap();
        assert!((a.x - 200.0 / 1920.0).abs() < 1e-12);
        assert!((b.x - 1700.0 / 1920.0).abs() < 1e-12);
        assert_eq!(caches.smoothing.len(), 2);
    }

    #[test]
    fn test_degenerate_inputs() {
        let config = SmoothingConfig::default();
        assert!(smoothed_cursor_position(&[], 0.0, 100, 100, &config).is_none());
        assert!(smoothed_cursor_position(&stream(), 0.0, 0, 100, &config).is_none());
    }
}
