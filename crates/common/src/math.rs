//! Temporal geometry primitives.
//!
//! Pure math leaves used by layout, telemetry and camera code. Nothing in
//! here allocates or logs.

use serde::{Deserialize, Serialize};

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f64::clamp` this never panics: when `min > max` the midpoint of
/// the inverted range is returned.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if min > max {
        return (min + max) * 0.5;
    }
    value.max(min).min(max)
}

pub fn clamp01(value: f64) -> f64 {
    clamp(value, 0.0, 1.0)
}

/// Linear interpolation; `t` is not clamped.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Inverse of [`lerp`], clamped to `[0, 1]`. A zero-length range yields 1.
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    let span = b - a;
    if span.abs() < f64::EPSILON {
        return 1.0;
    }
    clamp01((value - a) / span)
}

/// Easing curve selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

impl EasingFunction {
    /// Apply the curve to a progress value in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = clamp01(t);
        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseIn => t * t * t,
            EasingFunction::EaseOut => 1.0 - (1.0 - t).powi(3),
            EasingFunction::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Index of the last element whose key is `<= target`, or `None` if every
/// key is greater. `items` must be sorted by `key`.
pub fn last_index_at_or_before<T>(items: &[T], target: f64, key: impl Fn(&T) -> f64) -> Option<usize> {
    let idx = items.partition_point(|item| key(item) <= target);
    idx.checked_sub(1)
}

/// Index of the first element whose key is `>= target` (may equal `len`).
pub fn first_index_at_or_after<T>(items: &[T], target: f64, key: impl Fn(&T) -> f64) -> usize {
    items.partition_point(|item| key(item) < target)
}
