//! Camera visibility clamping.
//!
//! All values are normalized to the source frame. A camera at zoom `scale`
//! shows a window of half-size `0.5 / scale` around its center. Overscan
//! lets the window extend past the content edges by a per-edge margin.

use clipcam_common::math::clamp;
use clipcam_project_model::effect::CursorEffectData;
use clipcam_project_model::viewport::{Insets, Point2D};
use serde::Serialize;

/// Half the visible window at `scale`.
pub fn half_window(scale: f64) -> f64 {
    0.5 / scale.max(1e-6)
}

/// Allowed center range on one axis: `[lo - overscan_lo + half, hi + overscan_hi - half]`.
/// May be inverted when the window is larger than the content.
pub fn center_range(half: f64, overscan_lo: f64, overscan_hi: f64) -> (f64, f64) {
    (half - overscan_lo, 1.0 + overscan_hi - half)
}

/// Clamp into `[min_center, max_center]`; the midpoint when the range is
/// inverted.
pub fn clamp_center(center: f64, min_center: f64, max_center: f64) -> f64 {
    clamp(center, min_center, max_center)
}

/// Clamp a camera center so the window never shows past the content plus
/// overscan.
pub fn clamp_to_content(center: Point2D, scale: f64, overscan: &Insets) -> Point2D {
    let half = half_window(scale);
    let (min_x, max_x) = center_range(half, overscan.left, overscan.right);
    let (min_y, max_y) = center_range(half, overscan.top, overscan.bottom);
    Point2D::new(
        clamp_center(center.x, min_x, max_x),
        clamp_center(center.y, min_y, max_y),
    )
}

/// Cursor glyph extent, normalized to the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CursorGlyph {
    pub width: f64,
    pub height: f64,
    /// Offset from the glyph's top-left to its hotspot.
    pub hotspot_x: f64,
    pub hotspot_y: f64,
}

impl CursorGlyph {
    pub fn from_effect(data: &CursorEffectData, source_width: u32, source_height: u32) -> Self {
        let sw = source_width.max(1) as f64;
        let sh = source_height.max(1) as f64;
        let size = data.size.max(0.0);
        Self {
            width: data.glyph_width * size / sw,
            height: data.glyph_height * size / sh,
            hotspot_x: data.hotspot_x * size / sw,
            hotspot_y: data.hotspot_y * size / sh,
        }
    }
}

/// Result of a cursor-aware clamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorClamp {
    pub center: Point2D,
    /// Whether the whole glyph fits in the window. When false the center
    /// was clamped to content bounds only.
    pub glyph_visible: bool,
}

/// Clamp a camera center so the full cursor glyph stays visible, then to
/// the content bounds.
///
/// When the glyph cannot fit together with the content constraint (a large
/// cursor at extreme zoom), falls back to [`clamp_to_content`].
pub fn clamp_to_cursor(
    center: Point2D,
    scale: f64,
    cursor: Point2D,
    glyph: &CursorGlyph,
    overscan: &Insets,
) -> CursorClamp {
    let half = half_window(scale);
    let content = clamp_to_content(center, scale, overscan);

    let axis = |c: f64, hotspot_pos: f64, hotspot: f64, extent: f64, lo: f64, hi: f64| {
        let glyph_lo = hotspot_pos - hotspot;
        let glyph_hi = glyph_lo + extent;
        // The window [c - half, c + half] must cover [glyph_lo, glyph_hi].
        let min_c = (glyph_hi - half).max(lo);
        let max_c = (glyph_lo + half).min(hi);
        (min_c <= max_c).then(|| clamp(c, min_c, max_c))
    };

    let (min_x, max_x) = center_range(half, overscan.left, overscan.right);
    let (min_y, max_y) = center_range(half, overscan.top, overscan.bottom);
    let x = axis(center.x, cursor.x, glyph.hotspot_x, glyph.width, min_x, max_x);
    let y = axis(center.y, cursor.y, glyph.hotspot_y, glyph.height, min_y, max_y);

    match (x, y) {
        (Some(x), Some(y)) => CursorClamp {
            center: Point2D::new(x, y),
            glyph_visible: true,
        },
        _ => {
            tracing::debug!(scale, "Cursor glyph cannot fit the visible window, clamping to content");
            CursorClamp {
                center: content,
                glyph_visible: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn glyph() -> CursorGlyph {
        CursorGlyph::from_effect(&CursorEffectData::default(), 1000, 1000)
    }

    #[test]
    fn test_unzoomed_camera_is_centered() {
        let c = clamp_to_content(Point2D::new(0.9, 0.1), 1.0, &Insets::ZERO);
        assert_eq!(c, Point2D::CENTER);
    }

    #[test]
    fn test_zoomed_camera_stops_at_edges() {
        let c = clamp_to_content(Point2D::new(0.95, 0.05), 2.0, &Insets::ZERO);
        assert_eq!(c, Point2D::new(0.75, 0.25));
    }

    #[test]
    fn test_overscan_extends_travel() {
        let overscan = Insets {
            left: 0.1,
            right: 0.1,
            top: 0.0,
            bottom: 0.0,
        };
        let c = clamp_to_content(Point2D::new(0.0, 0.5), 1.0, &overscan);
        assert!((c.x - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_cursor_glyph_pulls_camera() {
        // Zoomed 4x on the left; cursor sits right of the window.
        let result = clamp_to_cursor(
            Point2D::new(0.3, 0.5),
            4.0,
            Point2D::new(0.5, 0.5),
            &glyph(),
            &Insets::ZERO,
        );
        assert!(result.glyph_visible);
        let half = half_window(4.0);
        let g = glyph();
        let right_edge = 0.5 - g.hotspot_x + g.width;
        assert!((result.center.x + half - right_edge).abs() < 1e-12);
    }

    #[test]
    fn test_infeasible_glyph_falls_back_to_content() {
        let huge = CursorGlyph {
            width: 0.5,
            height: 0.5,
            hotspot_x: 0.0,
            hotspot_y: 0.0,
        };
        let result = clamp_to_cursor(
            Point2D::new(0.2, 0.2),
            8.0,
            Point2D::new(0.5, 0.5),
            &huge,
            &Insets::ZERO,
        );
        assert!(!result.glyph_visible);
        assert_eq!(result.center, clamp_to_content(Point2D::new(0.2, 0.2), 8.0, &Insets::ZERO));
    }

    proptest! {
        #[test]
        fn clamp_stays_in_feasible_range(
            center in -2.0f64..3.0,
            half in 0.01f64..1.5,
            lo_over in 0.0f64..0.3,
            hi_over in 0.0f64..0.3,
        ) {
            let (min_c, max_c) = center_range(half, lo_over, hi_over);
            let clamped = clamp_center(center, min_c, max_c);
            if min_c <= max_c {
                prop_assert!(clamped >= min_c && clamped <= max_c);
            } else {
                prop_assert!((clamped - (min_c + max_c) / 2.0).abs() < 1e-12);
            }
        }

        #[test]
        fn cursor_clamp_keeps_glyph_or_falls_back(
            cx in 0.0f64..1.0,
            cy in 0.0f64..1.0,
            px in 0.0f64..1.0,
            py in 0.0f64..1.0,
            scale in 1.0f64..12.0,
        ) {
            let g = glyph();
            let result = clamp_to_cursor(Point2D::new(cx, cy), scale, Point2D::new(px, py), &g, &Insets::ZERO);
            let half = half_window(scale);
            if result.glyph_visible {
                let left = px - g.hotspot_x;
                prop_assert!(result.center.x - half <= left + 1e-9);
                prop_assert!(result.center.x + half >= left + g.width - 1e-9);
            }
            let (min_c, max_c) = center_range(half, 0.0, 0.0);
            prop_assert!(result.center.x >= min_c - 1e-9 && result.center.x <= max_c + 1e-9);
        }
    }
}
