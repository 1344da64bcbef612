//! Viewport and rectangle types for camera framing.
//!
//! [`Viewport`] and [`Point2D`] are normalized to the source frame
//! (`(0,0)` top-left, `(1,1)` bottom-right). [`Rect`] is in output pixels.

use serde::{Deserialize, Serialize};

/// The window of the source frame the camera currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Left edge (normalized).
    pub x: f64,
    /// Top edge (normalized).
    pub y: f64,
    /// Width (normalized).
    pub w: f64,
    /// Height (normalized).
    pub h: f64,
}

impl Viewport {
    /// Full-frame viewport (no zoom).
    pub const FULL: Viewport = Viewport {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FULL
    }
}

/// A 2D normalized point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const CENTER: Point2D = Point2D { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn aspect(&self) -> f64 {
        if self.height <= 0.0 {
            return 1.0;
        }
        self.width / self.height
    }

    /// Shrink by `amount` on every side, never below zero size.
    pub fn inset(&self, amount: f64) -> Rect {
        let dx = amount.min(self.width / 2.0).max(0.0);
        let dy = amount.min(self.height / 2.0).max(0.0);
        Rect::new(self.x + dx, self.y + dy, self.width - 2.0 * dx, self.height - 2.0 * dy)
    }

    /// Largest rectangle of the given aspect ratio that fits inside `self`,
    /// centered.
    pub fn fit_aspect(&self, aspect: f64) -> Rect {
        if aspect <= 0.0 || self.width <= 0.0 || self.height <= 0.0 {
            return *self;
        }
        let (width, height) = if self.aspect() > aspect {
            (self.height * aspect, self.height)
        } else {
            (self.width, self.width / aspect)
        };
        Rect::new(
            self.x + (self.width - width) / 2.0,
            self.y + (self.height - height) / 2.0,
            width,
            height,
        )
    }

    /// Map a rectangle given in this rect's normalized coordinates into pixels.
    pub fn sub_rect(&self, normalized: &Viewport) -> Rect {
        Rect::new(
            self.x + normalized.x * self.width,
            self.y + normalized.y * self.height,
            normalized.w * self.width,
            normalized.h * self.height,
        )
    }
}

/// Per-edge margins, normalized to the size of the content they surround.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Insets {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Insets {
    pub const ZERO: Insets = Insets {
        left: 0.0,
        right: 0.0,
        top: 0.0,
        bottom: 0.0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_aspect_letterboxes() {
        let canvas = Rect::new(0.0, 0.0, 1920.0, 1080.0);
        let fitted = canvas.fit_aspect(4.0 / 3.0);
        assert!((fitted.height - 1080.0).abs() < 1e-9);
        assert!((fitted.width - 1440.0).abs() < 1e-9);
        assert!((fitted.x - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_inset_never_negative() {
        let rect = Rect::new(0.0, 0.0, 100.0, 40.0).inset(30.0);
        assert!(rect.width >= 0.0);
        assert_eq!(rect.height, 0.0);
    }

    #[test]
    fn test_sub_rect() {
        let frame = Rect::new(100.0, 50.0, 1000.0, 500.0);
        let screen = frame.sub_rect(&Viewport { x: 0.1, y: 0.2, w: 0.8, h: 0.6 });
        assert!((screen.x - 200.0).abs() < 1e-9);
        assert!((screen.y - 150.0).abs() < 1e-9);
        assert!((screen.width - 800.0).abs() < 1e-9);
        assert!((screen.height - 300.0).abs() < 1e-9);
    }
}
