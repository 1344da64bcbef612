//! Output framing: where the camera output lands on the canvas.
//!
//! Without a background the video is letterboxed into the canvas. Padding
//! shrinks the available area. A device mockup places the video inside the
//! mockup's screen opening; any part of that opening not covered by the
//! video becomes overscan, travel the camera may use without exposing
//! letterbox bars.

use clipcam_project_model::effect::BackgroundEffectData;
use clipcam_project_model::viewport::{Insets, Rect};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutputFraming {
    /// The whole output canvas.
    pub canvas: Rect,
    /// The rectangle the camera output fills.
    pub camera_rect: Rect,
    /// Where the unzoomed video sits within `camera_rect`.
    pub video_rect: Rect,
    /// `camera_rect` margins beyond `video_rect`, normalized to video size.
    pub overscan: Insets,
    /// A device mockup constrains the visible region.
    pub mockup: bool,
}

impl OutputFraming {
    /// Plain letterboxed framing with no background.
    pub fn letterbox(output_width: u32, output_height: u32, source_aspect: f64) -> Self {
        let canvas = Rect::new(0.0, 0.0, output_width as f64, output_height as f64);
        let video_rect = canvas.fit_aspect(source_aspect);
        Self {
            canvas,
            camera_rect: video_rect,
            video_rect,
            overscan: Insets::ZERO,
            mockup: false,
        }
    }
}

/// Compute framing for one frame's background configuration.
pub fn compute_output_framing(
    output_width: u32,
    output_height: u32,
    source_aspect: f64,
    background: Option<&BackgroundEffectData>,
) -> OutputFraming {
    let Some(background) = background else {
        return OutputFraming::letterbox(output_width, output_height, source_aspect);
    };

    let canvas = Rect::new(0.0, 0.0, output_width as f64, output_height as f64);
    let available = canvas.inset(background.padding);

    let Some(mockup) = background.active_mockup() else {
        let video_rect = available.fit_aspect(source_aspect);
        return OutputFraming {
            canvas,
            camera_rect: video_rect,
            video_rect,
            overscan: Insets::ZERO,
            mockup: false,
        };
    };

    let frame_aspect = if mockup.frame_height > 0.0 {
        mockup.frame_width / mockup.frame_height
    } else {
        source_aspect
    };
    let frame_rect = available.fit_aspect(frame_aspect);
    let screen = frame_rect.sub_rect(&mockup.screen_region);
    let video_rect = screen.fit_aspect(source_aspect);

    let overscan = if video_rect.width > 0.0 && video_rect.height > 0.0 {
        Insets {
            left: (video_rect.x - screen.x) / video_rect.width,
            right: (screen.right() - video_rect.right()) / video_rect.width,
            top: (video_rect.y - screen.y) / video_rect.height,
            bottom: (screen.bottom() - video_rect.bottom()) / video_rect.height,
        }
    } else {
        Insets::ZERO
    };

    OutputFraming {
        canvas,
        camera_rect: screen,
        video_rect,
        overscan,
        mockup: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipcam_project_model::effect::DeviceMockup;
    use clipcam_project_model::viewport::Viewport;

    #[test]
    fn test_letterbox_without_background() {
        let framing = compute_output_framing(1920, 1080, 4.0 / 3.0, None);
        let video = framing.video_rect;
        assert!((video.x - 240.0).abs() < 1e-9 && (video.width - 1440.0).abs() < 1e-9);
        assert_eq!(video.height, 1080.0);
        assert!(framing.overscan.is_zero());
        assert!(!framing.mockup);
    }

    #[test]
    fn test_padding_shrinks_video() {
        let background = BackgroundEffectData {
            padding: 60.0,
            ..Default::default()
        };
        let framing = compute_output_framing(1920, 1080, 16.0 / 9.0, Some(&background));
        assert_eq!(framing.video_rect.height, 960.0);
        assert!((framing.video_rect.width - 960.0 * 16.0 / 9.0).abs() < 1e-9);
        assert_eq!(framing.camera_rect, framing.video_rect);
    }

    #[test]
    fn test_mockup_bezel_becomes_overscan() {
        // A square screen opening holding 16:9 video leaves room above and
        // below.
        let background = BackgroundEffectData {
            mockup: Some(DeviceMockup {
                enabled: true,
                frame_width: 1000.0,
                frame_height: 1000.0,
                screen_region: Viewport {
                    x: 0.1,
                    y: 0.1,
                    w: 0.8,
                    h: 0.8,
                },
            }),
            ..Default::default()
        };
        let framing = compute_output_framing(1000, 1000, 16.0 / 9.0, Some(&background));
        assert!(framing.mockup);
        assert_eq!(framing.camera_rect, Rect::new(100.0, 100.0, 800.0, 800.0));
        assert!(framing.overscan.left.abs() < 1e-9);
        let expected = (800.0 - 450.0) / 2.0 / 450.0;
        assert!((framing.overscan.top - expected).abs() < 1e-9);
        assert!((framing.overscan.bottom - expected).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_mockup_is_ignored() {
        let background = BackgroundEffectData {
            mockup: Some(DeviceMockup {
                enabled: false,
                ..Default::default()
            }),
            ..Default::default()
        };
        let framing = compute_output_framing(1920, 1080, 16.0 / 9.0, Some(&background));
        assert!(!framing.mockup);
        assert!(framing.overscan.is_zero());
    }
}
