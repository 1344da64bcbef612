//! Deterministic camera paths.
//!
//! The camera is a sequential simulation, so the path for a whole timeline
//! is built once with a forward sweep ([`calculate_full_camera_path`]) and
//! then read by frame index. Readers never step the simulation themselves;
//! a [`CameraPath`] is immutable and can be shared across export workers.
//!
//! [`PreviewCamera`] runs the same per-frame step live. Played forward from
//! frame 0 it reproduces the exported path exactly; seeking or scrubbing
//! restarts the simulation.

use std::ops::Range;

use clipcam_processing_core::camera::{CameraPhysicsState, CameraTransform};
use clipcam_project_model::effect::Effect;
use clipcam_project_model::project::RecordingLookup;
use clipcam_timeline::boundary::OverlapContext;
use clipcam_timeline::layout::FrameLayout;
use serde::Serialize;

use crate::snapshot::{FrameSnapshot, SnapshotContext};

/// Snapshots for every frame of a timeline, in frame order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraPath {
    frames: Vec<FrameSnapshot>,
}

impl CameraPath {
    /// Snapshot for `frame`, in O(1).
    pub fn get(&self, frame: i64) -> Option<&FrameSnapshot> {
        usize::try_from(frame).ok().and_then(|i| self.frames.get(i))
    }

    /// Camera transform for `frame`; identity outside the path.
    pub fn transform_at(&self, frame: i64) -> CameraTransform {
        self.get(frame).map(|s| s.camera).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrameSnapshot> {
        self.frames.iter()
    }

    pub fn snapshots(&self) -> &[FrameSnapshot] {
        &self.frames
    }

    pub fn into_snapshots(self) -> Vec<FrameSnapshot> {
        self.frames
    }
}

impl<'a> IntoIterator for &'a CameraPath {
    type Item = &'a FrameSnapshot;
    type IntoIter = std::slice::Iter<'a, FrameSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Build the snapshot for every frame of the layout.
///
/// Returns `None` for an empty layout. Segments (runs of frames driven by
/// one contiguous group) with no zoom and no device mockup skip simulation
/// and hold the identity transform.
pub fn calculate_full_camera_path<L>(context: &SnapshotContext<'_, L>) -> Option<CameraPath>
where
    L: RecordingLookup + ?Sized,
{
    if context.layout.is_empty() {
        return None;
    }

    let total = context.layout.total_frames();
    let context = SnapshotContext {
        overlap: OverlapContext {
            is_rendering: true,
            ..context.overlap
        },
        ..*context
    };

    let mut frames = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
    let mut state = CameraPhysicsState::default();
    let mut animated_segments = 0usize;
    let mut frame = 0;

    while frame < total {
        let segment = context.segment_bounds(frame);
        let inputs: Vec<_> = segment.clone().map(|f| context.prepare_frame(f)).collect();
        let animate = inputs.iter().any(|i| i.needs_camera);
        if animate {
            animated_segments += 1;
        }
        for frame_inputs in inputs {
            let (next, snapshot) = context.advance(&state, frame_inputs, animate);
            state = next;
            frames.push(snapshot);
        }
        frame = segment.end;
    }

    tracing::debug!(frames = frames.len(), animated_segments, "Built camera path");
    Some(CameraPath { frames })
}

/// How the preview reached the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Non-interactive playback.
    #[default]
    Playing,
    /// User-driven scrubbing; the simulation restarts every frame.
    Scrubbing,
}

/// Live camera for the preview render loop.
#[derive(Debug, Clone, Default)]
pub struct PreviewCamera {
    state: CameraPhysicsState,
    last_frame: Option<i64>,
    segment: Option<SegmentCache>,
}

/// The segment the preview is in, with the timeline it was measured on.
#[derive(Debug, Clone)]
struct SegmentCache {
    range: Range<i64>,
    animate: bool,
    layout: FrameLayout,
    effects: Vec<Effect>,
}

impl SegmentCache {
    fn is_valid_for<L>(&self, context: &SnapshotContext<'_, L>, frame: i64) -> bool
    where
        L: RecordingLookup + ?Sized,
    {
        self.range.contains(&frame) && self.effects == context.effects && self.layout == *context.layout
    }
}

impl PreviewCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all simulation state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Snapshot for `frame`.
    ///
    /// Consecutive frames continue the simulation; anything else (a seek,
    /// a repeat, scrubbing) restarts it at `frame`. Edits to the layout or
    /// effects between frames are picked up on the next call.
    pub fn frame<L>(&mut self, context: &SnapshotContext<'_, L>, frame: i64, mode: PlaybackMode) -> FrameSnapshot
    where
        L: RecordingLookup + ?Sized,
    {
        let scrubbing = mode == PlaybackMode::Scrubbing;
        let sequential = self.last_frame.is_some_and(|last| frame == last + 1);
        if scrubbing || !sequential {
            if self.last_frame.is_some() {
                tracing::debug!(frame, scrubbing, "Preview camera restarted");
            }
            self.state = CameraPhysicsState::default();
        }

        let context = SnapshotContext {
            overlap: OverlapContext {
                is_rendering: false,
                is_scrubbing: scrubbing,
            },
            ..*context
        };

        let animate = self.segment_animates(&context, frame);
        let (next, snapshot) = context.advance(&self.state, context.prepare_frame(frame), animate);
        self.state = next;
        self.last_frame = Some(frame);
        snapshot
    }

    fn segment_animates<L>(&mut self, context: &SnapshotContext<'_, L>, frame: i64) -> bool
    where
        L: RecordingLookup + ?Sized,
    {
        if let Some(cached) = &self.segment {
            if cached.is_valid_for(context, frame) {
                return cached.animate;
            }
            if cached.range.contains(&frame) {
                tracing::debug!(frame, "Timeline edited; re-measuring preview segment");
            }
        }
        let range = context.segment_bounds(frame);
        let animate = context.segment_needs_camera(range.clone());
        self.segment = Some(SegmentCache {
            range,
            animate,
            layout: context.layout.clone(),
            effects: context.effects.to_vec(),
        });
        animate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipcam_common::config::{CacheConfig, CameraDynamicsConfig, SmoothingConfig};
    use clipcam_processing_core::cache::TelemetryCaches;
    use clipcam_project_model::effect::{EffectData, ZoomEffectData, ZoomFollow};
    use clipcam_project_model::event::{MouseEvent, RecordingMetadata};
    use clipcam_project_model::project::{Clip, Recording};
    use clipcam_timeline::layout::build_frame_layout;
    use proptest::prelude::*;

    struct Fixture {
        layout: FrameLayout,
        effects: Vec<Effect>,
        recordings: Vec<Recording>,
        camera: CameraDynamicsConfig,
        smoothing: SmoothingConfig,
        caches: TelemetryCaches,
    }

    impl Fixture {
        fn new(clips: Vec<Clip>, effects: Vec<Effect>) -> Self {
            Self {
                layout: build_frame_layout(&clips, 30.0),
                effects,
                recordings: vec![
                    Recording::new("rec-a", 1920, 1080, 10_000.0),
                    Recording::new("rec-b", 1920, 1080, 10_000.0),
                ],
                camera: CameraDynamicsConfig::default(),
                smoothing: SmoothingConfig::default(),
                caches: TelemetryCaches::new(&CacheConfig::default()),
            }
        }

        fn context(&self) -> SnapshotContext<'_, [Recording]> {
            SnapshotContext {
                layout: &self.layout,
                effects: &self.effects,
                recordings: self.recordings.as_slice(),
                output_width: 1280,
                output_height: 720,
                camera: &self.camera,
                smoothing: &self.smoothing,
                caches: &self.caches,
                overlap: OverlapContext::default(),
            }
        }
    }

    fn two_clips() -> Vec<Clip> {
        vec![
            Clip::new("a", "rec-a", 0.0, 1000.0, 0.0),
            Clip::new("b", "rec-b", 1000.0, 1000.0, 0.0),
        ]
    }

    fn zoom_on(clip: &str) -> Effect {
        Effect::new(
            "zoom",
            0.0,
            1000.0,
            EffectData::Zoom(ZoomEffectData {
                target_x: 0.3,
                target_y: 0.3,
                ..Default::default()
            }),
        )
        .bound_to(clip)
    }

    #[test]
    fn test_empty_layout_has_no_path() {
        let fixture = Fixture::new(vec![], vec![]);
        assert!(calculate_full_camera_path(&fixture.context()).is_none());
    }

    #[test]
    fn test_path_covers_every_frame_in_order() {
        let fixture = Fixture::new(two_clips(), vec![]);
        let path = calculate_full_camera_path(&fixture.context()).expect("path");
        assert_eq!(path.len(), 60);
        for (i, snapshot) in path.iter().enumerate() {
            assert_eq!(snapshot.frame, i as i64);
        }
        assert!(path.get(-1).is_none());
        assert!(path.get(60).is_none());
    }

    #[test]
    fn test_segment_without_zoom_is_identity() {
        let fixture = Fixture::new(two_clips(), vec![zoom_on("b")]);
        let path = calculate_full_camera_path(&fixture.context()).expect("path");
        assert!((0..30).all(|f| path.transform_at(f).is_identity()));
        assert!((45..60).any(|f| path.transform_at(f).scale > 1.5));
    }

    #[test]
    fn test_export_suppresses_boundary_overlap() {
        let fixture = Fixture::new(two_clips(), vec![]);
        let path = calculate_full_camera_path(&fixture.context()).expect("path");
        assert!(path.iter().all(|s| !s.boundary.prewarm_next && !s.boundary.hold_previous));
    }

    #[test]
    fn test_preview_playback_matches_export() {
        let fixture = Fixture::new(two_clips(), vec![zoom_on("a"), zoom_on("b")]);
        let context = fixture.context();
        let path = calculate_full_camera_path(&context).expect("path");

        let mut preview = PreviewCamera::new();
        for frame in 0..path.len() as i64 {
            let snapshot = preview.frame(&context, frame, PlaybackMode::Playing);
            assert_eq!(snapshot.camera, path.transform_at(frame), "frame {frame}");
        }
    }

    #[test]
    fn test_preview_seek_restarts_simulation() {
        let fixture = Fixture::new(two_clips(), vec![zoom_on("a")]);
        let context = fixture.context();
        let mut preview = PreviewCamera::new();
        preview.frame(&context, 0, PlaybackMode::Playing);
        // A fresh simulation snaps to the target on its first frame.
        let snapshot = preview.frame(&context, 20, PlaybackMode::Playing);
        let expected = ZoomEffectData::default().scale;
        assert!(snapshot.camera.scale > 1.0 && snapshot.camera.scale <= expected);
        assert_eq!(preview.last_frame, Some(20));
    }

    #[test]
    fn test_preview_picks_up_effect_edits_mid_segment() {
        let mut fixture = Fixture::new(two_clips(), vec![]);
        fixture.camera.dead_zone_ratio = 0.0;
        let mut preview = PreviewCamera::new();
        for frame in 0..10 {
            let snapshot = preview.frame(&fixture.context(), frame, PlaybackMode::Playing);
            assert!(snapshot.camera.is_identity());
        }

        fixture.effects.push(Effect::new(
            "zoom",
            0.0,
            2000.0,
            EffectData::Zoom(ZoomEffectData {
                target_x: 0.3,
                target_y: 0.3,
                intro_ms: 0.0,
                outro_ms: 0.0,
                ..Default::default()
            }),
        ));
        let context = fixture.context();
        let mut live = CameraTransform::IDENTITY;
        for frame in 10..40 {
            live = preview.frame(&context, frame, PlaybackMode::Playing).camera;
        }

        let exported = calculate_full_camera_path(&context).expect("path").transform_at(39);
        assert!(live.scale > 1.5, "{live:?}");
        assert!((live.scale - exported.scale).abs() < 1e-2);
        assert!((live.center_x - exported.center_x).abs() < 1e-2);
        assert!((live.center_y - exported.center_y).abs() < 1e-2);
    }

    fn parked_cursor(x: f64, y: f64) -> RecordingMetadata {
        RecordingMetadata {
            mouse_events: vec![MouseEvent::new(0.0, x, y), MouseEvent::new(5000.0, x, y)],
            ..Default::default()
        }
    }

    fn follow_cursor_on(clip: &str) -> Effect {
        Effect::new(
            format!("follow-{clip}"),
            0.0,
            1000.0,
            EffectData::Zoom(ZoomEffectData {
                follow: ZoomFollow::Cursor,
                intro_ms: 0.0,
                outro_ms: 0.0,
                ..Default::default()
            }),
        )
        .bound_to(clip)
    }

    #[test]
    fn test_cursor_cache_is_scoped_per_recording() {
        // Both streams span 0..5000 ms with two samples, so only the
        // recording id tells them apart.
        let mut fixture = Fixture::new(two_clips(), vec![follow_cursor_on("a"), follow_cursor_on("b")]);
        fixture.recordings = vec![
            Recording::new("rec-a", 1920, 1080, 10_000.0).with_metadata(parked_cursor(200.0, 200.0)),
            Recording::new("rec-b", 1920, 1080, 10_000.0).with_metadata(parked_cursor(1700.0, 900.0)),
        ];
        let roomy = calculate_full_camera_path(&fixture.context()).expect("path");

        fixture.caches = TelemetryCaches::new(&CacheConfig { capacity: 1 });
        let tight = calculate_full_camera_path(&fixture.context()).expect("path");

        assert_eq!(roomy, tight);
        let end_of_a = roomy.transform_at(29);
        let end_of_b = roomy.transform_at(59);
        assert!(end_of_a.center_x < 0.4 && end_of_a.center_y < 0.4, "{end_of_a:?}");
        assert!(end_of_b.center_x > 0.6 && end_of_b.center_y > 0.6, "{end_of_b:?}");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn preview_matches_export_for_any_zoom(
            start in 0.0f64..900.0,
            len in 100.0f64..1500.0,
            scale in 1.0f64..4.0,
            x in 0.0f64..1.0,
            y in 0.0f64..1.0,
        ) {
            let zoom = Effect::new(
                "zoom",
                start,
                start + len,
                EffectData::Zoom(ZoomEffectData {
                    scale,
                    target_x: x,
                    target_y: y,
                    ..Default::default()
                }),
            );
            let fixture = Fixture::new(two_clips(), vec![zoom]);
            let context = fixture.context();
            let path = calculate_full_camera_path(&context).expect("path");

            let mut preview = PreviewCamera::new();
            for frame in 0..path.len() as i64 {
                let live = preview.frame(&context, frame, PlaybackMode::Playing).camera;
                prop_assert_eq!(live, path.transform_at(frame));
                prop_assert!(live.scale >= 1.0);
                let half = 0.5 / live.scale;
                prop_assert!(live.center_x >= half - 1e-9 && live.center_x <= 1.0 - half + 1e-9);
            }
        }
    }
}
