//! Per-frame snapshot assembly.
//!
//! A [`FrameSnapshot`] is everything the renderer and exporter need for one
//! output frame: the active clip and its effects, every composited layer,
//! decoder overlap hints, output framing, and the camera transform.
//!
//! Assembly is split in two. [`SnapshotContext::prepare_frame`] gathers the
//! frame's inputs without touching camera state; the camera path (or the
//! live preview) then steps the camera and seals the result with
//! [`FrameInputs::into_snapshot`].

use std::ops::Range;

use clipcam_common::config::{CameraDynamicsConfig, SmoothingConfig};
use clipcam_processing_core::cache::TelemetryCaches;
use clipcam_processing_core::camera::{step, CameraInput, CameraPhysicsState, CameraTransform, ZoomTarget};
use clipcam_processing_core::cursor_smooth::smoothed_cursor_position_cached;
use clipcam_processing_core::framing::{compute_output_framing, OutputFraming};
use clipcam_processing_core::visibility::CursorGlyph;
use clipcam_project_model::effect::Effect;
use clipcam_project_model::event::MouseEvent;
use clipcam_project_model::project::RecordingLookup;
use clipcam_timeline::boundary::{compute_boundary_overlap, BoundaryOverlapState, OverlapContext};
use clipcam_timeline::effects::{
    resolve_effective_clip_data, resolve_effective_layers, EffectiveClipData, ResolvedEffects,
};
use clipcam_timeline::layout::{FrameLayout, GroupId};
use clipcam_timeline::resolver::find_active_frame_layout_index;
use serde::Serialize;

/// One layout item as drawn at one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipSnapshot {
    pub layout_index: usize,
    pub clip_id: String,
    pub recording_id: String,
    pub track_index: usize,
    pub group_id: GroupId,
    pub start_frame: i64,
    pub end_frame: i64,
    pub source_time_ms: f64,
    /// Layout index structural effects were inherited from.
    pub inherited_from: Option<usize>,
    pub effects: ResolvedEffects,
}

impl From<&EffectiveClipData<'_>> for ClipSnapshot {
    fn from(data: &EffectiveClipData<'_>) -> Self {
        Self {
            layout_index: data.layout_index,
            clip_id: data.clip.id.clone(),
            recording_id: data.recording.id.clone(),
            track_index: data.item.track_index,
            group_id: data.item.group_id,
            start_frame: data.item.start_frame,
            end_frame: data.item.end_frame,
            source_time_ms: data.source_time_ms,
            inherited_from: data.inherited_from,
            effects: data.effects.clone(),
        }
    }
}

/// Final per-frame output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: i64,
    pub timeline_ms: f64,
    /// The item driving the camera, if any.
    pub clip: Option<ClipSnapshot>,
    /// Every item covering the frame, bottom layer first.
    pub layers: Vec<ClipSnapshot>,
    pub camera: CameraTransform,
    pub boundary: BoundaryOverlapState,
    pub framing: OutputFraming,
}

/// Where to sample the cursor for a frame.
#[derive(Debug, Clone, Copy)]
struct CursorSource<'a> {
    recording_id: &'a str,
    events: &'a [MouseEvent],
    time_ms: f64,
    width: u32,
    height: u32,
}

/// A frame's inputs before the camera has been stepped.
#[derive(Debug, Clone)]
pub struct FrameInputs<'a> {
    pub frame: i64,
    pub timeline_ms: f64,
    pub clip: Option<ClipSnapshot>,
    pub layers: Vec<ClipSnapshot>,
    pub boundary: BoundaryOverlapState,
    pub framing: OutputFraming,
    /// Camera input without the cursor; see [`SnapshotContext::advance`].
    pub camera_input: CameraInput,
    /// A zoom or device mockup is active.
    pub needs_camera: bool,
    cursor_source: Option<CursorSource<'a>>,
}

impl FrameInputs<'_> {
    pub fn into_snapshot(self, camera: CameraTransform) -> FrameSnapshot {
        FrameSnapshot {
            frame: self.frame,
            timeline_ms: self.timeline_ms,
            clip: self.clip,
            layers: self.layers,
            camera,
            boundary: self.boundary,
            framing: self.framing,
        }
    }
}

/// Borrowed project data and settings shared by every frame.
pub struct SnapshotContext<'a, L: RecordingLookup + ?Sized> {
    pub layout: &'a FrameLayout,
    pub effects: &'a [Effect],
    pub recordings: &'a L,
    pub output_width: u32,
    pub output_height: u32,
    pub camera: &'a CameraDynamicsConfig,
    pub smoothing: &'a SmoothingConfig,
    pub caches: &'a TelemetryCaches,
    pub overlap: OverlapContext,
}

impl<L: RecordingLookup + ?Sized> Clone for SnapshotContext<'_, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L: RecordingLookup + ?Sized> Copy for SnapshotContext<'_, L> {}

impl<'a, L: RecordingLookup + ?Sized> SnapshotContext<'a, L> {
    fn output_aspect(&self) -> f64 {
        if self.output_height == 0 {
            return 16.0 / 9.0;
        }
        self.output_width as f64 / self.output_height as f64
    }

    /// Gather everything for `frame` except the camera transform.
    pub fn prepare_frame(&self, frame: i64) -> FrameInputs<'a> {
        let timeline_ms = self.layout.frame_to_ms(frame);
        let active = find_active_frame_layout_index(self.layout, frame);
        let boundary = compute_boundary_overlap(self.layout, frame, active, self.recordings, self.overlap);
        let layers = resolve_effective_layers(frame, self.layout, self.effects, self.recordings)
            .iter()
            .map(ClipSnapshot::from)
            .collect();

        let mut camera_input = CameraInput {
            timeline_ms,
            source_time_ms: timeline_ms,
            ..Default::default()
        };

        let Some(data) = resolve_effective_clip_data(frame, self.layout, self.effects, self.recordings) else {
            return FrameInputs {
                frame,
                timeline_ms,
                clip: None,
                layers,
                boundary,
                framing: OutputFraming::letterbox(self.output_width, self.output_height, self.output_aspect()),
                camera_input,
                needs_camera: false,
                cursor_source: None,
            };
        };

        let recording = data.recording;
        let framing = compute_output_framing(
            self.output_width,
            self.output_height,
            recording.aspect(),
            data.effects.background_data(),
        );

        camera_input.source_time_ms = data.source_time_ms;
        camera_input.zoom = data.effects.zoom.as_ref().and_then(|effect| {
            let time = if effect.is_clip_bound() {
                data.source_time_ms
            } else {
                timeline_ms
            };
            ZoomTarget::from_effect(effect, time)
        });
        camera_input.overscan = framing.overscan;
        camera_input.force_follow_cursor = framing.mockup;
        let cursor_style = data.effects.cursor_data().cloned().unwrap_or_default();
        camera_input.cursor_glyph = Some(CursorGlyph::from_effect(&cursor_style, recording.width, recording.height));

        let cursor_source = recording
            .metadata
            .as_ref()
            .filter(|_| recording.source_type.is_visual())
            .filter(|metadata| !metadata.mouse_events.is_empty())
            .map(|metadata| CursorSource {
                recording_id: &recording.id,
                events: &metadata.mouse_events,
                time_ms: data.source_time_ms,
                width: recording.width,
                height: recording.height,
            });

        FrameInputs {
            frame,
            timeline_ms,
            needs_camera: data.effects.has_zoom() || data.effects.has_mockup(),
            clip: Some(ClipSnapshot::from(&data)),
            layers,
            boundary,
            framing,
            camera_input,
            cursor_source,
        }
    }

    /// Whether `frame` needs a simulated camera, without assembling it.
    pub fn frame_needs_camera(&self, frame: i64) -> bool {
        resolve_effective_clip_data(frame, self.layout, self.effects, self.recordings)
            .is_some_and(|data| data.effects.has_zoom() || data.effects.has_mockup())
    }

    /// Segment key: the driving item's track and contiguous group.
    fn segment_key(&self, frame: i64) -> Option<(usize, GroupId)> {
        find_active_frame_layout_index(self.layout, frame).map(|index| {
            let item = &self.layout[index];
            (item.track_index, item.group_id)
        })
    }

    /// The maximal run of frames around `frame` driven by the same
    /// contiguous group.
    pub fn segment_bounds(&self, frame: i64) -> Range<i64> {
        let total = self.layout.total_frames();
        let key = self.segment_key(frame);
        let mut start = frame.clamp(0, total.max(1) - 1);
        while start > 0 && self.segment_key(start - 1) == key {
            start -= 1;
        }
        let mut end = start + 1;
        while end < total && self.segment_key(end) == key {
            end += 1;
        }
        start..end
    }

    /// Whether any frame in `segment` needs a simulated camera. When none
    /// does, the segment is rendered with the identity transform.
    pub fn segment_needs_camera(&self, segment: Range<i64>) -> bool {
        segment.into_iter().any(|frame| self.frame_needs_camera(frame))
    }

    /// Step the camera for one prepared frame.
    ///
    /// With `animate` off the camera rests at identity and the state is
    /// reset, keeping the clock so the next animated frame integrates.
    pub fn advance(
        &self,
        state: &CameraPhysicsState,
        inputs: FrameInputs<'a>,
        animate: bool,
    ) -> (CameraPhysicsState, FrameSnapshot) {
        if !animate {
            let next = CameraPhysicsState::reset_at(inputs.camera_input.timeline_ms, inputs.camera_input.source_time_ms);
            return (next, inputs.into_snapshot(CameraTransform::IDENTITY));
        }

        let mut input = inputs.camera_input;
        input.cursor = inputs.cursor_source.and_then(|source| {
            smoothed_cursor_position_cached(
                self.caches,
                source.recording_id,
                source.events,
                source.time_ms,
                source.width,
                source.height,
                self.smoothing,
            )
        });
        let (next, transform) = step(state, &input, self.camera);
        (next, inputs.into_snapshot(transform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipcam_common::config::CacheConfig;
    use clipcam_project_model::effect::{BackgroundEffectData, DeviceMockup, EffectData, ZoomEffectData};
    use clipcam_project_model::event::RecordingMetadata;
    use clipcam_project_model::project::{Clip, Recording};
    use clipcam_project_model::viewport::Viewport;
    use clipcam_timeline::layout::build_frame_layout;

    struct Fixture {
        layout: FrameLayout,
        effects: Vec<Effect>,
        recordings: Vec<Recording>,
        camera: CameraDynamicsConfig,
        smoothing: SmoothingConfig,
        caches: TelemetryCaches,
    }

    impl Fixture {
        fn new(clips: Vec<Clip>, effects: Vec<Effect>, recordings: Vec<Recording>) -> Self {
            Self {
                layout: build_frame_layout(&clips, 30.0),
                effects,
                recordings,
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
                output_width: 1920,
                output_height: 1080,
                camera: &self.camera,
                smoothing: &self.smoothing,
                caches: &self.caches,
                overlap: OverlapContext::default(),
            }
        }
    }

    fn cut_fixture(effects: Vec<Effect>) -> Fixture {
        let metadata = RecordingMetadata {
            mouse_events: vec![MouseEvent::new(0.0, 960.0, 540.0), MouseEvent::new(2000.0, 200.0, 100.0)],
            ..Default::default()
        };
        Fixture::new(
            vec![
                Clip::new("a", "rec-a", 0.0, 1000.0, 0.0),
                Clip::new("b", "rec-b", 1000.0, 1000.0, 0.0),
            ],
            effects,
            vec![
                Recording::new("rec-a", 1920, 1080, 5000.0).with_metadata(metadata),
                Recording::new("rec-b", 1920, 1080, 5000.0),
            ],
        )
    }

    #[test]
    fn test_prepare_frame_without_effects_is_static() {
        let fixture = cut_fixture(vec![]);
        let inputs = fixture.context().prepare_frame(10);
        assert!(!inputs.needs_camera);
        assert_eq!(inputs.clip.as_ref().map(|c| c.clip_id.as_str()), Some("a"));
        assert_eq!(inputs.layers.len(), 1);
        assert!(inputs.camera_input.zoom.is_none());
        assert!(inputs.cursor_source.is_some());
    }

    #[test]
    fn test_clip_bound_zoom_uses_source_time() {
        let zoom = Effect::new(
            "z",
            0.0,
            1000.0,
            EffectData::Zoom(ZoomEffectData {
                intro_ms: 1000.0,
                easing: clipcam_common::math::EasingFunction::Linear,
                ..Default::default()
            }),
        )
        .bound_to("b");
        let fixture = cut_fixture(vec![zoom]);
        // Frame 45 is 500 ms into clip b, whose source starts at 0.
        let inputs = fixture.context().prepare_frame(45);
        let target = inputs.camera_input.zoom.expect("zoom active");
        assert!((target.envelope - 0.5).abs() < 1e-9);
        assert!(inputs.needs_camera);
    }

    #[test]
    fn test_mockup_forces_cursor_follow() {
        let background = Effect::new(
            "bg",
            0.0,
            f64::INFINITY,
            EffectData::Background(BackgroundEffectData {
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
            }),
        );
        let fixture = cut_fixture(vec![background]);
        let inputs = fixture.context().prepare_frame(0);
        assert!(inputs.needs_camera);
        assert!(inputs.framing.mockup);
        assert!(inputs.camera_input.force_follow_cursor);
        assert!(inputs.camera_input.overscan.top > 0.0);
    }

    #[test]
    fn test_missing_recording_yields_no_clip() {
        let fixture = Fixture::new(vec![Clip::new("a", "gone", 0.0, 1000.0, 0.0)], vec![], vec![]);
        let context = fixture.context();
        let inputs = context.prepare_frame(3);
        assert!(inputs.clip.is_none());
        let (_, snapshot) = context.advance(&CameraPhysicsState::default(), inputs, false);
        assert!(snapshot.camera.is_identity());
    }

    #[test]
    fn test_segments_split_at_cuts() {
        let fixture = cut_fixture(vec![]);
        let context = fixture.context();
        assert_eq!(context.segment_bounds(12), 0..30);
        assert_eq!(context.segment_bounds(30), 30..60);
        assert_eq!(context.segment_bounds(59), 30..60);
    }

    #[test]
    fn test_static_advance_resets_state() {
        let fixture = cut_fixture(vec![]);
        let context = fixture.context();
        let moving = CameraPhysicsState {
            x: 0.2,
            vx: 3.0,
            scale: 2.0,
            ..Default::default()
        };
        let (state, snapshot) = context.advance(&moving, context.prepare_frame(5), false);
        assert_eq!(snapshot.camera, CameraTransform::IDENTITY);
        assert_eq!(state.x, 0.5);
        assert_eq!(state.last_time_ms, Some(fixture.layout.frame_to_ms(5)));
    }
}
