//! Spring-damped virtual camera.
//!
//! [`step`] is a pure function: given the previous [`CameraPhysicsState`]
//! and this frame's [`CameraInput`] it returns the next state and the
//! transform to render. Callers own the fold over frames, so the same
//! sequence of inputs always yields the same trajectory.
//!
//! # Per-step pipeline
//!
//! 1. **Target**: zoom scale (eased through the intro/outro envelope) and a
//!    focus point, either the zoom's declared target or the cursor.
//! 2. **Dead zone**: target movement near the camera center is ignored.
//! 3. **Integrate**: `a = (k * (target - pos) - c * v) / m` with
//!    semi-implicit Euler substeps over the elapsed source time. A missing
//!    or oversized delta snaps straight to the target.
//! 4. **Clamp**: keep the window inside content plus overscan, and keep the
//!    full cursor glyph visible where feasible.

use clipcam_common::config::CameraDynamicsConfig;
use clipcam_common::math::{inverse_lerp, EasingFunction};
use clipcam_project_model::effect::{Effect, ZoomFollow};
use clipcam_project_model::viewport::{Insets, Point2D};
use serde::Serialize;

use crate::visibility::{clamp_to_content, clamp_to_cursor, half_window, CursorGlyph};

/// Hard cap on integration substeps per frame.
const MAX_SUBSTEPS: usize = 256;

/// Simulation state carried from one frame to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPhysicsState {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub scale: f64,
    pub v_scale: f64,
    pub last_time_ms: Option<f64>,
    pub last_source_time_ms: Option<f64>,
}

impl Default for CameraPhysicsState {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            vx: 0.0,
            vy: 0.0,
            scale: 1.0,
            v_scale: 0.0,
            last_time_ms: None,
            last_source_time_ms: None,
        }
    }
}

impl CameraPhysicsState {
    /// Reset to the centered, unzoomed state while remembering the clock,
    /// so the next step integrates instead of snapping.
    pub fn reset_at(timeline_ms: f64, source_time_ms: f64) -> Self {
        Self {
            last_time_ms: Some(timeline_ms),
            last_source_time_ms: Some(source_time_ms),
            ..Default::default()
        }
    }
}

/// What an active zoom asks of the camera at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomTarget {
    pub scale: f64,
    pub focus: Point2D,
    pub follow_cursor: bool,
    /// Eased intro/outro progress in `[0, 1]`.
    pub envelope: f64,
}

impl ZoomTarget {
    /// `time_ms` must be in the effect's own time base (source time for
    /// clip-bound effects, timeline time for global ones).
    pub fn from_effect(effect: &Effect, time_ms: f64) -> Option<Self> {
        let data = effect.zoom()?;
        Some(Self {
            scale: data.scale.max(1.0),
            focus: Point2D::new(data.target_x, data.target_y),
            follow_cursor: data.follow == ZoomFollow::Cursor,
            envelope: zoom_envelope(
                effect.start_time,
                effect.end_time,
                data.intro_ms,
                data.outro_ms,
                data.easing,
                time_ms,
            ),
        })
    }

    /// Scale after applying the envelope.
    pub fn effective_scale(&self) -> f64 {
        1.0 + (self.scale - 1.0) * self.envelope
    }
}

/// Intro/outro progress of a zoom spanning `[start, end)`.
///
/// An infinite edge has no ramp on that side, so inherited zooms are fully
/// on.
pub fn zoom_envelope(
    start: f64,
    end: f64,
    intro_ms: f64,
    outro_ms: f64,
    easing: EasingFunction,
    time_ms: f64,
) -> f64 {
    let intro = if start.is_finite() && intro_ms > 0.0 {
        inverse_lerp(start, start + intro_ms, time_ms)
    } else {
        1.0
    };
    let outro = if end.is_finite() && outro_ms > 0.0 {
        inverse_lerp(end, end - outro_ms, time_ms)
    } else {
        1.0
    };
    easing.apply(intro.min(outro))
}

/// Per-frame camera inputs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraInput {
    pub timeline_ms: f64,
    pub source_time_ms: f64,
    pub zoom: Option<ZoomTarget>,
    /// Smoothed, normalized cursor position.
    pub cursor: Option<Point2D>,
    pub cursor_glyph: Option<CursorGlyph>,
    pub overscan: Insets,
    /// A device mockup constrains the visible region; follow the cursor
    /// even without a zoom.
    pub force_follow_cursor: bool,
}

/// The camera for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraTransform {
    pub center_x: f64,
    pub center_y: f64,
    pub scale: f64,
}

impl CameraTransform {
    pub const IDENTITY: CameraTransform = CameraTransform {
        center_x: 0.5,
        center_y: 0.5,
        scale: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Advance the camera by one frame.
pub fn step(
    state: &CameraPhysicsState,
    input: &CameraInput,
    config: &CameraDynamicsConfig,
) -> (CameraPhysicsState, CameraTransform) {
    let (focus, target_scale) = target_for(input);
    let mut next = *state;

    match integration_dt(state, input, config) {
        Some(dt_ms) => {
            let focus = apply_dead_zone(state, focus, config.dead_zone_ratio);
            integrate(&mut next, focus, target_scale, dt_ms, config);
        }
        None => {
            next.x = focus.x;
            next.y = focus.y;
            next.scale = target_scale;
            next.vx = 0.0;
            next.vy = 0.0;
            next.v_scale = 0.0;
        }
    }
    next.last_time_ms = Some(input.timeline_ms);
    next.last_source_time_ms = Some(input.source_time_ms);

    if next.scale < 1.0 {
        next.scale = 1.0;
        next.v_scale = next.v_scale.max(0.0);
    }
    let scale = next.scale;

    let mut center = clamp_to_content(Point2D::new(next.x, next.y), scale, &input.overscan);
    let tracks_cursor = input.force_follow_cursor || input.zoom.is_some_and(|z| z.follow_cursor);
    if tracks_cursor {
        if let (Some(cursor), Some(glyph)) = (input.cursor, input.cursor_glyph.as_ref()) {
            center = clamp_to_cursor(center, scale, cursor, glyph, &input.overscan).center;
        }
    }

    // Pin the state to the clamp so velocity does not wind up against a wall.
    if center.x != next.x {
        next.x = center.x;
        next.vx = 0.0;
    }
    if center.y != next.y {
        next.y = center.y;
        next.vy = 0.0;
    }

    (
        next,
        CameraTransform {
            center_x: center.x,
            center_y: center.y,
            scale,
        },
    )
}

fn target_for(input: &CameraInput) -> (Point2D, f64) {
    let follow = |wants_cursor: bool, fallback: Point2D| match input.cursor {
        Some(cursor) if wants_cursor || input.force_follow_cursor => cursor,
        _ => fallback,
    };
    match input.zoom {
        Some(zoom) => (follow(zoom.follow_cursor, zoom.focus), zoom.effective_scale()),
        None => (follow(false, Point2D::CENTER), 1.0),
    }
}

/// Elapsed time to integrate: the source delta when usable, else the
/// timeline delta (still images, held frames), else `None` to snap.
fn integration_dt(
    state: &CameraPhysicsState,
    input: &CameraInput,
    config: &CameraDynamicsConfig,
) -> Option<f64> {
    let usable = |dt: f64| dt > 0.0 && dt <= config.max_step_ms;
    let source = state
        .last_source_time_ms
        .map(|last| input.source_time_ms - last)
        .filter(|dt| usable(*dt));
    source.or_else(|| {
        state
            .last_time_ms
            .map(|last| input.timeline_ms - last)
            .filter(|dt| usable(*dt))
    })
}

/// Ignore target motion within `ratio` of the half-window around the
/// camera center; beyond it, pull only far enough to put the target on the
/// dead-zone edge.
fn apply_dead_zone(state: &CameraPhysicsState, target: Point2D, ratio: f64) -> Point2D {
    if ratio <= 0.0 {
        return target;
    }
    let dead = ratio * half_window(state.scale);
    let axis = |camera: f64, target: f64| {
        let offset = target - camera;
        if offset.abs() <= dead {
            camera
        } else {
            target - dead * offset.signum()
        }
    };
    Point2D::new(axis(state.x, target.x), axis(state.y, target.y))
}

fn integrate(
    state: &mut CameraPhysicsState,
    focus: Point2D,
    target_scale: f64,
    dt_ms: f64,
    config: &CameraDynamicsConfig,
) {
    let substep_ms = if config.substep_ms > 0.0 {
        config.substep_ms
    } else {
        dt_ms
    };
    let substeps = ((dt_ms / substep_ms).ceil() as usize).clamp(1, MAX_SUBSTEPS);
    let h = dt_ms / 1000.0 / substeps as f64;
    let k = config.stiffness;
    let c = config.damping;
    let m = config.mass.max(1e-4);

    for _ in 0..substeps {
        let ax = (k * (focus.x - state.x) - c * state.vx) / m;
        let ay = (k * (focus.y - state.y) - c * state.vy) / m;
        let az = (k * (target_scale - state.scale) - c * state.v_scale) / m;
        state.vx += ax * h;
        state.vy += ay * h;
        state.v_scale += az * h;
        state.x += state.vx * h;
        state.y += state.vy * h;
        state.scale += state.v_scale * h;
    }
}
