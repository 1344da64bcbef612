//! Zoom-block detection from interaction telemetry.
//!
//! Finds stretches of a recording worth zooming into and proposes a scale
//! and focus point for each.
//!
//! # Algorithm
//!
//! 1. **Candidates** from three sources: click clusters, typing bursts, and
//!    pointer dwell (see [`crate::motion_cluster`]).
//! 2. **Scroll suppression**: candidates overlapping scrolling are dropped,
//!    since the content under the focus point is moving.
//! 3. **Padding**: each candidate gets pre/post roll and a minimum length,
//!    clamped to the source window.
//! 4. **Merge** overlapping candidates, keeping the stronger focus point.
//! 5. **Spacing**: enforce the minimum gap between blocks, keeping the
//!    stronger of two close candidates.
//! 6. **Rate cap**: at most `max_zooms_per_minute` blocks in any 60 s span.

use std::ops::Range;

use clipcam_common::config::ZoomDetectionSettings;
use clipcam_common::math::clamp01;
use clipcam_project_model::effect::{Effect, EffectData, ZoomEffectData, ZoomFollow};
use clipcam_project_model::event::{
    events_in_range, ClickEvent, KeyboardEvent, MouseEvent, RecordingMetadata,
};
use clipcam_project_model::viewport::Point2D;
use serde::{Deserialize, Serialize};

use crate::cursor_smooth::interpolate_mouse_position;
use crate::cache::TelemetryCaches;
use crate::motion_cluster::{detect_motion_clusters, detect_motion_clusters_cached, MotionCluster, MotionClusterConfig};

/// Generation defaults for zoom detection.
#[derive(Debug, Clone)]
pub struct ZoomDetectionConfig {
    pub enabled: bool,
    pub max_zooms_per_minute: f64,
    /// Minimum time between the end of one block and the start of the next.
    pub min_gap_ms: f64,
    /// Scale proposed for click and dwell blocks.
    pub default_scale: f64,
    /// Scale proposed for typing bursts; text needs less magnification.
    pub typing_scale: f64,
    /// Clicks closer than this in time belong to one cluster.
    pub click_window_ms: f64,
    /// Clicks further apart than this (normalized) start a new cluster.
    pub click_radius: f64,
    pub min_clicks: usize,
    /// Key presses closer than this belong to one burst.
    pub typing_gap_ms: f64,
    pub min_typing_keys: usize,
    pub dwell: MotionClusterConfig,
    pub pre_roll_ms: f64,
    pub post_roll_ms: f64,
    pub min_block_ms: f64,
    pub intro_ms: f64,
    pub outro_ms: f64,
}

impl Default for ZoomDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_zooms_per_minute: 4.0,
            min_gap_ms: 2000.0,
            default_scale: 2.0,
            typing_scale: 1.6,
            click_window_ms: 1500.0,
            click_radius: 0.12,
            min_clicks: 2,
            typing_gap_ms: 800.0,
            min_typing_keys: 5,
            dwell: MotionClusterConfig {
                min_duration_ms: 1500.0,
                ..Default::default()
            },
            pre_roll_ms: 400.0,
            post_roll_ms: 800.0,
            min_block_ms: 1500.0,
            intro_ms: 500.0,
            outro_ms: 500.0,
        }
    }
}

impl ZoomDetectionConfig {
    /// Apply UI settings on top of these defaults. Any `Some` value wins.
    pub fn with_overrides(&self, settings: &ZoomDetectionSettings) -> Self {
        let mut merged = self.clone();
        if let Some(enabled) = settings.enabled {
            merged.enabled = enabled;
        }
        if let Some(max) = settings.max_zooms_per_minute {
            merged.max_zooms_per_minute = max;
        }
        if let Some(gap) = settings.min_gap_ms {
            merged.min_gap_ms = gap;
        }
        if let Some(scale) = settings.default_scale {
            merged.default_scale = scale;
        }
        merged
    }
}

/// Why a block was proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomReason {
    ClickCluster,
    TypingBurst,
    Dwell,
}

/// A proposed automatic zoom, in recording source time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomBlock {
    pub start_time: f64,
    pub end_time: f64,
    pub scale: f64,
    /// Normalized focus point.
    pub target_x: f64,
    pub target_y: f64,
    pub intro_ms: f64,
    pub outro_ms: f64,
    pub reason: ZoomReason,
}

impl ZoomBlock {
    pub fn duration_ms(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// The persisted zoom effect for an accepted block, bound to the clip
    /// playing this recording.
    pub fn to_effect(&self, id: impl Into<String>, clip_id: impl Into<String>) -> Effect {
        Effect::new(
            id,
            self.start_time,
            self.end_time,
            EffectData::Zoom(ZoomEffectData {
                scale: self.scale,
                target_x: self.target_x,
                target_y: self.target_y,
                follow: ZoomFollow::Fixed,
                intro_ms: self.intro_ms,
                outro_ms: self.outro_ms,
                ..Default::default()
            }),
        )
        .bound_to(clip_id)
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    start: f64,
    end: f64,
    target: Point2D,
    scale: f64,
    score: f64,
    reason: ZoomReason,
}

/// Detect zoom blocks within `source_range` of a recording's telemetry.
///
/// Pointer coordinates are normalized against `(width, height)`. Streams
/// must be sorted by time.
pub fn detect_zoom_blocks(
    telemetry: &RecordingMetadata,
    source_range: Range<f64>,
    dims: (u32, u32),
    config: &ZoomDetectionConfig,
) -> Vec<ZoomBlock> {
    detect_with(telemetry, source_range, dims, config, |mouse, (width, height)| {
        detect_motion_clusters(mouse, width, height, &config.dwell)
    })
}

/// [`detect_zoom_blocks`] with dwell clusters read through the cluster
/// cache. `stream_id` names the recording `telemetry` belongs to.
pub fn detect_zoom_blocks_cached(
    caches: &TelemetryCaches,
    stream_id: &str,
    telemetry: &RecordingMetadata,
    source_range: Range<f64>,
    dims: (u32, u32),
    config: &ZoomDetectionConfig,
) -> Vec<ZoomBlock> {
    detect_with(telemetry, source_range, dims, config, |mouse, (width, height)| {
        detect_motion_clusters_cached(caches, stream_id, mouse, width, height, &config.dwell).to_vec()
    })
}

fn detect_with(
    telemetry: &RecordingMetadata,
    source_range: Range<f64>,
    (width, height): (u32, u32),
    config: &ZoomDetectionConfig,
    dwell_clusters: impl FnOnce(&[MouseEvent], (u32, u32)) -> Vec<MotionCluster>,
) -> Vec<ZoomBlock> {
    if !config.enabled || width == 0 || height == 0 || source_range.end <= source_range.start {
        return vec![];
    }

    let (lo, hi) = (source_range.start, source_range.end);
    let mouse = events_in_range(&telemetry.mouse_events, lo, hi);
    let clicks = events_in_range(&telemetry.click_events, lo, hi);
    let keys = events_in_range(&telemetry.keyboard_events, lo, hi);
    let scrolls = events_in_range(&telemetry.scroll_events, lo, hi);
    let dims = (width as f64, height as f64);

    let mut candidates = click_candidates(clicks, dims, config);
    candidates.extend(typing_candidates(keys, &telemetry.mouse_events, dims, config));
    candidates.extend(
        dwell_clusters(mouse, (width, height))
            .into_iter()
            .map(|cluster| Candidate {
                start: cluster.start_ms,
                end: cluster.end_ms,
                target: cluster.center,
                scale: config.default_scale,
                score: 1.0,
                reason: ZoomReason::Dwell,
            }),
    );

    let before_scroll = candidates.len();
    candidates.retain(|c| {
        !scrolls
            .iter()
            .any(|s| s.timestamp >= c.start && s.timestamp <= c.end)
    });
    if candidates.len() < before_scroll {
        tracing::debug!(
            dropped = before_scroll - candidates.len(),
            "Suppressed zoom candidates during scrolling"
        );
    }

    for c in &mut candidates {
        pad(c, lo, hi, config);
    }
    candidates.sort_by(|a, b| a.start.total_cmp(&b.start));

    let merged = merge_overlapping(candidates);
    let spaced = enforce_min_gap(merged, config.min_gap_ms);
    let capped = enforce_rate_cap(spaced, config.max_zooms_per_minute);

    tracing::debug!(blocks = capped.len(), "Detected zoom blocks");

    capped
        .into_iter()
        .map(|c| {
            let half = (c.end - c.start) / 2.0;
            ZoomBlock {
                start_time: c.start,
                end_time: c.end,
                scale: c.scale.max(1.0),
                target_x: clamp01(c.target.x),
                target_y: clamp01(c.target.y),
                intro_ms: config.intro_ms.min(half),
                outro_ms: config.outro_ms.min(half),
                reason: c.reason,
            }
        })
        .collect()
}

fn click_candidates(
    clicks: &[ClickEvent],
    (w, h): (f64, f64),
    config: &ZoomDetectionConfig,
) -> Vec<Candidate> {
    let mut out = vec![];
    let mut run: Vec<&ClickEvent> = vec![];

    let mut flush = |run: &mut Vec<&ClickEvent>| {
        if run.len() >= config.min_clicks.max(1) {
            let n = run.len() as f64;
            out.push(Candidate {
                start: run[0].timestamp,
                end: run[run.len() - 1].timestamp,
                target: Point2D::new(
                    run.iter().map(|c| c.x / w).sum::<f64>() / n,
                    run.iter().map(|c| c.y / h).sum::<f64>() / n,
                ),
                scale: config.default_scale,
                score: 2.0 * n,
                reason: ZoomReason::ClickCluster,
            });
        }
        run.clear();
    };

    for click in clicks {
        if let Some(prev) = run.last() {
            let close_in_time = click.timestamp - prev.timestamp <= config.click_window_ms;
            let p = Point2D::new(click.x / w, click.y / h);
            let close_in_space = p.distance_to(&Point2D::new(run[0].x / w, run[0].y / h))
                <= config.click_radius;
            if !(close_in_time && close_in_space) {
                flush(&mut run);
            }
        }
        run.push(click);
    }
    flush(&mut run);

    out
}

fn typing_candidates(
    keys: &[KeyboardEvent],
    mouse: &[MouseEvent],
    (w, h): (f64, f64),
    config: &ZoomDetectionConfig,
) -> Vec<Candidate> {
    let typing: Vec<&KeyboardEvent> = keys.iter().filter(|k| k.is_typing()).collect();
    let mut out = vec![];
    let mut start = 0;

    for i in 0..=typing.len() {
        let breaks = i == typing.len()
            || (i > start && typing[i].timestamp - typing[i - 1].timestamp > config.typing_gap_ms);
        if !breaks {
            continue;
        }
        let burst = &typing[start..i];
        if burst.len() >= config.min_typing_keys {
            let first = burst[0].timestamp;
            // The text caret is usually near where the user last clicked or
            // parked the pointer.
            let target = interpolate_mouse_position(mouse, first)
                .map(|(x, y)| Point2D::new(x / w, y / h))
                .unwrap_or(Point2D::CENTER);
            out.push(Candidate {
                start: first,
                end: burst[burst.len() - 1].timestamp,
                target,
                scale: config.typing_scale,
                score: 1.0 + burst.len() as f64 / 10.0,
                reason: ZoomReason::TypingBurst,
            });
        }
        start = i;
    }

    out
}

fn pad(c: &mut Candidate, lo: f64, hi: f64, config: &ZoomDetectionConfig) {
    c.start -= config.pre_roll_ms;
    c.end += config.post_roll_ms;
    let short_by = config.min_block_ms - (c.end - c.start);
    if short_by > 0.0 {
        c.end += short_by;
    }
    c.start = c.start.max(lo);
    c.end = c.end.min(hi);
}

fn merge_overlapping(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        match merged.last_mut() {
            Some(prev) if c.start <= prev.end => {
                prev.end = prev.end.max(c.end);
                if c.score > prev.score {
                    prev.target = c.target;
                    prev.scale = c.scale;
                    prev.reason = c.reason;
                }
                prev.score += c.score;
            }
            _ => merged.push(c),
        }
    }
    merged
}

fn enforce_min_gap(candidates: Vec<Candidate>, min_gap_ms: f64) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        match kept.last_mut() {
            Some(prev) if c.start - prev.end < min_gap_ms => {
                if c.score > prev.score {
                    *prev = c;
                }
            }
            _ => kept.push(c),
        }
    }
    kept
}

fn enforce_rate_cap(candidates: Vec<Candidate>, max_per_minute: f64) -> Vec<Candidate> {
    const MINUTE_MS: f64 = 60_000.0;
    let cap = if max_per_minute.is_finite() {
        max_per_minute.max(0.0).floor() as usize
    } else {
        usize::MAX
    };

    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        let recent = kept
            .iter()
            .filter(|k| c.start - k.start < MINUTE_MS)
            .count();
        if recent < cap {
            kept.push(c);
        }
    }
    kept
}
