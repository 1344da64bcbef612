//! Frame layout construction.
//!
//! Converts an ordered clip list into frame-indexed layout items and marks
//! contiguous playback groups: maximal runs of clips from one recording
//! that can play back without a decoder seek.
//!
//! # Grouping rule
//!
//! A clip continues the current group iff, relative to the previous clip:
//! 1. it plays the same recording,
//! 2. the timeline gap between the previous `end_frame` and this
//!    `start_frame` is at most one frame,
//! 3. the source gap between the previous `source_out` and this
//!    `source_in` is at most 50 ms, and
//! 4. neither clip declares a transition at that boundary.

use std::ops::Index;

use clipcam_common::clock::FrameRate;
use clipcam_common::error::ClipcamResult;
use clipcam_project_model::project::{Clip, Track};
use serde::Serialize;

/// Largest timeline gap (frames) that still counts as contiguous.
pub const MAX_GROUP_FRAME_GAP: i64 = 1;

/// Largest source gap (ms) that still counts as contiguous.
pub const MAX_GROUP_SOURCE_GAP_MS: f64 = 50.0;

/// Synthetic identifier of a contiguous group, unique within one layout.
pub type GroupId = u32;

/// A clip's materialized placement in frame units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameLayoutItem {
    pub clip: Clip,
    /// Track the clip came from (0 for single-track layouts).
    pub track_index: usize,
    pub start_frame: i64,
    pub duration_frames: i64,
    /// Exclusive.
    pub end_frame: i64,
    pub group_id: GroupId,
    pub group_start_frame: i64,
    pub group_start_source_in: f64,
    /// Total frame span of the group. Identical on every member.
    pub group_duration: i64,
}

impl FrameLayoutItem {
    pub fn contains(&self, frame: i64) -> bool {
        self.start_frame <= frame && frame < self.end_frame
    }

    /// Source time (ms) displayed at `frame`, clamped to the clip's source
    /// range.
    pub fn source_time_at(&self, frame: i64, fps: f64) -> f64 {
        if fps <= 0.0 {
            return self.clip.source_in;
        }
        let offset_frames = (frame - self.start_frame).max(0);
        let offset_ms = offset_frames as f64 * 1000.0 / fps;
        let source = self.clip.source_in + offset_ms * self.clip.playback_rate;
        source.min(self.clip.source_out).max(self.clip.source_in)
    }
}

/// Layout items in non-decreasing `start_frame` order.
///
/// Alongside the items the layout keeps `reach[i] = max(end_frame[0..=i])`,
/// which bounds backward scans when items overlap across tracks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameLayout {
    fps: f64,
    items: Vec<FrameLayoutItem>,
    #[serde(skip)]
    reach: Vec<i64>,
}

impl FrameLayout {
    fn from_items(fps: f64, items: Vec<FrameLayoutItem>) -> Self {
        let mut reach = Vec::with_capacity(items.len());
        let mut running = i64::MIN;
        for item in &items {
            running = running.max(item.end_frame);
            reach.push(running);
        }
        Self { fps, items, reach }
    }

    /// Frame rate the layout was built at (0 for the empty fallback layout).
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn items(&self) -> &[FrameLayoutItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrameLayoutItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FrameLayoutItem> {
        self.items.get(index)
    }

    /// Largest `end_frame` among items `0..=index`.
    pub fn reach(&self, index: usize) -> i64 {
        self.reach[index]
    }

    /// Exclusive end of the whole layout.
    pub fn total_frames(&self) -> i64 {
        self.reach.last().copied().unwrap_or(0).max(0)
    }

    /// Start time of `frame` in timeline milliseconds.
    pub fn frame_to_ms(&self, frame: i64) -> f64 {
        if self.fps <= 0.0 {
            return 0.0;
        }
        clipcam_common::clock::frame_to_ms(frame, self.fps)
    }

    /// Members of a group, in order.
    pub fn group_items(&self, group_id: GroupId) -> impl Iterator<Item = &FrameLayoutItem> {
        self.items.iter().filter(move |item| item.group_id == group_id)
    }
}

impl Index<usize> for FrameLayout {
    type Output = FrameLayoutItem;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a FrameLayout {
    type Item = &'a FrameLayoutItem;
    type IntoIter = std::slice::Iter<'a, FrameLayoutItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Build a layout for a single track.
///
/// `clips` must already be in timeline order. An empty list yields an empty
/// layout; a non-positive fps is logged and also yields an empty layout.
pub fn build_frame_layout(clips: &[Clip], fps: f64) -> FrameLayout {
    match try_build_frame_layout(clips, fps) {
        Ok(layout) => layout,
        Err(e) => {
            tracing::warn!("Refusing to build frame layout: {}", e);
            FrameLayout::default()
        }
    }
}

/// Like [`build_frame_layout`] but rejects an invalid fps.
pub fn try_build_frame_layout(clips: &[Clip], fps: f64) -> ClipcamResult<FrameLayout> {
    let rate = FrameRate::new(fps)?;
    let mut next_group_id = 0;
    let items = layout_track(clips, rate, 0, &mut next_group_id);
    Ok(FrameLayout::from_items(rate.fps(), items))
}

/// Build one layout from several tracks, bottom-most first.
///
/// Each track is grouped independently; items from all tracks are then
/// merged by `start_frame`, with higher tracks after lower ones on ties.
pub fn build_multi_track_layout(tracks: &[Track], fps: f64) -> FrameLayout {
    let rate = match FrameRate::new(fps) {
        Ok(rate) => rate,
        Err(e) => {
            tracing::warn!("Refusing to build multi-track layout: {}", e);
            return FrameLayout::default();
        }
    };

    let mut next_group_id = 0;
    let mut items: Vec<FrameLayoutItem> = tracks
        .iter()
        .enumerate()
        .flat_map(|(track_index, track)| {
            layout_track(&track.sorted_clips(), rate, track_index, &mut next_group_id)
        })
        .collect();
    items.sort_by_key(|item| (item.start_frame, item.track_index));

    FrameLayout::from_items(rate.fps(), items)
}

fn layout_track(
    clips: &[Clip],
    rate: FrameRate,
    track_index: usize,
    next_group_id: &mut GroupId,
) -> Vec<FrameLayoutItem> {
    let mut items: Vec<FrameLayoutItem> = Vec::with_capacity(clips.len());
    let mut group_start = 0;

    for clip in clips {
        if !clip.start_time.is_finite() || !clip.duration.is_finite() {
            tracing::warn!(clip = %clip.id, "Skipping clip with non-finite timing");
            continue;
        }

        let start_frame = rate.ms_to_frame(clip.start_time);
        // Rounding the end (rather than the duration) keeps abutting clips
        // gap-free.
        let end_frame = rate.ms_to_frame(clip.end_time()).max(start_frame + 1);

        let continues = items
            .last()
            .map(|prev| continues_group(prev, clip, start_frame))
            .unwrap_or(false);

        if !continues {
            if !items.is_empty() {
                close_group(&mut items[group_start..]);
            }
            group_start = items.len();
            *next_group_id += 1;
        }

        let (group_start_frame, group_start_source_in) = match items.get(group_start) {
            Some(first) => (first.start_frame, first.clip.source_in),
            None => (start_frame, clip.source_in),
        };

        items.push(FrameLayoutItem {
            clip: clip.clone(),
            track_index,
            start_frame,
            duration_frames: end_frame - start_frame,
            end_frame,
            group_id: *next_group_id - 1,
            group_start_frame,
            group_start_source_in,
            group_duration: 0,
        });
    }

    if !items.is_empty() {
        close_group(&mut items[group_start..]);
    }

    items
}

fn continues_group(prev: &FrameLayoutItem, clip: &Clip, start_frame: i64) -> bool {
    prev.clip.recording_id == clip.recording_id
        && (start_frame - prev.end_frame).abs() <= MAX_GROUP_FRAME_GAP
        && (clip.source_in - prev.clip.source_out).abs() <= MAX_GROUP_SOURCE_GAP_MS
        && !prev.clip.has_transition_into(clip)
}

/// Back-fill the group span once the group's last member is known.
fn close_group(group: &mut [FrameLayoutItem]) {
    let (Some(first), Some(last)) = (group.first(), group.last()) else {
        return;
    };
    let span = last.end_frame - first.start_frame;
    tracing::trace!(
        group_id = first.group_id,
        members = group.len(),
        span,
        "Closed contiguous group"
    );
    for item in group.iter_mut() {
        item.group_duration = span;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipcam_project_model::project::{Transition, TransitionKind};
    use proptest::prelude::*;

    fn clip(id: &str, rec: &str, start: f64, duration: f64, source_in: f64) -> Clip {
        Clip::new(id, rec, start, duration, source_in)
    }

    #[test]
    fn test_empty_input_gives_empty_layout() {
        let layout = build_frame_layout(&[], 30.0);
        assert!(layout.is_empty());
        assert_eq!(layout.total_frames(), 0);
    }

    #[test]
    fn test_invalid_fps_is_rejected() {
        let clips = vec![clip("a", "r", 0.0, 1000.0, 0.0)];
        assert!(try_build_frame_layout(&clips, 0.0).is_err());
        assert!(try_build_frame_layout(&clips, -1.0).is_err());
        assert!(build_frame_layout(&clips, 0.0).is_empty());
    }

    #[test]
    fn test_contiguous_same_recording_forms_one_group() {
        let clips = vec![
            clip("a", "rec", 0.0, 1000.0, 0.0),
            clip("b", "rec", 1000.0, 2000.0, 1000.0),
        ];
        let layout = build_frame_layout(&clips, 30.0);

        assert_eq!(layout.len(), 2);
        assert_eq!((layout[0].start_frame, layout[0].end_frame), (0, 30));
        assert_eq!((layout[1].start_frame, layout[1].end_frame), (30, 90));
        assert_eq!(layout[0].group_id, layout[1].group_id);
        assert_eq!(layout[0].group_duration, 90);
        assert_eq!(layout[1].group_duration, 90);
        assert_eq!(layout[1].group_start_frame, 0);
        assert_eq!(layout[1].group_start_source_in, 0.0);
    }

    #[test]
    fn test_group_breaks() {
        // Different recording.
        let layout = build_frame_layout(
            &[clip("a", "r1", 0.0, 1000.0, 0.0), clip("b", "r2", 1000.0, 1000.0, 1000.0)],
            30.0,
        );
        assert_ne!(layout[0].group_id, layout[1].group_id);
        assert_eq!(layout[0].group_duration, 30);

        // Source jump larger than 50ms.
        let layout = build_frame_layout(
            &[clip("a", "r", 0.0, 1000.0, 0.0), clip("b", "r", 1000.0, 1000.0, 1051.0)],
            30.0,
        );
        assert_ne!(layout[0].group_id, layout[1].group_id);

        // Source jump within tolerance.
        let layout = build_frame_layout(
            &[clip("a", "r", 0.0, 1000.0, 0.0), clip("b", "r", 1000.0, 1000.0, 1040.0)],
            30.0,
        );
        assert_eq!(layout[0].group_id, layout[1].group_id);

        // Timeline gap of two frames.
        let layout = build_frame_layout(
            &[clip("a", "r", 0.0, 1000.0, 0.0), clip("b", "r", 1067.0, 1000.0, 1000.0)],
            30.0,
        );
        assert_ne!(layout[0].group_id, layout[1].group_id);

        // Transition at the boundary.
        let mut a = clip("a", "r", 0.0, 1000.0, 0.0);
        a.transition_out = Some(Transition {
            kind: TransitionKind::Fade,
            duration: 300.0,
        });
        let layout = build_frame_layout(&[a, clip("b", "r", 1000.0, 1000.0, 1000.0)], 30.0);
        assert_ne!(layout[0].group_id, layout[1].group_id);
    }

    #[test]
    fn test_group_back_fill_covers_three_members() {
        let clips = vec![
            clip("a", "r", 0.0, 500.0, 0.0),
            clip("b", "r", 500.0, 500.0, 500.0),
            clip("c", "r", 1000.0, 500.0, 1000.0),
            clip("d", "other", 1500.0, 500.0, 0.0),
        ];
        let layout = build_frame_layout(&clips, 60.0);
        let spans: Vec<i64> = layout.iter().map(|i| i.group_duration).collect();
        assert_eq!(spans, vec![90, 90, 90, 30]);
        assert_eq!(layout.group_items(layout[0].group_id).count(), 3);
    }

    #[test]
    fn test_tiny_clip_gets_one_frame() {
        let layout = build_frame_layout(&[clip("a", "r", 0.0, 1.0, 0.0)], 30.0);
        assert_eq!(layout[0].duration_frames, 1);
        assert_eq!(layout[0].end_frame, 1);
    }

    #[test]
    fn test_multi_track_merges_by_start() {
        let tracks = vec![
            Track::new("bg", vec![clip("bg", "r1", 0.0, 3000.0, 0.0)]),
            Track::new(
                "fg",
                vec![clip("fg1", "r2", 0.0, 500.0, 0.0), clip("fg2", "r2", 1000.0, 500.0, 0.0)],
            ),
        ];
        let layout = build_multi_track_layout(&tracks, 30.0);
        let ids: Vec<&str> = layout.iter().map(|i| i.clip.id.as_str()).collect();
        assert_eq!(ids, vec!["bg", "fg1", "fg2"]);
        assert_eq!(layout.total_frames(), 90);
        assert_eq!(layout.reach(1), 90);
        assert_ne!(layout[1].group_id, layout[2].group_id);
    }

    #[test]
    fn test_source_time_at_frame() {
        let layout = build_frame_layout(&[clip("a", "r", 0.0, 1000.0, 2000.0)], 30.0);
        assert_eq!(layout[0].source_time_at(0, 30.0), 2000.0);
        assert!((layout[0].source_time_at(15, 30.0) - 2500.0).abs() < 1e-9);
        assert_eq!(layout[0].source_time_at(500, 30.0), 3000.0);
    }

    fn sorted_clips() -> impl Strategy<Value = Vec<Clip>> {
        prop::collection::vec((1.0f64..5000.0, 0usize..3, 0.0f64..200.0), 1..20).prop_map(
            |specs| {
                let mut t = 0.0;
                let mut source = 0.0;
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (duration, rec, jump))| {
                        let c = Clip::new(format!("c{i}"), format!("r{rec}"), t, duration, source + jump);
                        t += duration;
                        source = c.source_out;
                        c
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn layout_covers_timeline_without_gaps(clips in sorted_clips(), fps in prop::sample::select(vec![24.0, 30.0, 59.94, 60.0])) {
            let layout = build_frame_layout(&clips, fps);
            prop_assert_eq!(layout.len(), clips.len());
            prop_assert_eq!(layout[0].start_frame, 0);
            for pair in layout.items().windows(2) {
                prop_assert!(pair[0].start_frame <= pair[1].start_frame);
                prop_assert!(pair[1].start_frame <= pair[0].end_frame);
            }
            for item in layout.iter() {
                prop_assert!(item.duration_frames >= 1);
            }
        }

        #[test]
        fn group_duration_is_shared_and_equals_span(clips in sorted_clips()) {
            let layout = build_frame_layout(&clips, 30.0);
            for item in layout.iter() {
                let members: Vec<&FrameLayoutItem> = layout.group_items(item.group_id).collect();
                let span = members.last().unwrap().end_frame - members[0].start_frame;
                prop_assert_eq!(item.group_duration, span);
                prop_assert_eq!(item.group_start_frame, members[0].start_frame);
            }
        }
    }
}
