//! Effect selection and inheritance.
//!
//! For each layout item the resolver picks at most one effect of every
//! exclusive kind plus all active non-exclusive effects. Clip-bound effects
//! are matched against the clip's source time, global effects against
//! timeline time.
//!
//! Generated overlay clips have no pixels of their own to frame. They take
//! the structural effects (zoom, screen, crop, background) of the nearest
//! preceding visual clip, sampled at that clip's last frame before the
//! overlay starts. Anything the overlay defines itself wins, kind by kind.

use clipcam_project_model::effect::{
    BackgroundEffectData, CropEffectData, CursorEffectData, Effect, EffectKind, ZoomEffectData,
};
use clipcam_project_model::project::{Clip, Recording, RecordingLookup};
use serde::Serialize;

use crate::layout::{FrameLayout, FrameLayoutItem};
use crate::resolver::{find_active_frame_layout_index, find_active_frame_layout_indices};

/// Effects in force for one clip at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedEffects {
    pub zoom: Option<Effect>,
    pub screen: Option<Effect>,
    pub crop: Option<Effect>,
    pub background: Option<Effect>,
    pub cursor: Vec<Effect>,
    pub annotations: Vec<Effect>,
}

impl ResolvedEffects {
    /// The selected effect of an exclusive kind.
    pub fn get(&self, kind: EffectKind) -> Option<&Effect> {
        match kind {
            EffectKind::Zoom => self.zoom.as_ref(),
            EffectKind::Screen => self.screen.as_ref(),
            EffectKind::Crop => self.crop.as_ref(),
            EffectKind::Background => self.background.as_ref(),
            EffectKind::Cursor => self.cursor.first(),
            EffectKind::Annotation => self.annotations.first(),
        }
    }

    fn slot_mut(&mut self, kind: EffectKind) -> Option<&mut Option<Effect>> {
        match kind {
            EffectKind::Zoom => Some(&mut self.zoom),
            EffectKind::Screen => Some(&mut self.screen),
            EffectKind::Crop => Some(&mut self.crop),
            EffectKind::Background => Some(&mut self.background),
            EffectKind::Cursor | EffectKind::Annotation => None,
        }
    }

    pub fn zoom_data(&self) -> Option<&ZoomEffectData> {
        self.zoom.as_ref().and_then(Effect::zoom)
    }

    pub fn crop_data(&self) -> Option<&CropEffectData> {
        self.crop.as_ref().and_then(Effect::crop)
    }

    pub fn background_data(&self) -> Option<&BackgroundEffectData> {
        self.background.as_ref().and_then(Effect::background)
    }

    /// Topmost cursor styling, if any.
    pub fn cursor_data(&self) -> Option<&CursorEffectData> {
        self.cursor.last().and_then(Effect::cursor)
    }

    pub fn has_zoom(&self) -> bool {
        self.zoom.is_some()
    }

    /// An enabled device mockup constrains the visible region.
    pub fn has_mockup(&self) -> bool {
        self.background_data()
            .and_then(BackgroundEffectData::active_mockup)
            .is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.zoom
            .iter()
            .chain(self.screen.iter())
            .chain(self.crop.iter())
            .chain(self.background.iter())
            .chain(self.cursor.iter())
            .chain(self.annotations.iter())
    }
}

/// Select the effects active for `clip`.
///
/// Clip-bound effects (for this clip only) are tested at `source_ms`,
/// global effects at `timeline_ms`. Among competing effects of an exclusive
/// kind a clip-bound effect beats a global one, then the later start wins,
/// then the later list position.
pub fn resolve_active_effects(
    effects: &[Effect],
    clip: &Clip,
    timeline_ms: f64,
    source_ms: f64,
) -> ResolvedEffects {
    let mut resolved = ResolvedEffects::default();

    for effect in effects {
        let active = match effect.clip_id.as_deref() {
            Some(owner) => owner == clip.id && effect.is_active_at(source_ms),
            None => effect.is_active_at(timeline_ms),
        };
        if !active {
            continue;
        }

        let kind = effect.kind();
        match resolved.slot_mut(kind) {
            Some(slot) => {
                let replace = match slot {
                    Some(current) => outranks(effect, current),
                    None => true,
                };
                if replace {
                    *slot = Some(effect.clone());
                }
            }
            None if kind == EffectKind::Cursor => resolved.cursor.push(effect.clone()),
            None => resolved.annotations.push(effect.clone()),
        }
    }

    resolved
}

/// `candidate` appears later in the list than `current`, so ties go to it.
fn outranks(candidate: &Effect, current: &Effect) -> bool {
    match (candidate.is_clip_bound(), current.is_clip_bound()) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.start_time >= current.start_time,
    }
}

/// Everything the renderer needs to draw one layout item at one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveClipData<'a> {
    pub layout_index: usize,
    #[serde(skip)]
    pub item: &'a FrameLayoutItem,
    pub clip: &'a Clip,
    pub recording: &'a Recording,
    pub timeline_ms: f64,
    pub source_time_ms: f64,
    pub effects: ResolvedEffects,
    /// Layout index of the visual clip structural effects were taken from.
    pub inherited_from: Option<usize>,
}

/// Resolve the active item at `frame` with its effects.
///
/// `None` when the layout is empty or the clip's recording is missing; the
/// caller decides whether to hold the previous frame.
pub fn resolve_effective_clip_data<'a, L>(
    frame: i64,
    layout: &'a FrameLayout,
    effects: &[Effect],
    recordings: &'a L,
) -> Option<EffectiveClipData<'a>>
where
    L: RecordingLookup + ?Sized,
{
    let index = find_active_frame_layout_index(layout, frame)?;
    resolve_item(layout, index, frame, effects, recordings)
}

/// Effective data for every item covering `frame`, bottom layer first.
pub fn resolve_effective_layers<'a, L>(
    frame: i64,
    layout: &'a FrameLayout,
    effects: &[Effect],
    recordings: &'a L,
) -> Vec<EffectiveClipData<'a>>
where
    L: RecordingLookup + ?Sized,
{
    find_active_frame_layout_indices(layout, frame)
        .into_iter()
        .filter_map(|index| resolve_item(layout, index, frame, effects, recordings))
        .collect()
}

fn resolve_item<'a, L>(
    layout: &'a FrameLayout,
    index: usize,
    frame: i64,
    effects: &[Effect],
    recordings: &'a L,
) -> Option<EffectiveClipData<'a>>
where
    L: RecordingLookup + ?Sized,
{
    let item = &layout[index];
    let Some(recording) = recordings.get_recording(&item.clip.recording_id) else {
        tracing::warn!(
            clip = %item.clip.id,
            recording = %item.clip.recording_id,
            "Clip references a missing recording"
        );
        return None;
    };

    let timeline_ms = layout.frame_to_ms(frame);
    let source_time_ms = item.source_time_at(frame, layout.fps());
    let mut resolved = resolve_active_effects(effects, &item.clip, timeline_ms, source_time_ms);

    let mut inherited_from = None;
    if !recording.source_type.is_visual() {
        if let Some(source_index) = find_visual_source(layout, index, recordings) {
            inherit_structural(&mut resolved, layout, source_index, item, effects);
            inherited_from = Some(source_index);
        }
    }

    Some(EffectiveClipData {
        layout_index: index,
        item,
        clip: &item.clip,
        recording,
        timeline_ms,
        source_time_ms,
        effects: resolved,
        inherited_from,
    })
}

/// Nearest earlier item backed by a video or image recording.
fn find_visual_source<L>(layout: &FrameLayout, index: usize, recordings: &L) -> Option<usize>
where
    L: RecordingLookup + ?Sized,
{
    let start = layout[index].start_frame;
    (0..index).rev().find(|&i| {
        let candidate = &layout[i];
        candidate.start_frame <= start
            && recordings
                .get_recording(&candidate.clip.recording_id)
                .is_some_and(|r| r.source_type.is_visual())
    })
}

fn inherit_structural(
    resolved: &mut ResolvedEffects,
    layout: &FrameLayout,
    source_index: usize,
    target: &FrameLayoutItem,
    effects: &[Effect],
) {
    let source = &layout[source_index];
    // Last frame of the source before the overlay began.
    let anchor = (source.end_frame.min(target.start_frame) - 1).max(source.start_frame);
    let from_source = resolve_active_effects(
        effects,
        &source.clip,
        layout.frame_to_ms(anchor),
        source.source_time_at(anchor, layout.fps()),
    );

    for kind in EffectKind::ALL.into_iter().filter(|k| k.is_inheritable()) {
        let Some(inherited) = from_source.get(kind) else {
            continue;
        };
        if let Some(slot) = resolved.slot_mut(kind) {
            // Only an effect bound to the overlay itself blocks inheritance;
            // a global one covering it gives way to the source's framing.
            let own = slot.as_ref().is_some_and(Effect::is_clip_bound);
            if !own {
                tracing::trace!(effect = %inherited.id, ?kind, "Inheriting structural effect");
                *slot = Some(inherited.stretched());
            }
        }
    }
}
