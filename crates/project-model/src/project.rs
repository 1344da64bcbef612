//! Project, recording and clip types.
//!
//! A project ties together ingested recordings, the clips placed on its
//! tracks, the flat effect list, and output settings. The timeline engine
//! only reads these types; persistence belongs to the host application.

use std::collections::HashMap;

use clipcam_common::config::CameraDynamicsConfig;
use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::event::RecordingMetadata;

/// What kind of media a recording holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Video,
    Image,
    /// Synthetic overlay content with no telemetry or pixels of its own.
    Generated,
}

impl SourceType {
    /// Video and image recordings are persisted visual sources.
    pub fn is_visual(self) -> bool {
        match self {
            SourceType::Video | SourceType::Image => true,
            SourceType::Generated => false,
        }
    }
}

/// An ingested media source. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub id: String,
    pub width: u32,
    pub height: u32,
    /// Duration in ms.
    pub duration: f64,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecordingMetadata>,
}

impl Recording {
    pub fn new(id: impl Into<String>, width: u32, height: u32, duration: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            duration,
            source_type: SourceType::Video,
            metadata: None,
        }
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_metadata(mut self, metadata: RecordingMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Width / height, defaulting to 16:9 for degenerate sizes.
    pub fn aspect(&self) -> f64 {
        if self.width == 0 || self.height == 0 {
            return 16.0 / 9.0;
        }
        self.width as f64 / self.height as f64
    }
}

/// Transition style at a clip boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Fade,
    Dissolve,
    Wipe,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub kind: TransitionKind,
    pub duration: f64,
}

/// A placement of a recording range on a track. Immutable per version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,
    pub recording_id: String,
    /// Timeline start (ms).
    pub start_time: f64,
    /// Timeline duration (ms).
    pub duration: f64,
    /// Source range (ms).
    pub source_in: f64,
    pub source_out: f64,
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_in: Option<Transition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_out: Option<Transition>,
}

fn default_playback_rate() -> f64 {
    1.0
}

impl Clip {
    /// A clip playing `source_in..source_in + duration` at normal speed.
    pub fn new(
        id: impl Into<String>,
        recording_id: impl Into<String>,
        start_time: f64,
        duration: f64,
        source_in: f64,
    ) -> Self {
        Self {
            id: id.into(),
            recording_id: recording_id.into(),
            start_time,
            duration,
            source_in,
            source_out: source_in + duration,
            playback_rate: 1.0,
            transition_in: None,
            transition_out: None,
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Source time shown at `timeline_ms`, clamped to the source range.
    pub fn source_time_at(&self, timeline_ms: f64) -> f64 {
        let offset = (timeline_ms - self.start_time).max(0.0);
        let source = self.source_in + offset * self.playback_rate;
        source.min(self.source_out).max(self.source_in)
    }

    /// Whether either side of the boundary between `self` and `next`
    /// declares a transition.
    pub fn has_transition_into(&self, next: &Clip) -> bool {
        self.transition_out.is_some() || next.transition_in.is_some()
    }

    /// Check the record invariants.
    pub fn validate(&self) -> Result<(), ProjectError> {
        if !(self.duration > 0.0) {
            return Err(ProjectError::ValidationError {
                message: format!("clip {} has non-positive duration {}", self.id, self.duration),
            });
        }
        if self.source_out < self.source_in {
            return Err(ProjectError::ValidationError {
                message: format!(
                    "clip {} has source_out {} before source_in {}",
                    self.id, self.source_out, self.source_in
                ),
            });
        }
        if !(self.playback_rate > 0.0) {
            return Err(ProjectError::ValidationError {
                message: format!("clip {} has playback rate {}", self.id, self.playback_rate),
            });
        }
        Ok(())
    }
}

/// An ordered lane of clips. The track owns timeline placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub clips: Vec<Clip>,
}

impl Track {
    pub fn new(id: impl Into<String>, clips: Vec<Clip>) -> Self {
        Self {
            id: id.into(),
            clips,
        }
    }

    /// Clips sorted by start time.
    pub fn sorted_clips(&self) -> Vec<Clip> {
        let mut clips = self.clips.clone();
        clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        clips
    }
}

/// Output composition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub camera: CameraDynamicsConfig,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            fps: 30.0,
            width: 1920,
            height: 1080,
            camera: CameraDynamicsConfig::default(),
        }
    }
}

/// Top-level project as handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub settings: ProjectSettings,
    #[serde(default)]
    pub recordings: Vec<Recording>,
    /// Bottom-most track first.
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            settings: ProjectSettings::default(),
            recordings: vec![],
            tracks: vec![],
            effects: vec![],
        }
    }

    /// Parse a project dump.
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        serde_json::from_str(json).map_err(|source| ProjectError::ParseError { source })
    }

    /// All clips across tracks that violate their invariants, or reference
    /// unknown recordings.
    pub fn validate(&self) -> Vec<ProjectError> {
        let mut errors = vec![];
        for clip in self.tracks.iter().flat_map(|t| t.clips.iter()) {
            if let Err(e) = clip.validate() {
                errors.push(e);
            }
            if self.get_recording(&clip.recording_id).is_none() {
                errors.push(ProjectError::ValidationError {
                    message: format!(
                        "clip {} references missing recording {}",
                        clip.id, clip.recording_id
                    ),
                });
            }
        }
        errors
    }
}

/// Recording lookup by id. Clips hold a weak reference to their recording.
pub trait RecordingLookup {
    fn get_recording(&self, id: &str) -> Option<&Recording>;
}

impl RecordingLookup for Project {
    fn get_recording(&self, id: &str) -> Option<&Recording> {
        self.recordings.get_recording(id)
    }
}

impl RecordingLookup for [Recording] {
    fn get_recording(&self, id: &str) -> Option<&Recording> {
        self.iter().find(|r| r.id == id)
    }
}

impl RecordingLookup for Vec<Recording> {
    fn get_recording(&self, id: &str) -> Option<&Recording> {
        self.as_slice().get_recording(id)
    }
}

impl RecordingLookup for HashMap<String, Recording> {
    fn get_recording(&self, id: &str) -> Option<&Recording> {
        self.get(id)
    }
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Parse error: {source}")]
    ParseError { source: serde_json::Error },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}
