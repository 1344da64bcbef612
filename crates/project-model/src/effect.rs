//! Effects applied to clips over time.
//!
//! Effects form a flat list per project. Membership is by time range plus an
//! optional clip binding:
//! - **Global** effects (`clip_id = None`) use timeline milliseconds.
//! - **Clip-bound** effects use clip-relative source milliseconds.
//!
//! The payload is a closed sum type so that which kinds are exclusive and
//! which are inheritable is decided by exhaustive matches.

use clipcam_common::math::EasingFunction;
use serde::{Deserialize, Serialize};

use crate::viewport::Viewport;

/// A time-ranged, type-tagged effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: String,

    /// Inclusive start (ms).
    #[serde(with = "time_bound")]
    pub start_time: f64,

    /// Exclusive end (ms).
    #[serde(with = "time_bound")]
    pub end_time: f64,

    /// Owning clip, if this effect is clip-bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_id: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(flatten)]
    pub data: EffectData,
}

fn default_enabled() -> bool {
    true
}

/// Effect bounds as JSON numbers, with the open ends of inherited effects
/// written as `"Infinity"` / `"-Infinity"` (JSON has no infinite number).
mod time_bound {
    use std::fmt;

    use serde::{de, Deserializer, Serializer};

    const POS: &str = "Infinity";
    const NEG: &str = "-Infinity";

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if *value == f64::INFINITY {
            serializer.serialize_str(POS)
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str(NEG)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BoundVisitor;

        impl<'de> de::Visitor<'de> for BoundVisitor {
            type Value = f64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number of milliseconds, \"Infinity\" or \"-Infinity\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<f64, E> {
                match s {
                    POS => Ok(f64::INFINITY),
                    NEG => Ok(f64::NEG_INFINITY),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }
        }

        deserializer.deserialize_any(BoundVisitor)
    }
}

/// Type-tagged effect payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EffectData {
    Zoom(ZoomEffectData),
    Screen(ScreenEffectData),
    Crop(CropEffectData),
    Background(BackgroundEffectData),
    Cursor(CursorEffectData),
    Annotation(AnnotationEffectData),
}

/// Effect discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Zoom,
    Screen,
    Crop,
    Background,
    Cursor,
    Annotation,
}

impl EffectKind {
    pub const ALL: [EffectKind; 6] = [
        EffectKind::Zoom,
        EffectKind::Screen,
        EffectKind::Crop,
        EffectKind::Background,
        EffectKind::Cursor,
        EffectKind::Annotation,
    ];

    /// At most one effect of an exclusive kind applies to a clip at a time.
    pub fn is_exclusive(self) -> bool {
        match self {
            EffectKind::Zoom | EffectKind::Screen | EffectKind::Crop | EffectKind::Background => {
                true
            }
            EffectKind::Cursor | EffectKind::Annotation => false,
        }
    }

    /// Structural kinds that generated clips inherit from the visual source
    /// beneath them.
    pub fn is_inheritable(self) -> bool {
        match self {
            EffectKind::Zoom | EffectKind::Screen | EffectKind::Crop | EffectKind::Background => {
                true
            }
            EffectKind::Cursor | EffectKind::Annotation => false,
        }
    }
}

/// How a zoom picks its focus point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoomFollow {
    /// Hold `target_x` / `target_y`.
    #[default]
    Fixed,
    /// Track the smoothed cursor position.
    Cursor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomEffectData {
    pub scale: f64,
    /// Normalized focus point.
    pub target_x: f64,
    pub target_y: f64,
    pub follow: ZoomFollow,
    /// Ease-in duration from the effect start.
    pub intro_ms: f64,
    /// Ease-out duration before the effect end.
    pub outro_ms: f64,
    pub easing: EasingFunction,
}

impl Default for ZoomEffectData {
    fn default() -> Self {
        Self {
            scale: 2.0,
            target_x: 0.5,
            target_y: 0.5,
            follow: ZoomFollow::Fixed,
            intro_ms: 500.0,
            outro_ms: 500.0,
            easing: EasingFunction::EaseInOut,
        }
    }
}

/// 3D perspective applied to the screen plane.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenEffectData {
    pub preset: Option<String>,
    pub rotate_x_deg: f64,
    pub rotate_y_deg: f64,
    pub perspective_px: f64,
}

/// Normalized crop window of the source frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropEffectData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropEffectData {
    pub fn as_viewport(&self) -> Viewport {
        Viewport {
            x: self.x,
            y: self.y,
            w: self.width,
            h: self.height,
        }
    }
}

impl Default for CropEffectData {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

/// A device frame drawn around the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceMockup {
    pub enabled: bool,
    /// Mockup artwork size in pixels.
    pub frame_width: f64,
    pub frame_height: f64,
    /// The screen opening, normalized to the artwork.
    pub screen_region: Viewport,
}

impl Default for DeviceMockup {
    fn default() -> Self {
        Self {
            enabled: true,
            frame_width: 2000.0,
            frame_height: 1300.0,
            screen_region: Viewport {
                x: 0.06,
                y: 0.06,
                w: 0.88,
                h: 0.82,
            },
        }
    }
}

/// Canvas framing around the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundEffectData {
    /// Background color as hex string (for example `#1a1a1a`).
    pub color: String,
    /// Padding around the content in output pixels.
    pub padding: f64,
    pub corner_radius: f64,
    pub shadow_intensity: f64,
    pub mockup: Option<DeviceMockup>,
}

impl BackgroundEffectData {
    /// The mockup, if one is present and switched on.
    pub fn active_mockup(&self) -> Option<&DeviceMockup> {
        self.mockup.as_ref().filter(|m| m.enabled)
    }
}

impl Default for BackgroundEffectData {
    fn default() -> Self {
        Self {
            color: "#1a1a1a".to_string(),
            padding: 0.0,
            corner_radius: 12.0,
            shadow_intensity: 0.6,
            mockup: None,
        }
    }
}

/// Cursor rendering; glyph geometry also feeds camera visibility clamping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorEffectData {
    /// Glyph scale multiplier.
    pub size: f64,
    /// Unscaled glyph size in source pixels.
    pub glyph_width: f64,
    pub glyph_height: f64,
    /// Hotspot offset inside the glyph, in unscaled source pixels.
    pub hotspot_x: f64,
    pub hotspot_y: f64,
    pub hide_when_idle: bool,
}

impl Default for CursorEffectData {
    fn default() -> Self {
        Self {
            size: 1.0,
            glyph_width: 32.0,
            glyph_height: 32.0,
            hotspot_x: 4.0,
            hotspot_y: 2.0,
            hide_when_idle: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationEffectData {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl EffectData {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectData::Zoom(_) => EffectKind::Zoom,
            EffectData::Screen(_) => EffectKind::Screen,
            EffectData::Crop(_) => EffectKind::Crop,
            EffectData::Background(_) => EffectKind::Background,
            EffectData::Cursor(_) => EffectKind::Cursor,
            EffectData::Annotation(_) => EffectKind::Annotation,
        }
    }
}

impl Effect {
    /// A global, enabled effect.
    pub fn new(id: impl Into<String>, start_time: f64, end_time: f64, data: EffectData) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time,
            clip_id: None,
            enabled: true,
            data,
        }
    }

    /// Bind this effect to a clip; its range becomes clip-relative source time.
    pub fn bound_to(mut self, clip_id: impl Into<String>) -> Self {
        self.clip_id = Some(clip_id.into());
        self
    }

    pub fn kind(&self) -> EffectKind {
        self.data.kind()
    }

    pub fn is_clip_bound(&self) -> bool {
        self.clip_id.is_some()
    }

    /// Enabled and `time` lies in `[start_time, end_time)`.
    pub fn is_active_at(&self, time: f64) -> bool {
        self.enabled && self.start_time <= time && time < self.end_time
    }

    /// A copy active for all time.
    pub fn stretched(&self) -> Effect {
        Effect {
            start_time: f64::NEG_INFINITY,
            end_time: f64::INFINITY,
            ..self.clone()
        }
    }

    pub fn zoom(&self) -> Option<&ZoomEffectData> {
        match &self.data {
            EffectData::Zoom(data) => Some(data),
            _ => None,
        }
    }

    pub fn background(&self) -> Option<&BackgroundEffectData> {
        match &self.data {
            EffectData::Background(data) => Some(data),
            _ => None,
        }
    }

    pub fn crop(&self) -> Option<&CropEffectData> {
        match &self.data {
            EffectData::Crop(data) => Some(data),
            _ => None,
        }
    }

    pub fn cursor(&self) -> Option<&CursorEffectData> {
        match &self.data {
            EffectData::Cursor(data) => Some(data),
            _ => None,
        }
    }
}
