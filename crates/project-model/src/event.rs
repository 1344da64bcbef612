//! Telemetry event types recorded alongside a screen capture.
//!
//! Timestamps are milliseconds relative to the start of the recording and
//! are monotonic within each stream. Pointer coordinates are in recording
//! pixels; consumers normalize against [`crate::Recording`] dimensions.

use serde::{Deserialize, Serialize};

/// Milliseconds since recording start.
pub type TimestampMs = f64;

/// Anything carrying a recording-relative timestamp.
pub trait Timestamped {
    fn timestamp(&self) -> TimestampMs;
}

/// Sub-slice of a time-sorted stream whose timestamps fall in `[start, end]`.
pub fn events_in_range<T: Timestamped>(events: &[T], start: TimestampMs, end: TimestampMs) -> &[T] {
    if end < start {
        return &[];
    }
    let lo = events.partition_point(|e| e.timestamp() < start);
    let hi = events.partition_point(|e| e.timestamp() <= end);
    &events[lo..hi.max(lo)]
}

/// A single recorded input event, as stored in the JSONL event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Milliseconds since recording start.
    #[serde(rename = "t")]
    pub timestamp: TimestampMs,

    #[serde(flatten)]
    pub kind: EventKind,
}

/// Discriminated union of event types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Pointer position update.
    Mouse { x: f64, y: f64 },

    /// Mouse button press.
    Click { button: MouseButton, x: f64, y: f64 },

    /// Key press.
    Key {
        key: String,
        #[serde(default)]
        modifiers: Vec<String>,
    },

    /// Scroll wheel / trackpad scroll.
    Scroll { dx: f64, dy: f64 },
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    pub timestamp: TimestampMs,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub timestamp: TimestampMs,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub button: MouseButton,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardEvent {
    pub timestamp: TimestampMs,
    pub key: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollEvent {
    pub timestamp: TimestampMs,
    pub dx: f64,
    pub dy: f64,
}

impl MouseEvent {
    pub fn new(timestamp: TimestampMs, x: f64, y: f64) -> Self {
        Self { timestamp, x, y }
    }
}

impl ClickEvent {
    pub fn new(timestamp: TimestampMs, x: f64, y: f64) -> Self {
        Self {
            timestamp,
            x,
            y,
            button: MouseButton::Left,
        }
    }
}

impl KeyboardEvent {
    pub fn new(timestamp: TimestampMs, key: impl Into<String>) -> Self {
        Self {
            timestamp,
            key: key.into(),
            modifiers: vec![],
        }
    }

    /// Whether this key press produces text, as opposed to a shortcut or a
    /// navigation key.
    pub fn is_typing(&self) -> bool {
        let shortcut = self.modifiers.iter().any(|m| {
            matches!(
                m.to_ascii_lowercase().as_str(),
                "ctrl" | "control" | "cmd" | "meta" | "command" | "alt" | "option"
            )
        });
        if shortcut {
            return false;
        }
        self.key.chars().count() == 1
            || matches!(self.key.as_str(), "Space" | "Backspace" | "Enter" | "Tab")
    }
}

macro_rules! impl_timestamped {
    ($($ty:ty),*) => {
        $(impl Timestamped for $ty {
            fn timestamp(&self) -> TimestampMs {
                self.timestamp
            }
        })*
    };
}

impl_timestamped!(InputEvent, MouseEvent, ClickEvent, KeyboardEvent, ScrollEvent);

/// Per-kind telemetry streams attached to a recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingMetadata {
    pub mouse_events: Vec<MouseEvent>,
    pub click_events: Vec<ClickEvent>,
    pub keyboard_events: Vec<KeyboardEvent>,
    pub scroll_events: Vec<ScrollEvent>,
}

impl RecordingMetadata {
    /// Split a mixed event log into per-kind streams, sorted by time.
    pub fn from_events(events: &[InputEvent]) -> Self {
        let mut metadata = Self::default();
        for event in events {
            let timestamp = event.timestamp;
            match &event.kind {
                EventKind::Mouse { x, y } => {
                    metadata.mouse_events.push(MouseEvent::new(timestamp, *x, *y))
                }
                EventKind::Click { button, x, y } => metadata.click_events.push(ClickEvent {
                    timestamp,
                    x: *x,
                    y: *y,
                    button: *button,
                }),
                EventKind::Key { key, modifiers } => metadata.keyboard_events.push(KeyboardEvent {
                    timestamp,
                    key: key.clone(),
                    modifiers: modifiers.clone(),
                }),
                EventKind::Scroll { dx, dy } => metadata.scroll_events.push(ScrollEvent {
                    timestamp,
                    dx: *dx,
                    dy: *dy,
                }),
            }
        }
        metadata.sort_by_time();
        metadata
    }

    /// Stable sort of every stream by timestamp.
    pub fn sort_by_time(&mut self) {
        fn by_time<T: Timestamped>(a: &T, b: &T) -> std::cmp::Ordering {
            a.timestamp().total_cmp(&b.timestamp())
        }
        self.mouse_events.sort_by(by_time);
        self.click_events.sort_by(by_time);
        self.keyboard_events.sort_by(by_time);
        self.scroll_events.sort_by(by_time);
    }

    pub fn is_empty(&self) -> bool {
        self.mouse_events.is_empty()
            && self.click_events.is_empty()
            && self.keyboard_events.is_empty()
            && self.scroll_events.is_empty()
    }
}

/// Parse events from JSONL content (one JSON object per line).
/// Blank lines and `#` header lines are skipped.
pub fn parse_events(jsonl: &str) -> Result<Vec<InputEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_mixed_jsonl() {
        let jsonl = "# header\n\
            {\"t\":0,\"type\":\"mouse\",\"x\":10,\"y\":20}\n\
            {\"t\":5,\"type\":\"click\",\"button\":\"left\",\"x\":11,\"y\":21}\n\
            {\"t\":7,\"type\":\"key\",\"key\":\"a\"}\n\
            \n\
            {\"t\":9,\"type\":\"scroll\",\"dx\":0,\"dy\":-3}\n";
        let events = parse_events(jsonl).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[1].kind, EventKind::Click { button: MouseButton::Left, x: 11.0, y: 21.0 });
    }

    #[test]
    fn test_from_events_splits_and_sorts() {
        let events = vec![
            InputEvent { timestamp: 20.0, kind: EventKind::Mouse { x: 2.0, y: 2.0 } },
            InputEvent { timestamp: 10.0, kind: EventKind::Mouse { x: 1.0, y: 1.0 } },
            InputEvent {
                timestamp: 15.0,
                kind: EventKind::Key { key: "b".into(), modifiers: vec![] },
            },
        ];
        let metadata = RecordingMetadata::from_events(&events);
        assert_eq!(metadata.mouse_events.len(), 2);
        assert_eq!(metadata.mouse_events[0].timestamp, 10.0);
        assert_eq!(metadata.keyboard_events.len(), 1);
        assert!(metadata.click_events.is_empty());
        assert!(!metadata.is_empty());
    }

    #[test]
    fn test_events_in_range_is_inclusive() {
        let events: Vec<MouseEvent> = (0..10)
            .map(|i| MouseEvent::new(i as f64 * 10.0, 0.0, 0.0))
            .collect();
        let window = events_in_range(&events, 20.0, 50.0);
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].timestamp, 20.0);
        assert!(events_in_range(&events, 50.0, 20.0).is_empty());
        assert!(events_in_range(&events, 200.0, 300.0).is_empty());
    }

    #[test]
    fn test_shortcuts_are_not_typing() {
        assert!(KeyboardEvent::new(0.0, "a").is_typing());
        assert!(KeyboardEvent::new(0.0, "Space").is_typing());
        assert!(!KeyboardEvent::new(0.0, "ArrowLeft").is_typing());
        let shortcut = KeyboardEvent {
            timestamp: 0.0,
            key: "c".into(),
            modifiers: vec!["Cmd".into()],
        };
        assert!(!shortcut.is_typing());
    }

    proptest! {
        #[test]
        fn events_in_range_matches_linear_filter(
            mut times in proptest::collection::vec(0.0f64..1000.0, 0..40),
            start in -50.0f64..1050.0,
            len in 0.0f64..500.0,
        ) {
            times.sort_by(f64::total_cmp);
            let events: Vec<MouseEvent> = times.iter().map(|&t| MouseEvent::new(t, 0.0, 0.0)).collect();
            let end = start + len;
            let window = events_in_range(&events, start, end);
            let expected = events.iter().filter(|e| e.timestamp >= start && e.timestamp <= end).count();
            prop_assert_eq!(window.len(), expected);
            prop_assert!(window.iter().all(|e| e.timestamp >= start && e.timestamp <= end));
        }
    }
}
