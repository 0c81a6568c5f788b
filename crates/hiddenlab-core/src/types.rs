use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gesture performed on a recorded screen element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    Tap,
    DoubleTap,
    LongPress,
    SwipeLeft,
    SwipeRight,
    ScrollDown,
    ScrollUp,
    PinchZoomIn,
    PinchZoomOut,
}

impl Gesture {
    pub const ALL: [Gesture; 9] = [
        Gesture::Tap,
        Gesture::DoubleTap,
        Gesture::LongPress,
        Gesture::SwipeLeft,
        Gesture::SwipeRight,
        Gesture::ScrollDown,
        Gesture::ScrollUp,
        Gesture::PinchZoomIn,
        Gesture::PinchZoomOut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Gesture::Tap => "tap",
            Gesture::DoubleTap => "double_tap",
            Gesture::LongPress => "long_press",
            Gesture::SwipeLeft => "swipe_left",
            Gesture::SwipeRight => "swipe_right",
            Gesture::ScrollDown => "scroll_down",
            Gesture::ScrollUp => "scroll_up",
            Gesture::PinchZoomIn => "pinch_zoom_in",
            Gesture::PinchZoomOut => "pinch_zoom_out",
        }
    }

    /// Gesture named by a path segment. Unknown names fall back to `Tap`.
    pub fn from_segment(segment: &str) -> Self {
        segment.parse().unwrap_or(Gesture::Tap)
    }

    /// Whether reviewers pick during/after frames for this gesture.
    pub fn supports_frame_selection(self) -> bool {
        matches!(
            self,
            Gesture::LongPress | Gesture::PinchZoomIn | Gesture::PinchZoomOut
        )
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gesture {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gesture::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// Yes/no answer recorded for `isCorrect` and `isHidden`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    #[serde(rename = "o")]
    Yes,
    #[serde(rename = "x")]
    No,
    #[serde(rename = "none")]
    Unset,
}

impl Mark {
    pub fn as_str(self) -> &'static str {
        match self {
            Mark::Yes => "o",
            Mark::No => "x",
            Mark::Unset => "none",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mark {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "o" => Ok(Mark::Yes),
            "x" => Ok(Mark::No),
            "none" => Ok(Mark::Unset),
            other => Err(UnknownName(other.to_string())),
        }
    }
}

/// The fixed tag set for decision records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    #[serde(rename = "isCorrect")]
    IsCorrect,
    #[serde(rename = "isHidden")]
    IsHidden,
    #[serde(rename = "elementType")]
    ElementType,
    #[serde(rename = "D/A")]
    DuringAfter,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::IsCorrect,
        RecordKind::IsHidden,
        RecordKind::ElementType,
        RecordKind::DuringAfter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::IsCorrect => "isCorrect",
            RecordKind::IsHidden => "isHidden",
            RecordKind::ElementType => "elementType",
            RecordKind::DuringAfter => "D/A",
        }
    }

    /// Kinds whose decision is a [`Mark`].
    pub fn is_mark(self) -> bool {
        matches!(self, RecordKind::IsCorrect | RecordKind::IsHidden)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// Element categories offered to reviewers. Free-form values are also accepted.
pub mod element {
    pub const BORDER: &str = "border";
    pub const TEXT: &str = "text";
    pub const ICON: &str = "icon";
    pub const IMAGE_OR_VIDEO: &str = "imageOrVideo";
    pub const EMPTY_SPACE: &str = "emptySpace";

    pub const KNOWN: [&str; 5] = [BORDER, TEXT, ICON, IMAGE_OR_VIDEO, EMPTY_SPACE];

    /// Categories that carry no affordance of their own.
    pub fn is_signal_free(option: &str) -> bool {
        option == IMAGE_OR_VIDEO || option == EMPTY_SPACE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown name: {0}")]
pub struct UnknownName(pub String);
