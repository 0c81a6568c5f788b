use std::fmt;
use std::path::PathBuf;

use crate::errors::PathError;
use crate::types::Gesture;

/// Non-empty `/`-separated segments of a dataset-relative path.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Gesture of the instance addressed by `path` (third segment).
///
/// Paths too short to carry a gesture segment, and unknown gesture names,
/// read as `tap`.
pub fn gesture_from_path(path: &str) -> Gesture {
    segments(path)
        .get(2)
        .map_or(Gesture::Tap, |s| Gesture::from_segment(s))
}

/// App name (first segment) of a dataset-relative path.
pub fn app_of(path: &str) -> Option<&str> {
    segments(path).first().copied()
}

/// Validate a dataset-relative scope such as `""`, `"app"` or `"/app/screen"`.
pub fn relative_scope(path: &str) -> Result<PathBuf, PathError> {
    let mut out = PathBuf::new();
    for segment in segments(path) {
        check_segment(segment, path)?;
        out.push(segment);
    }
    Ok(out)
}

fn check_segment(segment: &str, path: &str) -> Result<(), PathError> {
    if segment == ".." || segment == "." || segment.contains('\\') || segment.contains(':') {
        return Err(PathError::Escapes(path.to_string()));
    }
    Ok(())
}

/// Address of one recorded gesture instance: `app/screen/gesture/number`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstancePath {
    pub app: String,
    pub screen: String,
    pub gesture_dir: String,
    pub number: String,
}

impl InstancePath {
    pub fn new(app: &str, screen: &str, gesture_dir: &str, number: &str) -> Self {
        Self {
            app: app.to_string(),
            screen: screen.to_string(),
            gesture_dir: gesture_dir.to_string(),
            number: number.to_string(),
        }
    }

    /// Parse a relative instance path. Anything after the fourth segment
    /// (e.g. a trailing `decision.txt`) is ignored.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let parts = segments(path);
        if parts.len() < 4 {
            return Err(PathError::NotAnInstance(path.to_string()));
        }
        for segment in &parts[..4] {
            check_segment(segment, path)?;
        }
        Ok(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }

    pub fn gesture(&self) -> Gesture {
        Gesture::from_segment(&self.gesture_dir)
    }

    pub fn relative(&self) -> PathBuf {
        [&self.app, &self.screen, &self.gesture_dir, &self.number]
            .iter()
            .collect()
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.app, self.screen, self.gesture_dir, self.number
        )
    }
}

impl std::str::FromStr for InstancePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
