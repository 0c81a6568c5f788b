use std::path::PathBuf;

use crate::types::{Gesture, RecordKind};

/// Failure reading or writing an instance's decision file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: malformed decision records: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A relative dataset path that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path escapes the dataset root: {0}")]
    Escapes(String),
    #[error("not an instance path (expected app/screen/gesture/number): {0}")]
    NotAnInstance(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: invalid config JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejected edit of a record list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("{0} does not hold an o/x decision")]
    NotAMark(RecordKind),
    #[error("frame selection is not available for {0}")]
    NoFrameSelection(Gesture),
    #[error("frame '{0}' is not selectable")]
    FrameNotSelectable(String),
}
