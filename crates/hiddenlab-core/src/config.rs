use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Workspace config location, relative to the working directory.
pub const WORKSPACE_CONFIG: &str = ".hiddenlab/config.json";

/// Environment override for the dataset root.
pub const ROOT_ENV: &str = "HIDDENLAB_DATASET_ROOT";

/// Rank given to images missing from `frame_order`.
pub const UNRANKED_FRAME: u32 = 99;

/// Review workspace settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub dataset_root: PathBuf,
    pub decision_file: String,
    pub path_file: String,
    pub image_extensions: Vec<String>,
    pub frame_order: BTreeMap<String, u32>,
    pub selectable_frames: Vec<String>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        let frame_order = [
            ("before.png", 1),
            ("before_annotated.png", 2),
            ("before_annotated_with_children.png", 2),
            ("during.png", 3),
            ("after.png", 4),
        ]
        .into_iter()
        .map(|(name, rank)| (name.to_string(), rank))
        .collect();

        Self {
            dataset_root: PathBuf::from("dataset"),
            decision_file: "decision.txt".into(),
            path_file: "path.txt".into(),
            image_extensions: ["jpg", "jpeg", "png", "gif", "webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            frame_order,
            selectable_frames: vec!["during".into(), "after".into()],
        }
    }
}

impl ReviewConfig {
    /// Load a config file. Fields missing from the file take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `.hiddenlab/config.json` under `dir`, or defaults when absent.
    pub fn load_workspace(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(WORKSPACE_CONFIG);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Apply root overrides: explicit flag first, then the environment value.
    pub fn with_root_override(mut self, flag: Option<PathBuf>, env: Option<String>) -> Self {
        if let Some(root) = flag {
            self.dataset_root = root;
        } else if let Some(root) = env.filter(|r| !r.trim().is_empty()) {
            self.dataset_root = PathBuf::from(root);
        }
        self
    }

    pub fn is_image(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.image_extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }

    pub fn frame_rank(&self, file_name: &str) -> u32 {
        self.frame_order
            .get(file_name)
            .copied()
            .unwrap_or(UNRANKED_FRAME)
    }

    pub fn is_selectable_frame(&self, stem: &str) -> bool {
        self.selectable_frames.iter().any(|f| f == stem)
    }
}
