use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use hiddenlab_core::errors::StoreError;
use hiddenlab_core::path::InstancePath;
use hiddenlab_core::record::RecordList;
use hiddenlab_core::traits::DecisionStore;
use tracing::debug;

use super::atomic::atomic_write;

/// Decision files stored inside each instance directory of a dataset tree.
#[derive(Debug, Clone)]
pub struct FsDecisionStore {
    root: PathBuf,
    file_name: String,
}

impl FsDecisionStore {
    pub fn new(root: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file_name: file_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn instance_dir(&self, instance: &InstancePath) -> PathBuf {
        self.root.join(instance.relative())
    }

    pub fn file_path(&self, instance: &InstancePath) -> PathBuf {
        self.instance_dir(instance).join(&self.file_name)
    }

    /// Read a decision file by absolute path.
    pub fn read_file(path: &Path) -> Result<RecordList, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RecordList::default()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        RecordList::parse(&content).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl DecisionStore for FsDecisionStore {
    fn read(&self, instance: &InstancePath) -> Result<RecordList, StoreError> {
        Self::read_file(&self.file_path(instance))
    }

    fn write(&self, instance: &InstancePath, records: &RecordList) -> Result<(), StoreError> {
        let path = self.file_path(instance);
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        let json = records.to_json().map_err(|source| StoreError::Malformed {
            path: path.clone(),
            source,
        })?;
        std::fs::create_dir_all(self.instance_dir(instance)).map_err(io_err)?;
        atomic_write(&path, json.as_bytes()).map_err(io_err)?;

        debug!(instance = %instance, records = records.len(), "decisions written");
        Ok(())
    }
}
