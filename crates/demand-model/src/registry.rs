//! Model registry
//!
//! A directory holding one JSON artifact per partition. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so a reader sees either the previous artifact or the new one.

use crate::artifact::{ModelArtifact, ModelKey};
use crate::error::Result;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Directory-backed store of model artifacts.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    root: PathBuf,
}

impl ModelRegistry {
    /// Registry rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Registry directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifact path for a key.
    pub fn path_for(&self, key: ModelKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// Persist an artifact, replacing any previous one for the same key.
    pub fn save(&self, artifact: &ModelArtifact) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root)?;
        let target = self.path_for(artifact.key);

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        serde_json::to_writer_pretty(&mut tmp, artifact)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;

        debug!(path = %target.display(), "Model saved");
        Ok(target)
    }

    /// Load the artifact for a key.
    pub fn load(&self, key: ModelKey) -> Result<ModelArtifact> {
        ModelArtifact::load(self.path_for(key))
    }

    /// Whether an artifact exists for a key.
    pub fn contains(&self, key: ModelKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Keys of all persisted artifacts, sorted.
    ///
    /// A missing directory is an empty registry.
    pub fn keys(&self) -> Result<Vec<ModelKey>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = BTreeSet::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(key) = entry.file_name().to_str().and_then(ModelKey::parse_file_name) {
                keys.insert(key);
            }
        }
        Ok(keys.into_iter().collect())
    }
}
