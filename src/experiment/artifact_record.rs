//! Artifact Record - a persisted model found under the storage root

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use super::codec::{ArtifactPathCodec, ARTIFACT_FILE_NAME};
use super::HyperparameterCombination;
use crate::Result;

/// Artifact Record represents one model artifact on durable storage.
///
/// The combination is not stored alongside the model; it is recovered from
/// the artifact's path through the shared codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    combination: HyperparameterCombination,
    path: PathBuf,
    size_bytes: u64,
    modified_at: Option<DateTime<Utc>>,
}

impl ArtifactRecord {
    /// Build a record for an artifact path, decoding its combination.
    ///
    /// # Errors
    ///
    /// Returns `PathDecode` if the path does not match the layout, or `Io`
    /// if the file metadata cannot be read.
    pub fn from_path(codec: &ArtifactPathCodec, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let combination = codec.decode(&path)?;
        let metadata = std::fs::metadata(&path)?;
        Ok(Self {
            combination,
            size_bytes: metadata.len(),
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            path,
        })
    }

    /// Get the combination this artifact was fitted with.
    #[must_use]
    pub const fn combination(&self) -> &HyperparameterCombination {
        &self.combination
    }

    /// Get the artifact path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the artifact size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Get the last modification time, if the platform reports one.
    #[must_use]
    pub const fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified_at
    }
}

/// List every file named like an artifact below `root`, sorted by path.
///
/// A missing root yields an empty list: nothing has been fitted yet.
/// Unreadable directory entries are skipped.
#[must_use]
pub fn discover_artifacts(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        tracing::warn!(root = %root.display(), "model root does not exist, no artifacts to discover");
        return Vec::new();
    }
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name() == ARTIFACT_FILE_NAME)
        .map(walkdir::DirEntry::into_path)
        .collect();
    paths.sort();
    paths
}
