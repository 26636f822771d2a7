use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::version::semver_compare;
use super::DownloadArtifact;

/// Newest first by version, then by file name.
///
/// The sort is stable, so artifacts with identical version and file keep
/// their input order.
pub fn sorted_descending(artifacts: &[DownloadArtifact]) -> Vec<DownloadArtifact> {
    let mut sorted = artifacts.to_vec();
    sorted.sort_by(|a, b| {
        semver_compare(&b.version, &a.version).then_with(|| a.file.cmp(&b.file))
    });
    sorted
}

/// Highest stable version of an already sorted list.
///
/// Falls back to the first entry when every artifact is a pre-release.
pub fn latest_version(sorted: &[DownloadArtifact]) -> Option<&str> {
    sorted
        .iter()
        .find(|a| !a.is_prerelease())
        .or_else(|| sorted.first())
        .map(|a| a.version.as_str())
}

/// The static list of published installers.
#[derive(Debug, Clone, Default)]
pub struct DownloadCatalog {
    artifacts: Vec<DownloadArtifact>,
}

impl DownloadCatalog {
    pub fn new(artifacts: Vec<DownloadArtifact>) -> Self {
        Self { artifacts }
    }

    /// Load a JSON manifest (an array of artifacts). A missing file is an
    /// empty catalog.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No download manifest, catalog is empty");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read download manifest: {}", path.display()))?;
        let artifacts: Vec<DownloadArtifact> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse download manifest: {}", path.display()))?;

        debug!(path = %path.display(), count = artifacts.len(), "Loaded download manifest");
        Ok(Self { artifacts })
    }

    pub fn artifacts(&self) -> &[DownloadArtifact] {
        &self.artifacts
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn sorted(&self) -> Vec<DownloadArtifact> {
        sorted_descending(&self.artifacts)
    }

    pub fn latest_version(&self) -> Option<String> {
        latest_version(&self.sorted()).map(str::to_string)
    }
}
