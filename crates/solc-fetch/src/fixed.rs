//! Local compiler binary provider.

use crate::error::FetchError;
use crate::{validate_version, CompilerHandle, CompilerProvider, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Provider that always answers with the same local binary.
///
/// Used when the caller points at an already-installed compiler (or a test
/// double) instead of fetching releases.
#[derive(Debug, Clone)]
pub struct FixedProvider {
    path: PathBuf,
}

impl FixedProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CompilerProvider for FixedProvider {
    async fn compiler_for(&self, version: &str) -> Result<CompilerHandle> {
        validate_version(version)?;

        let is_file = tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(FetchError::BinaryNotFound(
                self.path.display().to_string(),
            ));
        }

        debug!(version, path = %self.path.display(), "Using fixed compiler binary");
        Ok(CompilerHandle::new(version, &self.path))
    }
}
