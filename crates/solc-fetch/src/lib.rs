//! Solc-Fetch: compiler binaries keyed by release version
//!
//! The structural checks in `buglist-core` compile each test vector with the
//! compiler release that introduced the bug. This crate hides where that
//! binary comes from:
//!
//! - [`ReleaseProvider`] downloads the static release build once per version,
//!   caches it on disk and marks it executable.
//! - [`FixedProvider`] hands out a single local binary regardless of version.
//!
//! Every provider yields a [`CompilerHandle`] whose binary accepts
//! `--ast-json <file>` and prints the AST to stdout.

pub mod error;
pub mod fixed;
pub mod release;

use async_trait::async_trait;
use std::path::PathBuf;

pub use error::{FetchError, Result};
pub use fixed::FixedProvider;
pub use release::{FetchConfig, ReleaseProvider};

/// A ready-to-run compiler executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerHandle {
    /// Release version the binary was requested for.
    pub version: String,
    /// Path to the executable.
    pub path: PathBuf,
}

impl CompilerHandle {
    pub fn new(version: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            version: version.into(),
            path: path.into(),
        }
    }
}

impl std::fmt::Display for CompilerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.version, self.path.display())
    }
}

/// Source of compiler binaries.
///
/// Implementations own fetching, caching and permissions; callers only ask
/// for a version and run what comes back.
#[async_trait]
pub trait CompilerProvider: Send + Sync {
    /// Return an executable compiler for `version`.
    async fn compiler_for(&self, version: &str) -> Result<CompilerHandle>;
}

/// Reject versions that could escape the cache directory or the release URL.
///
/// Accepts dotted identifiers such as `0.4.0` or `0.5.0-nightly.2018.11.13`.
pub fn validate_version(version: &str) -> Result<()> {
    let valid = !version.is_empty()
        && !version.starts_with('.')
        && !version.contains("..")
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'));

    if valid {
        Ok(())
    } else {
        Err(FetchError::InvalidVersion(version.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_release_versions() {
        for v in ["0.4.0", "0.8.20", "0.5.0-nightly.2018.11.13", "0.4.26+commit"] {
            assert!(validate_version(v).is_ok(), "{v} should be valid");
        }
    }

    #[test]
    fn rejects_path_like_versions() {
        for v in ["", "../0.4.0", "0.4/0", ".hidden", "0.4 .0"] {
            assert!(
                matches!(validate_version(v), Err(FetchError::InvalidVersion(_))),
                "{v:?} should be rejected"
            );
        }
    }

    #[test]
    fn handle_display_includes_version_and_path() {
        let handle = CompilerHandle::new("0.4.0", "/tmp/solc");
        assert_eq!(handle.to_string(), "0.4.0 (/tmp/solc)");
    }
}
