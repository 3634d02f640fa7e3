//! Release download provider
//!
//! Fetches the static compiler build published for a release tag, stores it
//! under `<cache_dir>/<version>/<asset>` and keeps a `.sha256` sidecar next
//! to it so later runs can reuse the binary without touching the network.

use crate::error::FetchError;
use crate::{validate_version, CompilerHandle, CompilerProvider, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default release download root.
pub const DEFAULT_RELEASE_URL: &str = "https://github.com/ethereum/solidity/releases/download";

/// Default release asset (statically linked Linux build).
pub const DEFAULT_ASSET: &str = "solc-static-linux";

/// Release provider configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Download root; the asset URL is `<base_url>/v<version>/<asset_name>`
    pub base_url: String,
    /// Release asset file name
    pub asset_name: String,
    /// Directory holding one sub-directory per version
    pub cache_dir: PathBuf,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            base_url: std::env::var("BUGLIST_SOLC_RELEASE_URL")
                .unwrap_or_else(|_| DEFAULT_RELEASE_URL.to_string()),
            asset_name: std::env::var("BUGLIST_SOLC_ASSET")
                .unwrap_or_else(|_| DEFAULT_ASSET.to_string()),
            cache_dir: std::env::var("BUGLIST_SOLC_CACHE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".buglist/solc")),
            request_timeout: Duration::from_secs(300),
        }
    }
}

impl FetchConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific release server and cache directory
    pub fn new(base_url: &str, cache_dir: impl Into<PathBuf>) -> Self {
        FetchConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            asset_name: DEFAULT_ASSET.to_string(),
            cache_dir: cache_dir.into(),
            request_timeout: Duration::from_secs(300),
        }
    }

    /// Set the release asset name
    pub fn with_asset(mut self, asset_name: &str) -> Self {
        self.asset_name = asset_name.to_string();
        self
    }

    /// Set the HTTP request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Download URL for `version`
    pub fn release_url(&self, version: &str) -> String {
        format!(
            "{}/v{}/{}",
            self.base_url.trim_end_matches('/'),
            version,
            self.asset_name
        )
    }

    /// Cache location of the binary for `version`
    pub fn binary_path(&self, version: &str) -> PathBuf {
        self.cache_dir.join(version).join(&self.asset_name)
    }
}

/// Provider that downloads and caches release binaries
pub struct ReleaseProvider {
    config: FetchConfig,
    http_client: reqwest::Client,
    resolved: Mutex<HashMap<String, CompilerHandle>>,
}

impl ReleaseProvider {
    /// Create a new release provider
    pub fn new(config: FetchConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("solc-fetch/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        Ok(ReleaseProvider {
            config,
            http_client,
            resolved: Mutex::new(HashMap::new()),
        })
    }

    /// Create provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(FetchConfig::from_env())
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Make sure an intact, executable binary for `version` is on disk
    async fn ensure_binary(&self, version: &str) -> Result<PathBuf> {
        let path = self.config.binary_path(version);

        if is_cached_intact(&path).await? {
            debug!(version, path = %path.display(), "Reusing cached compiler");
            make_executable(&path).await?;
            return Ok(path);
        }

        self.download(version, &path).await?;
        Ok(path)
    }

    async fn download(&self, version: &str, dest: &Path) -> Result<()> {
        let url = self.config.release_url(version);
        info!(version, url = %url, "Downloading compiler release");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Only a complete download ever appears under the final name.
        let partial = dest.with_extension("part");
        tokio::fs::write(&partial, &bytes).await?;
        make_executable(&partial).await?;
        tokio::fs::rename(&partial, dest).await?;

        let digest = hex::encode(Sha256::digest(&bytes));
        tokio::fs::write(sidecar_path(dest), format!("{digest}\n")).await?;

        info!(
            version,
            bytes = bytes.len(),
            sha256 = %digest,
            "Cached compiler release"
        );
        Ok(())
    }
}

#[async_trait]
impl CompilerProvider for ReleaseProvider {
    async fn compiler_for(&self, version: &str) -> Result<CompilerHandle> {
        validate_version(version)?;

        // Held across the download: one fetch per version.
        let mut resolved = self.resolved.lock().await;
        if let Some(handle) = resolved.get(version) {
            return Ok(handle.clone());
        }

        let path = self.ensure_binary(version).await?;
        let handle = CompilerHandle::new(version, path);
        resolved.insert(version.to_string(), handle.clone());
        Ok(handle)
    }
}

fn sidecar_path(binary: &Path) -> PathBuf {
    let mut name = binary.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

/// A cached binary is reusable only if its sidecar digest still matches.
async fn is_cached_intact(path: &Path) -> Result<bool> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let expected = match tokio::fs::read_to_string(sidecar_path(path)).await {
        Ok(s) => s.trim().to_string(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Cached compiler has no checksum, refetching");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    let actual = hex::encode(Sha256::digest(&content));
    if actual != expected {
        warn!(
            path = %path.display(),
            expected = %expected,
            actual = %actual,
            "Cached compiler checksum mismatch, refetching"
        );
        return Ok(false);
    }
    Ok(true)
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
