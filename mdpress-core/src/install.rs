//! Tool installer: resolves a version selector to a local executable path.
//!
//! The install path is cache-first: a hit under `(tool, resolved version)`
//! short-circuits before any network traffic. On a miss the platform
//! specific release archive is downloaded, unpacked into the cache and the
//! binary is marked executable on non-Windows hosts.
//!
//! The `latest` sentinel is resolved through a [`VersionLookup`]; a failed
//! lookup is recovered locally with a hard-coded known-good version and a
//! warning, never a fatal error.

use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::contract::{LookupError, VersionLookup};

/// Name of the external rendering binary.
pub const TOOL_NAME: &str = "mdrend";
/// GitHub organisation publishing the tool's releases.
pub const TOOL_ORG: &str = "mdrend-io";
/// Version selector sentinel resolved against release metadata.
pub const LATEST: &str = "latest";
/// Known-good version used when the `latest` lookup fails.
pub const FALLBACK_VERSION: &str = "v1.4.2";

const RELEASES_HOST: &str = "https://github.com";
const API_HOST: &str = "https://api.github.com";

/// Errors raised while installing the external tool.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },
    #[error("downloading {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("release archive download returned HTTP {status} for {url}")]
    DownloadStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to unpack release archive: {0}")]
    Archive(#[from] std::io::Error),
    #[error("release archive did not contain the '{tool}' binary")]
    BinaryMissing { tool: String },
}

/// Total mapping from the host (os, arch) pair to the (osName, archName)
/// pair used in release archive names. Any unmapped pair is an error, never
/// a default.
pub fn target_names(os: &str, arch: &str) -> Result<(&'static str, &'static str), InstallError> {
    match (os, arch) {
        ("linux", "x86_64") => Ok(("linux", "amd64")),
        ("linux", "aarch64") => Ok(("linux", "arm64")),
        ("macos", "x86_64") => Ok(("darwin", "amd64")),
        ("macos", "aarch64") => Ok(("darwin", "arm64")),
        ("windows", "x86_64") => Ok(("windows", "amd64")),
        ("windows", "aarch64") => Ok(("windows", "arm64")),
        (os, arch) => Err(InstallError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        }),
    }
}

/// Release archive URL: the version appears verbatim as the release path
/// segment, and stripped of its `v` prefix in the archive file name.
pub fn archive_url(host: &str, version: &str, os_name: &str, arch_name: &str) -> String {
    let bare = version.strip_prefix('v').unwrap_or(version);
    format!(
        "{host}/{TOOL_ORG}/{TOOL_NAME}/releases/download/{version}/{TOOL_NAME}_{bare}_{os_name}_{arch_name}.tar.gz"
    )
}

/// Resolve a version selector: explicit versions are used verbatim, the
/// `latest` sentinel is resolved via the lookup with a logged fallback.
pub async fn resolve_version<L>(selector: &str, lookup: &L) -> String
where
    L: VersionLookup + ?Sized,
{
    if selector != LATEST {
        return selector.to_string();
    }
    match lookup.latest_version().await {
        Ok(tag) => {
            info!(version = %tag, "[INSTALL] Resolved 'latest' from release metadata");
            tag
        }
        Err(e) => {
            warn!(
                error = %e,
                fallback = FALLBACK_VERSION,
                "[INSTALL] Latest-version lookup failed, falling back to known-good version"
            );
            FALLBACK_VERSION.to_string()
        }
    }
}

#[derive(Deserialize)]
struct LatestRelease {
    tag_name: String,
}

/// Resolves `latest` against the GitHub releases API.
pub struct GithubVersionLookup {
    http: reqwest::Client,
    api_host: String,
}

impl GithubVersionLookup {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            api_host: API_HOST.to_string(),
        }
    }

    /// Point the lookup at a different API host (used by tests).
    pub fn with_api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = host.into();
        self
    }
}

impl Default for GithubVersionLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl VersionLookup for GithubVersionLookup {
    async fn latest_version(&self) -> Result<String, LookupError> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_host, TOOL_ORG, TOOL_NAME
        );
        let release: LatestRelease = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, "mdpress")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(release.tag_name)
    }
}

/// Cache-first installer for the external rendering tool.
pub struct Installer {
    cache_root: PathBuf,
    releases_host: String,
    http: reqwest::Client,
}

impl Installer {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            releases_host: RELEASES_HOST.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Point the installer at a different releases host (used by tests).
    pub fn with_releases_host(mut self, host: impl Into<String>) -> Self {
        self.releases_host = host.into();
        self
    }

    /// Cache location for a resolved version:
    /// `<cache_root>/<tool>/<version>/<tool>[.exe]`.
    pub fn cached_binary_path(&self, version: &str) -> PathBuf {
        let binary = if cfg!(windows) {
            format!("{TOOL_NAME}.exe")
        } else {
            TOOL_NAME.to_string()
        };
        self.cache_root.join(TOOL_NAME).join(version).join(binary)
    }

    /// Resolve the selector and return a local executable path, downloading
    /// into the cache on a miss.
    pub async fn install<L>(&self, selector: &str, lookup: &L) -> Result<PathBuf, InstallError>
    where
        L: VersionLookup + ?Sized,
    {
        let version = resolve_version(selector, lookup).await;
        self.ensure_installed(&version).await
    }

    /// Return the cached binary for `version`, populating the cache first if
    /// absent.
    pub async fn ensure_installed(&self, version: &str) -> Result<PathBuf, InstallError> {
        let binary = self.cached_binary_path(version);
        if binary.exists() {
            info!(
                version,
                path = %binary.display(),
                "[INSTALL] Cache hit, skipping download"
            );
            return Ok(binary);
        }

        let (os_name, arch_name) = target_names(std::env::consts::OS, std::env::consts::ARCH)?;
        let url = archive_url(&self.releases_host, version, os_name, arch_name);
        info!(version, url = %url, "[INSTALL] Downloading release archive");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| InstallError::Download {
                url: url.clone(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(InstallError::DownloadStatus {
                url,
                status: response.status(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|source| InstallError::Download {
                url: url.clone(),
                source,
            })?;
        debug!(version, size = bytes.len(), "[INSTALL] Archive downloaded");

        let version_dir = binary
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cache_root.clone());
        tokio::fs::create_dir_all(&version_dir).await?;

        // Stage the archive on disk before unpacking.
        let mut staged = tempfile::NamedTempFile::new()?;
        staged.write_all(&bytes)?;
        staged.rewind()?;
        let mut archive = tar::Archive::new(GzDecoder::new(staged));
        archive.unpack(&version_dir)?;

        if !binary.exists() {
            return Err(InstallError::BinaryMissing {
                tool: TOOL_NAME.to_string(),
            });
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))?;
        }

        info!(
            version,
            path = %binary.display(),
            "[INSTALL] Tool installed into cache"
        );
        Ok(binary)
    }
}
