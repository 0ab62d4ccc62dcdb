//! Package installation into the template store
//!
//! The package resource only depends on the [`Installer`] trait. The default
//! [`TarballInstaller`] downloads the registry tarball of each requested
//! version and extracts it atomically into its cache directory, so an
//! interrupted install never leaves a half-written entry behind.

use super::cache::cache_path;
use super::error::PackageError;
use super::registry::RegistryClient;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tar::Archive;
use tracing::{debug, info};

/// Maximum tarball size (100 MB)
pub const MAX_TARBALL_SIZE: u64 = 100 * 1024 * 1024;

/// Download timeout for a single tarball
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// A single package to install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSpec {
    pub name: String,
    pub version: String,
}

/// Everything an installer needs for one invocation
#[derive(Debug, Clone)]
pub struct InstallRequest {
    /// Direct install root, used when no store is configured
    pub root: PathBuf,
    /// Shared cache directory
    pub store_dir: Option<PathBuf>,
    pub registry_url: String,
    pub packages: Vec<InstallSpec>,
}

impl InstallRequest {
    /// Directory a package ends up in
    pub fn destination(&self, spec: &InstallSpec) -> PathBuf {
        match &self.store_dir {
            Some(store) => cache_path(store, &spec.name, &spec.version),
            None => self.root.join("node_modules").join(&spec.name),
        }
    }
}

/// Fetches packages into the store
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install_packages(&self, request: &InstallRequest) -> Result<(), PackageError>;
}

/// Installer backed by registry tarballs
#[derive(Debug, Clone)]
pub struct TarballInstaller {
    max_bytes: u64,
}

impl Default for TarballInstaller {
    fn default() -> Self {
        Self {
            max_bytes: MAX_TARBALL_SIZE,
        }
    }
}

impl TarballInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the download size cap
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    async fn install_one(
        &self,
        registry: &RegistryClient,
        spec: &InstallSpec,
        dest: PathBuf,
    ) -> Result<(), PackageError> {
        let fail = |msg: String| PackageError::install(&spec.name, &spec.version, msg);

        let tarball = registry
            .tarball_url(&spec.name, &spec.version)
            .await
            .map_err(|e| fail(e.to_string()))?
            .ok_or_else(|| fail("version not published in registry".to_string()))?;

        debug!(%tarball, dest = %dest.display(), "downloading package tarball");
        let response = registry
            .http()
            .get(&tarball)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| fail(format!("download of {tarball} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(fail(format!(
                "download of {tarball} failed: HTTP {}",
                response.status()
            )));
        }
        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(fail(format!(
                    "tarball too large: {len} bytes (max: {})",
                    self.max_bytes
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fail(format!("failed to read tarball body: {e}")))?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(fail(format!(
                "tarball too large: {} bytes (max: {})",
                bytes.len(),
                self.max_bytes
            )));
        }

        tokio::task::spawn_blocking(move || extract_tgz_atomic(&bytes, &dest))
            .await
            .map_err(|e| fail(format!("extraction task failed: {e}")))?
            .map_err(fail)
    }
}

#[async_trait]
impl Installer for TarballInstaller {
    async fn install_packages(&self, request: &InstallRequest) -> Result<(), PackageError> {
        let registry = RegistryClient::new(&request.registry_url)?;

        for spec in &request.packages {
            let dest = request.destination(spec);
            if dest.exists() {
                debug!(dest = %dest.display(), "package already present, skipping");
                continue;
            }
            info!(name = %spec.name, version = %spec.version, "installing package");
            self.install_one(&registry, spec, dest).await?;
        }

        Ok(())
    }
}

/// Extract a gzip tarball into `dest` via a temporary sibling directory
fn extract_tgz_atomic(bytes: &[u8], dest: &Path) -> Result<(), String> {
    let parent = dest
        .parent()
        .ok_or_else(|| format!("destination {} has no parent", dest.display()))?;
    fs::create_dir_all(parent)
        .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;

    if dest.exists() {
        return Ok(());
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let temp_dir = parent.join(format!(".tmp-{}-{}", std::process::id(), nanos));
    fs::create_dir_all(&temp_dir)
        .map_err(|e| format!("failed to create {}: {e}", temp_dir.display()))?;

    let result = unpack(bytes, &temp_dir)
        .and_then(|()| extracted_root(&temp_dir))
        .and_then(|root| {
            fs::rename(&root, dest).or_else(|e| {
                // Lost a race with another writer
                if dest.exists() {
                    Ok(())
                } else {
                    Err(format!("failed to move package into {}: {e}", dest.display()))
                }
            })
        });

    let _ = fs::remove_dir_all(&temp_dir);
    result
}

fn unpack(bytes: &[u8], target: &Path) -> Result<(), String> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    let entries = archive
        .entries()
        .map_err(|e| format!("failed to read tarball entries: {e}"))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| format!("failed to read tarball entry: {e}"))?;
        let path = entry
            .path()
            .map_err(|e| format!("failed to read entry path: {e}"))?
            .into_owned();

        if path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(format!("tarball entry escapes destination: {}", path.display()));
        }

        entry
            .unpack_in(target)
            .map_err(|e| format!("failed to extract {}: {e}", path.display()))?;
    }

    Ok(())
}

/// npm tarballs wrap everything in a single top-level directory, usually `package/`
fn extracted_root(temp_dir: &Path) -> Result<PathBuf, String> {
    let package_dir = temp_dir.join("package");
    if package_dir.is_dir() {
        return Ok(package_dir);
    }

    let dirs: Vec<PathBuf> = fs::read_dir(temp_dir)
        .map_err(|e| format!("failed to read extracted directory: {e}"))?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();

    match dirs.as_slice() {
        [only] => Ok(only.clone()),
        [] => Err("tarball does not contain a top-level directory".to_string()),
        many => Err(format!(
            "tarball contains {} top-level directories, expected 1",
            many.len()
        )),
    }
}
