//! npm-compatible registry client
//!
//! Only the `versions` object of the package metadata document is used:
//! its keys give the published versions and `versions.<v>.dist.tarball`
//! points the installer at the archive.

use super::error::PackageError;
use reqwest::{Client, StatusCode};
use semver::{Version, VersionReq};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Mirror registry used by default
pub const MIRROR_REGISTRY: &str = "https://registry.npmmirror.com/";

/// Canonical upstream registry
pub const ORIGINAL_REGISTRY: &str = "https://registry.npmjs.org/";

/// Pick the registry URL: the mirror unless the upstream is requested
pub fn default_registry_url(use_original: bool) -> &'static str {
    if use_original {
        ORIGINAL_REGISTRY
    } else {
        MIRROR_REGISTRY
    }
}

#[derive(Debug, Default, Deserialize)]
struct PackageInfo {
    #[serde(default)]
    versions: BTreeMap<String, VersionInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct VersionInfo {
    #[serde(default)]
    dist: Option<DistInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct DistInfo {
    #[serde(default)]
    tarball: Option<String>,
}

/// Registry client for fetching package metadata
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: Url,
    http: Client,
}

impl RegistryClient {
    /// Create a client for the given registry base URL
    pub fn new(base_url: &str) -> Result<Self, PackageError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            PackageError::InvalidOptions(format!("invalid registry URL '{base_url}': {e}"))
        })?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("scaffold/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PackageError::RegistryUnavailable(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// HTTP client, shared with tarball downloads
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Build the metadata URL for a package, encoding the scope separator
    fn package_url(&self, package_name: &str) -> Result<Url, PackageError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                PackageError::InvalidOptions(format!(
                    "registry URL cannot have path segments: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(package_name);
        Ok(url)
    }

    /// Fetch the metadata document; `None` when the registry does not know the package
    async fn fetch_info(&self, package_name: &str) -> Result<Option<PackageInfo>, PackageError> {
        if package_name.is_empty() {
            return Ok(None);
        }

        let url = self.package_url(package_name)?;
        debug!(%url, "fetching package metadata");

        let response = self.http.get(url.clone()).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PackageError::RegistryUnavailable(format!(
                "registry returned HTTP {} for {}",
                response.status(),
                url
            )));
        }

        let info = response.json::<PackageInfo>().await.map_err(|e| {
            PackageError::RegistryUnavailable(format!("invalid metadata for {package_name}: {e}"))
        })?;
        Ok(Some(info))
    }

    /// All published version strings of a package (empty if unknown)
    pub async fn fetch_versions(&self, package_name: &str) -> Result<Vec<String>, PackageError> {
        Ok(self
            .fetch_info(package_name)
            .await?
            .map(|info| info.versions.into_keys().collect())
            .unwrap_or_default())
    }

    /// Highest published version that is not older than `base_version`
    pub async fn resolve_latest_satisfying(
        &self,
        base_version: &str,
        package_name: &str,
    ) -> Result<Option<String>, PackageError> {
        let versions = self.fetch_versions(package_name).await?;
        latest_satisfying(base_version, &versions)
    }

    /// Highest published version, used to replace the `latest` sentinel
    pub async fn resolve_latest(&self, package_name: &str) -> Result<Option<String>, PackageError> {
        let versions = self.fetch_versions(package_name).await?;
        Ok(highest_version(&versions))
    }

    /// Tarball URL of an exact version, if published
    pub async fn tarball_url(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<Option<String>, PackageError> {
        Ok(self.fetch_info(package_name).await?.and_then(|mut info| {
            info.versions
                .remove(version)
                .and_then(|v| v.dist)
                .and_then(|d| d.tarball)
        }))
    }
}

/// Parse a version string, accepting a leading `v`
pub fn parse_version(version: &str) -> Option<Version> {
    Version::parse(version.strip_prefix('v').unwrap_or(version)).ok()
}

/// Filter `versions` to those `>= base_version` and return the highest one
pub fn latest_satisfying(
    base_version: &str,
    versions: &[String],
) -> Result<Option<String>, PackageError> {
    let base = parse_version(base_version).ok_or_else(|| {
        PackageError::InvalidOptions(format!("invalid base version '{base_version}'"))
    })?;
    let req = VersionReq::parse(&format!(">={base}"))
        .map_err(|e| PackageError::InvalidOptions(format!("invalid version range: {e}")))?;

    let mut candidates: Vec<(Version, &String)> = versions
        .iter()
        .filter_map(|raw| parse_version(raw).map(|v| (v, raw)))
        .filter(|(v, _)| req.matches(v))
        .collect();

    // Descending order, first one wins
    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(candidates.into_iter().next().map(|(_, raw)| raw.clone()))
}

/// Highest version, ignoring pre-releases unless nothing else is published
pub fn highest_version(versions: &[String]) -> Option<String> {
    let parsed: Vec<(Version, &String)> = versions
        .iter()
        .filter_map(|raw| parse_version(raw).map(|v| (v, raw)))
        .collect();

    let stable = parsed
        .iter()
        .filter(|(v, _)| v.pre.is_empty())
        .max_by(|a, b| a.0.cmp(&b.0));

    stable
        .or_else(|| parsed.iter().max_by(|a, b| a.0.cmp(&b.0)))
        .map(|(_, raw)| (*raw).clone())
}
