//! Template package resolution and local cache management
//!
//! A [`Package`] names one template package at one version. It runs in one
//! of two modes:
//!
//! - **store mode** (`store_dir` set): versions live side by side in a shared
//!   cache, one directory per version (see [`cache::cache_path`])
//! - **direct mode**: the package is a local checkout at `target_path`,
//!   used to override a published template during development
//!
//! The requested version may be the `latest` sentinel. It is resolved against
//! the registry before any cache path is computed, and the resolved version is
//! kept separately from the requested one.

pub mod cache;
pub mod entry;
pub mod error;
pub mod installer;
pub mod registry;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use cache::{cache_path, sanitize_name};
pub use error::PackageError;
pub use installer::{InstallRequest, InstallSpec, Installer, TarballInstaller};
pub use registry::{default_registry_url, RegistryClient};

/// Sentinel version meaning "highest published version"
pub const LATEST: &str = "latest";

/// Constructor inputs for a [`Package`]
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Where the package lives when no store is used
    pub target_path: PathBuf,
    /// Shared cache directory; `None` or empty selects direct mode
    pub store_dir: Option<PathBuf>,
    pub package_name: String,
    /// Concrete version or [`LATEST`]
    pub package_version: String,
    /// Registry override; the mirror registry otherwise
    pub registry_url: Option<String>,
}

/// A named, versioned template package backed by the local cache
pub struct Package {
    target_path: PathBuf,
    store_dir: Option<PathBuf>,
    package_name: String,
    requested_version: String,
    resolved_version: Option<String>,
    registry_url: String,
    registry: RegistryClient,
    installer: Box<dyn Installer>,
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("target_path", &self.target_path)
            .field("store_dir", &self.store_dir)
            .field("package_name", &self.package_name)
            .field("requested_version", &self.requested_version)
            .field("resolved_version", &self.resolved_version)
            .field("registry_url", &self.registry_url)
            .finish_non_exhaustive()
    }
}

impl Package {
    /// Create a package installed from registry tarballs
    pub fn new(options: PackageOptions) -> Result<Self, PackageError> {
        Self::with_installer(options, Box::new(TarballInstaller::new()))
    }

    /// Create a package with a custom installer
    pub fn with_installer(
        options: PackageOptions,
        installer: Box<dyn Installer>,
    ) -> Result<Self, PackageError> {
        let PackageOptions {
            target_path,
            store_dir,
            package_name,
            package_version,
            registry_url,
        } = options;

        if package_name.trim().is_empty() {
            return Err(PackageError::InvalidOptions(
                "package name must not be empty".to_string(),
            ));
        }
        if package_version.trim().is_empty() {
            return Err(PackageError::InvalidOptions(format!(
                "version of {package_name} must not be empty"
            )));
        }
        if !target_path.is_absolute() {
            return Err(PackageError::InvalidOptions(format!(
                "target path must be absolute: {}",
                target_path.display()
            )));
        }

        let store_dir = store_dir.filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = &store_dir {
            if !dir.is_absolute() {
                return Err(PackageError::InvalidOptions(format!(
                    "store directory must be absolute: {}",
                    dir.display()
                )));
            }
        }

        let resolved_version = if package_version == LATEST {
            None
        } else if registry::parse_version(&package_version).is_some() {
            Some(package_version.clone())
        } else {
            return Err(PackageError::InvalidOptions(format!(
                "invalid version '{package_version}' for {package_name}"
            )));
        };

        let registry_url =
            registry_url.unwrap_or_else(|| default_registry_url(false).to_string());
        let registry = RegistryClient::new(&registry_url)?;

        Ok(Self {
            target_path,
            store_dir,
            package_name,
            requested_version: package_version,
            resolved_version,
            registry_url,
            registry,
            installer,
        })
    }

    pub fn name(&self) -> &str {
        &self.package_name
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn store_dir(&self) -> Option<&Path> {
        self.store_dir.as_deref()
    }

    /// Version as given by the caller, possibly [`LATEST`]
    pub fn requested_version(&self) -> &str {
        &self.requested_version
    }

    /// Concrete version, once resolved
    pub fn resolved_version(&self) -> Option<&str> {
        self.resolved_version.as_deref()
    }

    /// Package name with path separators replaced
    pub fn cache_key_prefix(&self) -> String {
        sanitize_name(&self.package_name)
    }

    /// Cache directory of the resolved version
    pub fn cache_file_path(&self) -> Result<PathBuf, PackageError> {
        let version = self.require_resolved()?;
        self.specific_cache_file_path(&version)
    }

    /// Cache directory of an arbitrary version of this package
    pub fn specific_cache_file_path(&self, version: &str) -> Result<PathBuf, PackageError> {
        let store = self.store_dir.as_deref().ok_or_else(|| {
            PackageError::InvalidOptions(format!(
                "{} has no store directory configured",
                self.package_name
            ))
        })?;
        Ok(cache_path(store, &self.package_name, version))
    }

    /// Create the store directory and resolve the `latest` sentinel
    pub async fn prepare(&mut self) -> Result<(), PackageError> {
        if let Some(store) = &self.store_dir {
            if !store.exists() {
                debug!(store = %store.display(), "creating store directory");
                fs::create_dir_all(store).map_err(|source| PackageError::CacheDir {
                    path: store.clone(),
                    source,
                })?;
            }
        }

        if self.resolved_version.is_none() {
            let version = self
                .registry
                .resolve_latest(&self.package_name)
                .await?
                .ok_or_else(|| {
                    PackageError::InvalidOptions(format!(
                        "no published versions found for {}",
                        self.package_name
                    ))
                })?;
            debug!(package = %self.package_name, %version, "resolved latest version");
            self.resolved_version = Some(version);
        }

        Ok(())
    }

    /// Whether the package is available locally
    pub async fn exists(&mut self) -> Result<bool, PackageError> {
        if self.store_dir.is_some() {
            self.prepare().await?;
            Ok(self.cache_file_path()?.exists())
        } else {
            Ok(self.target_path.exists())
        }
    }

    /// Install the resolved version
    pub async fn install(&mut self) -> Result<(), PackageError> {
        self.prepare().await?;
        let version = self.require_resolved()?;
        info!(package = %self.package_name, %version, "installing template package");
        self.installer
            .install_packages(&self.install_request(&version))
            .await
    }

    /// Move to the highest published version not older than the current one
    ///
    /// Older cached versions are left untouched. Returns the version the
    /// package now points at.
    pub async fn update(&mut self) -> Result<String, PackageError> {
        if self.store_dir.is_none() {
            return Err(PackageError::InvalidOptions(format!(
                "{} is a local checkout and cannot be updated",
                self.package_name
            )));
        }
        self.prepare().await?;
        let current = self.require_resolved()?;

        let latest = match self
            .registry
            .resolve_latest_satisfying(&current, &self.package_name)
            .await?
        {
            Some(version) => version,
            None => {
                debug!(package = %self.package_name, %current, "registry has nothing newer");
                current.clone()
            }
        };

        let latest_path = self.specific_cache_file_path(&latest)?;
        if !latest_path.exists() {
            info!(package = %self.package_name, from = %current, to = %latest, "updating template package");
            self.installer
                .install_packages(&self.install_request(&latest))
                .await?;
        } else {
            debug!(path = %latest_path.display(), "latest version already cached");
        }

        self.resolved_version = Some(latest.clone());
        Ok(latest)
    }

    /// Install the package if missing, otherwise move it to the newest version
    ///
    /// A direct-mode package is a local checkout and is used as is.
    pub async fn ensure_installed(&mut self) -> Result<(), PackageError> {
        if self.store_dir.is_none() {
            return Ok(());
        }
        if self.exists().await? {
            self.update().await?;
        } else {
            self.install().await?;
        }
        Ok(())
    }

    /// Entry file declared by the package manifest, if any
    pub fn root_file_path(&self) -> Result<Option<PathBuf>, PackageError> {
        let root = if self.store_dir.is_some() {
            self.cache_file_path()?
        } else {
            self.target_path.clone()
        };
        entry::root_file_path(&root)
    }

    /// Directory holding the package contents
    pub fn package_dir(&self) -> Result<PathBuf, PackageError> {
        if self.store_dir.is_some() {
            self.cache_file_path()
        } else {
            Ok(self.target_path.clone())
        }
    }

    fn require_resolved(&self) -> Result<String, PackageError> {
        self.resolved_version.clone().ok_or_else(|| {
            PackageError::InvalidOptions(format!(
                "version of {} is not resolved yet",
                self.package_name
            ))
        })
    }

    fn install_request(&self, version: &str) -> InstallRequest {
        InstallRequest {
            root: self.target_path.clone(),
            store_dir: self.store_dir.clone(),
            registry_url: self.registry_url.clone(),
            packages: vec![InstallSpec {
                name: self.package_name.clone(),
                version: version.to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Records requests and materializes each destination with a manifest
    #[derive(Clone, Default)]
    struct RecordingInstaller {
        calls: Arc<Mutex<Vec<InstallSpec>>>,
    }

    impl RecordingInstaller {
        fn installed(&self) -> Vec<InstallSpec> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Installer for RecordingInstaller {
        async fn install_packages(&self, request: &InstallRequest) -> Result<(), PackageError> {
            for spec in &request.packages {
                let dest = request.destination(spec);
                fs::create_dir_all(&dest)?;
                fs::write(dest.join("package.json"), r#"{"main":"lib/index.js"}"#)?;
                self.calls.lock().unwrap().push(spec.clone());
            }
            Ok(())
        }
    }

    async fn registry_with(versions: &[&str]) -> mockito::ServerGuard {
        let mut server = mockito::Server::new_async().await;
        let body = format!(
            r#"{{"versions":{{{}}}}}"#,
            versions
                .iter()
                .map(|v| format!(r#""{v}":{{}}"#))
                .collect::<Vec<_>>()
                .join(",")
        );
        server
            .mock("GET", "/tmpl")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;
        server
    }

    fn store_package(
        tmp: &TempDir,
        version: &str,
        registry: &mockito::ServerGuard,
        installer: &RecordingInstaller,
    ) -> Package {
        Package::with_installer(
            PackageOptions {
                target_path: tmp.path().to_path_buf(),
                store_dir: Some(tmp.path().join("node_modules")),
                package_name: "tmpl".to_string(),
                package_version: version.to_string(),
                registry_url: Some(registry.url()),
            },
            Box::new(installer.clone()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_exists_resolves_latest_without_installing() {
        let registry = registry_with(&["1.0.0", "1.1.0"]).await;
        let tmp = TempDir::new().unwrap();
        let installer = RecordingInstaller::default();
        let mut pkg = store_package(&tmp, LATEST, &registry, &installer);

        assert!(!pkg.exists().await.unwrap());
        assert_eq!(pkg.requested_version(), LATEST);
        assert_eq!(pkg.resolved_version(), Some("1.1.0"));
        assert!(tmp.path().join("node_modules").is_dir());
        assert!(installer.installed().is_empty());
    }

    #[tokio::test]
    async fn test_install_then_exists() {
        let registry = registry_with(&["1.0.0"]).await;
        let tmp = TempDir::new().unwrap();
        let installer = RecordingInstaller::default();
        let mut pkg = store_package(&tmp, "1.0.0", &registry, &installer);

        pkg.install().await.unwrap();

        assert!(pkg.exists().await.unwrap());
        assert_eq!(
            pkg.cache_file_path().unwrap(),
            tmp.path().join("node_modules").join("_tmpl@1.0.0@tmpl")
        );
    }

    #[tokio::test]
    async fn test_update_installs_newer_version_once() {
        let registry = registry_with(&["1.0.0", "1.1.0", "2.0.0"]).await;
        let tmp = TempDir::new().unwrap();
        let installer = RecordingInstaller::default();
        let mut pkg = store_package(&tmp, "1.0.0", &registry, &installer);
        pkg.install().await.unwrap();

        assert_eq!(pkg.update().await.unwrap(), "2.0.0");
        assert_eq!(pkg.update().await.unwrap(), "2.0.0");
        assert_eq!(pkg.resolved_version(), Some("2.0.0"));

        let versions: Vec<_> = installer
            .installed()
            .into_iter()
            .map(|s| s.version)
            .collect();
        assert_eq!(versions, vec!["1.0.0", "2.0.0"]);

        // The older version stays cached
        assert!(pkg.specific_cache_file_path("1.0.0").unwrap().exists());
    }

    #[tokio::test]
    async fn test_update_without_newer_version_keeps_cache() {
        let registry = registry_with(&["1.0.0"]).await;
        let tmp = TempDir::new().unwrap();
        let installer = RecordingInstaller::default();
        let mut pkg = store_package(&tmp, "1.0.0", &registry, &installer);
        pkg.install().await.unwrap();

        assert_eq!(pkg.update().await.unwrap(), "1.0.0");
        assert_eq!(installer.installed().len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_installed_installs_then_updates() {
        let registry = registry_with(&["1.0.0", "1.2.0"]).await;
        let tmp = TempDir::new().unwrap();
        let installer = RecordingInstaller::default();
        let mut pkg = store_package(&tmp, LATEST, &registry, &installer);

        pkg.ensure_installed().await.unwrap();
        pkg.ensure_installed().await.unwrap();

        assert_eq!(installer.installed().len(), 1);
        assert_eq!(pkg.resolved_version(), Some("1.2.0"));
    }

    #[tokio::test]
    async fn test_root_file_path_in_store_mode() {
        let registry = registry_with(&["1.0.0"]).await;
        let tmp = TempDir::new().unwrap();
        let installer = RecordingInstaller::default();
        let mut pkg = store_package(&tmp, "1.0.0", &registry, &installer);
        pkg.install().await.unwrap();

        let entry = pkg.root_file_path().unwrap().unwrap();
        assert!(entry
            .to_string_lossy()
            .ends_with("_tmpl@1.0.0@tmpl/lib/index.js"));
    }

    #[tokio::test]
    async fn test_direct_mode_checks_target_path() {
        let tmp = TempDir::new().unwrap();
        let checkout = tmp.path().join("checkout");
        let mut pkg = Package::with_installer(
            PackageOptions {
                target_path: checkout.clone(),
                store_dir: Some(PathBuf::new()),
                package_name: "tmpl".to_string(),
                package_version: LATEST.to_string(),
                registry_url: Some("http://127.0.0.1:9/".to_string()),
            },
            Box::new(RecordingInstaller::default()),
        )
        .unwrap();

        assert!(pkg.store_dir().is_none());
        assert!(!pkg.exists().await.unwrap());
        assert!(matches!(
            pkg.update().await,
            Err(PackageError::InvalidOptions(_))
        ));

        fs::create_dir_all(&checkout).unwrap();
        fs::write(checkout.join("package.json"), r#"{"main":"index.js"}"#).unwrap();
        assert!(pkg.exists().await.unwrap());
        assert!(pkg
            .root_file_path()
            .unwrap()
            .unwrap()
            .to_string_lossy()
            .ends_with("checkout/index.js"));
    }

    #[tokio::test]
    async fn test_uncreatable_store_is_cache_dir_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file");
        fs::write(&file, "not a directory").unwrap();

        let mut pkg = Package::with_installer(
            PackageOptions {
                target_path: tmp.path().to_path_buf(),
                store_dir: Some(file.join("store")),
                package_name: "tmpl".to_string(),
                package_version: "1.0.0".to_string(),
                registry_url: None,
            },
            Box::new(RecordingInstaller::default()),
        )
        .unwrap();

        match pkg.exists().await {
            Err(PackageError::CacheDir { path, .. }) => assert_eq!(path, file.join("store")),
            other => panic!("expected CacheDir error, got {:?}", other),
        }
    }

    #[test]
    fn test_cache_path_requires_resolution() {
        let tmp = TempDir::new().unwrap();
        let pkg = Package::with_installer(
            PackageOptions {
                target_path: tmp.path().to_path_buf(),
                store_dir: Some(tmp.path().join("store")),
                package_name: "@scope/tmpl".to_string(),
                package_version: LATEST.to_string(),
                registry_url: None,
            },
            Box::new(RecordingInstaller::default()),
        )
        .unwrap();

        assert_eq!(pkg.cache_key_prefix(), "@scope_tmpl");
        assert!(matches!(
            pkg.cache_file_path(),
            Err(PackageError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_invalid_options() {
        let base = PackageOptions {
            target_path: PathBuf::from("/work"),
            store_dir: None,
            package_name: "tmpl".to_string(),
            package_version: "1.0.0".to_string(),
            registry_url: None,
        };

        let empty_name = PackageOptions {
            package_name: String::new(),
            ..base.clone()
        };
        let bad_version = PackageOptions {
            package_version: "one".to_string(),
            ..base.clone()
        };
        let relative = PackageOptions {
            target_path: PathBuf::from("work"),
            ..base.clone()
        };

        for options in [empty_name, bad_version, relative] {
            assert!(matches!(
                Package::new(options),
                Err(PackageError::InvalidOptions(_))
            ));
        }
        assert!(Package::new(base).is_ok());
    }
}
