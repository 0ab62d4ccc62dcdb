//! Immutable configuration passed into the core
//!
//! The binary assembles a [`Settings`] from flags, environment and the user
//! home directory. Nothing below this layer reads process environment.

use crate::package::default_registry_url;
use crate::templates::CatalogSource;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Default directory name under the user home
pub const DEFAULT_CLI_HOME: &str = ".scaffold";

/// Package published for this tool, used for update notices
pub const SELF_PACKAGE: &str = "@scaffold-cli/core";

/// Package implementing the `init` command when run through `exec`
pub const DEFAULT_INIT_PACKAGE: &str = "@scaffold-cli/init";

/// Default remote template catalog
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/scaffold-cli/templates/main/templates.yaml";

const DEPENDENCIES_DIR: &str = "dependencies";
const TEMPLATE_DIR: &str = "template";
const STORE_DIR: &str = "node_modules";

/// Runtime configuration for one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    home_dir: PathBuf,
    cli_home: PathBuf,
    target_path: Option<PathBuf>,
    registry_url: String,
    catalog: CatalogSource,
    commands: BTreeMap<String, String>,
}

impl Settings {
    /// Defaults rooted at the given user home directory
    pub fn new(home_dir: impl Into<PathBuf>) -> Self {
        let home_dir = home_dir.into();
        let catalog = Url::parse(DEFAULT_CATALOG_URL)
            .map(CatalogSource::Remote)
            .unwrap_or_else(|_| CatalogSource::Local(PathBuf::from("templates.yaml")));

        let mut commands = BTreeMap::new();
        commands.insert("init".to_string(), DEFAULT_INIT_PACKAGE.to_string());

        Self {
            cli_home: home_dir.join(DEFAULT_CLI_HOME),
            home_dir,
            target_path: None,
            registry_url: default_registry_url(false).to_string(),
            catalog,
            commands,
        }
    }

    /// Cache home, relative to the user home unless absolute
    pub fn with_cli_home(mut self, dir: impl AsRef<Path>) -> Self {
        self.cli_home = self.home_dir.join(dir);
        self
    }

    /// Use a local checkout instead of the shared cache
    pub fn with_target_path(mut self, path: Option<PathBuf>) -> Self {
        self.target_path = path.filter(|p| !p.as_os_str().is_empty());
        self
    }

    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into();
        self
    }

    pub fn with_catalog(mut self, catalog: CatalogSource) -> Self {
        self.catalog = catalog;
        self
    }

    /// Map a command name to the package implementing it
    pub fn with_command(mut self, command: impl Into<String>, package: impl Into<String>) -> Self {
        self.commands.insert(command.into(), package.into());
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn cli_home(&self) -> &Path {
        &self.cli_home
    }

    pub fn target_path(&self) -> Option<&Path> {
        self.target_path.as_deref()
    }

    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    pub fn catalog(&self) -> &CatalogSource {
        &self.catalog
    }

    /// Package registered for a command
    pub fn package_for(&self, command: &str) -> Option<&str> {
        self.commands.get(command).map(String::as_str)
    }

    /// Install root for command packages
    pub fn dependencies_dir(&self) -> PathBuf {
        self.cli_home.join(DEPENDENCIES_DIR)
    }

    pub fn dependencies_store(&self) -> PathBuf {
        self.dependencies_dir().join(STORE_DIR)
    }

    /// Install root for template packages
    pub fn template_dir(&self) -> PathBuf {
        self.cli_home.join(TEMPLATE_DIR)
    }

    pub fn template_store(&self) -> PathBuf {
        self.template_dir().join(STORE_DIR)
    }
}
