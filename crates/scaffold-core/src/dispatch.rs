//! Command dispatch to package entry points
//!
//! A command name maps to a package. The package is resolved (local
//! checkout or shared cache), installed or updated, and its entry point is
//! run in a child `node` process. The child's exit code is the command's.

use crate::package::{Package, PackageOptions, LATEST};
use crate::runtime::{self, LOWEST_NODE_VERSION};
use crate::settings::Settings;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Build the package backing `command` from settings
pub fn command_package(settings: &Settings, command: &str) -> Result<Package> {
    let package_name = settings
        .package_for(command)
        .ok_or_else(|| anyhow::anyhow!("No package registered for command '{}'", command))?;

    let options = match settings.target_path() {
        Some(target) => PackageOptions {
            target_path: target.to_path_buf(),
            store_dir: None,
            package_name: package_name.to_string(),
            package_version: LATEST.to_string(),
            registry_url: Some(settings.registry_url().to_string()),
        },
        None => PackageOptions {
            target_path: settings.dependencies_dir(),
            store_dir: Some(settings.dependencies_store()),
            package_name: package_name.to_string(),
            package_version: LATEST.to_string(),
            registry_url: Some(settings.registry_url().to_string()),
        },
    };
    debug!(?options, "command package");

    Package::new(options).context("Invalid command package")
}

/// Run `command` through its package; returns the child's exit code
pub async fn exec_command(settings: &Settings, command: &str, args: &[String]) -> Result<i32> {
    let mut package = command_package(settings, command)?;
    package.ensure_installed().await?;

    let Some(entry) = package.root_file_path()? else {
        warn!(package = %package.name(), "package declares no entry point, nothing to run");
        return Ok(0);
    };

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    run_entry(&entry, args, &cwd).await
}

/// Call the function exported by `entry` with `payload` in a child `node`
pub async fn run_entry<T: Serialize + ?Sized>(
    entry: &Path,
    payload: &T,
    cwd: &Path,
) -> Result<i32> {
    runtime::require_node(LOWEST_NODE_VERSION)?;

    let script = entry_script(entry, payload)?;
    let code = runtime::spawn_inherited("node", &["-e".to_string(), script], cwd).await?;
    debug!(code, "command finished");
    Ok(code)
}

/// `require('<entry>').call(null, <payload>)` with the entry path quoted
pub fn entry_script<T: Serialize + ?Sized>(entry: &Path, payload: &T) -> Result<String> {
    let entry = entry.to_string_lossy().replace('\\', "/");
    let quoted = serde_json::to_string(&entry).context("Failed to encode entry path")?;
    let payload = serde_json::to_string(payload).context("Failed to encode command arguments")?;
    Ok(format!("require({}).call(null, {})", quoted, payload))
}
