//! Node.js runtime detection

use anyhow::Result;
use semver::Version;
use std::process::Command;

/// Oldest Node.js able to run command packages
pub const LOWEST_NODE_VERSION: &str = "12.0.0";

/// Runtime detection result
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub name: &'static str,
    pub version: Option<String>,
    pub available: bool,
}

/// Check if Node.js is available
pub fn check_node() -> RuntimeInfo {
    let output = Command::new("node").arg("--version").output();

    match output {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
            RuntimeInfo {
                name: "Node.js",
                version: Some(version),
                available: true,
            }
        }
        _ => RuntimeInfo {
            name: "Node.js",
            version: None,
            available: false,
        },
    }
}

/// Fail unless Node.js at least `lowest` is installed
pub fn require_node(lowest: &str) -> Result<()> {
    let node = check_node();
    if !node.available {
        anyhow::bail!("Node.js is required (install from https://nodejs.org)");
    }
    ensure_min_version(node.version.as_deref().unwrap_or_default(), lowest)
}

/// Compare a `vX.Y.Z` version string against a minimum
fn ensure_min_version(current: &str, lowest: &str) -> Result<()> {
    let parse = |s: &str| Version::parse(s.trim().trim_start_matches('v'));
    let lowest_ver =
        parse(lowest).map_err(|e| anyhow::anyhow!("Invalid version '{}': {}", lowest, e))?;

    match parse(current) {
        Ok(current_ver) if current_ver >= lowest_ver => Ok(()),
        Ok(_) => anyhow::bail!(
            "Node.js {} or newer is required, found {}",
            lowest,
            current
        ),
        // Unknown format, let node itself complain
        Err(_) => Ok(()),
    }
}
