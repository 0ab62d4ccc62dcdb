//! Error types for package resolution and cache management

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving, installing or locating a template package.
///
/// A package without a declared entry point is not an error; locator
/// operations return `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum PackageError {
    /// Missing or malformed constructor inputs
    #[error("invalid package options: {0}")]
    InvalidOptions(String),

    /// Network failure or non-success response from the registry
    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// The store directory could not be created
    #[error("cannot create store directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Fetch or extraction of a package failed
    #[error("failed to install {name}@{version}: {message}")]
    Install {
        name: String,
        version: String,
        message: String,
    },

    /// A package manifest exists but cannot be parsed
    #[error("corrupt package manifest {path}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PackageError {
    pub(crate) fn install(name: &str, version: &str, message: impl Into<String>) -> Self {
        Self::Install {
            name: name.to_string(),
            version: version.to_string(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for PackageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::RegistryUnavailable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            Self::RegistryUnavailable(format!("connection failed: {e}"))
        } else {
            Self::RegistryUnavailable(e.to_string())
        }
    }
}
