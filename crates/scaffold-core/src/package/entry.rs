//! Entry-point lookup through the nearest `package.json`

use super::error::PackageError;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Manifest file marking a package root
pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    main: Option<String>,
}

/// Walk upward from `start` to the nearest directory holding a manifest
pub fn locate_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE).is_file())
        .map(Path::to_path_buf)
}

/// Resolve the `main` field of the manifest in `manifest_dir`
///
/// Returns `Ok(None)` when the manifest is absent or declares no entry.
/// An unparseable manifest is an error so a corrupt package is not
/// mistaken for one without an entry point.
pub fn resolve_main(manifest_dir: &Path) -> Result<Option<PathBuf>, PackageError> {
    let manifest_path = manifest_dir.join(MANIFEST_FILE);
    let content = match fs::read_to_string(&manifest_path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let manifest: PackageManifest =
        serde_json::from_str(&content).map_err(|e| PackageError::ManifestParse {
            path: manifest_path.clone(),
            message: e.to_string(),
        })?;

    let Some(main) = manifest.main.filter(|m| !m.trim().is_empty()) else {
        debug!(manifest = %manifest_path.display(), "manifest declares no main entry");
        return Ok(None);
    };

    let resolved = normalize(&manifest_dir.join(main));
    Ok(Some(to_forward_slashes(&resolved)))
}

/// Locate the package root above `start` and resolve its entry file
pub fn root_file_path(start: &Path) -> Result<Option<PathBuf>, PackageError> {
    match locate_root(start) {
        Some(dir) => resolve_main(&dir),
        None => Ok(None),
    }
}

/// Lexically collapse `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Render a path with `/` separators on every platform
fn to_forward_slashes(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), content).unwrap();
    }

    #[test]
    fn test_resolves_main_with_forward_slashes() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), r#"{"name":"tmpl","main":"lib/index.js"}"#);

        let entry = root_file_path(tmp.path()).unwrap().unwrap();
        let expected = format!("{}/lib/index.js", tmp.path().display()).replace('\\', "/");
        assert_eq!(entry.to_string_lossy(), expected);
    }

    #[test]
    fn test_walks_up_to_nearest_manifest() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), r#"{"main":"./index.js"}"#);
        let nested = tmp.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(locate_root(&nested).unwrap(), tmp.path());
        let entry = root_file_path(&nested).unwrap().unwrap();
        assert!(entry.to_string_lossy().ends_with("/index.js"));
        assert!(!entry.to_string_lossy().contains("/./"));
    }

    #[test]
    fn test_missing_main_is_none() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), r#"{"name":"tmpl"}"#);
        assert!(root_file_path(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn test_missing_manifest_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(resolve_main(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_manifest_is_error() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), "{ not json");
        assert!(matches!(
            root_file_path(tmp.path()),
            Err(PackageError::ManifestParse { .. })
        ));
    }

    #[test]
    fn test_normalize_parent_components() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d.js")),
            PathBuf::from("/a/c/d.js")
        );
    }
}
