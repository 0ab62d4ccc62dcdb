//! Cache path computation for the template store
//!
//! Every installed (name, version) pair lives in its own directory:
//! `<store>/_<sanitized-name>@<version>@<name>`. Entries are never
//! overwritten and never removed by this crate.

use std::path::{Path, PathBuf};

/// Replace every path separator in a package name with `_`
///
/// Scoped names such as `@scope/name` must not produce nested prefixes.
pub fn sanitize_name(package_name: &str) -> String {
    package_name.replace(['/', '\\'], "_")
}

/// Compute the cache directory of a package version inside a store
pub fn cache_path(store_dir: &Path, package_name: &str, version: &str) -> PathBuf {
    store_dir.join(format!(
        "_{}@{}@{}",
        sanitize_name(package_name),
        version,
        package_name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_package_path() {
        let path = cache_path(Path::new("/cache"), "@scope/tmpl", "1.2.0");
        assert_eq!(path, PathBuf::from("/cache/_@scope_tmpl@1.2.0@@scope/tmpl"));
    }

    #[test]
    fn test_plain_package_path() {
        let path = cache_path(Path::new("/cache"), "tmpl", "0.1.0");
        assert_eq!(path, PathBuf::from("/cache/_tmpl@0.1.0@tmpl"));
    }

    #[test]
    fn test_sanitized_name_has_no_separators() {
        for name in ["@scope/name", "a/b/c", "win\\style", "plain"] {
            let sanitized = sanitize_name(name);
            assert!(!sanitized.contains('/'), "{sanitized}");
            assert!(!sanitized.contains('\\'), "{sanitized}");
        }
    }

    #[test]
    fn test_cache_path_is_deterministic() {
        let store = Path::new("/store");
        assert_eq!(
            cache_path(store, "tmpl", "1.0.0"),
            cache_path(store, "tmpl", "1.0.0")
        );
    }

    #[test]
    fn test_each_input_changes_path() {
        let base = cache_path(Path::new("/store"), "tmpl", "1.0.0");
        assert_ne!(base, cache_path(Path::new("/other"), "tmpl", "1.0.0"));
        assert_ne!(base, cache_path(Path::new("/store"), "tmpl2", "1.0.0"));
        assert_ne!(base, cache_path(Path::new("/store"), "tmpl", "1.0.1"));
    }
}
