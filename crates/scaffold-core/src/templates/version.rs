//! Update notices for the running CLI

use crate::package::registry::{parse_version, RegistryClient};
use anyhow::Result;

/// Compare the running version against the newest published one
/// Returns a warning message if a newer version exists
pub fn update_notice(
    current_version: &str,
    latest_version: &str,
    package_name: &str,
) -> Option<String> {
    let current = parse_version(current_version)?;
    let latest = parse_version(latest_version)?;

    if latest > current {
        Some(format!(
            "A newer version of {} is available: {} (current: {}).\n\
             Update with: npm install -g {}",
            package_name, latest_version, current_version, package_name
        ))
    } else {
        None
    }
}

/// Ask the registry whether a newer release of the tool exists
pub async fn check_for_update(
    registry: &RegistryClient,
    package_name: &str,
    current_version: &str,
) -> Result<Option<String>> {
    let latest = registry
        .resolve_latest_satisfying(current_version, package_name)
        .await?;
    Ok(latest.and_then(|latest| update_notice(current_version, &latest, package_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_release_available() {
        let notice = update_notice("0.1.0", "0.2.0", "@scaffold-cli/core");
        assert!(notice.is_some());
        assert!(notice.unwrap().contains("0.2.0"));
    }

    #[test]
    fn test_same_version() {
        assert!(update_notice("0.1.0", "0.1.0", "@scaffold-cli/core").is_none());
    }

    #[test]
    fn test_invalid_versions() {
        // Should return None (no warning) for invalid versions
        assert!(update_notice("invalid", "0.1.0", "@scaffold-cli/core").is_none());
    }

    #[tokio::test]
    async fn test_check_for_update() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/tool")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"versions":{"0.1.0":{},"0.3.0":{}}}"#)
            .create_async()
            .await;

        let registry = RegistryClient::new(&server.url()).unwrap();
        let notice = check_for_update(&registry, "tool", "0.1.0").await.unwrap();
        assert!(notice.unwrap().contains("0.3.0"));
    }
}
