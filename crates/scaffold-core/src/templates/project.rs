//! Project information collected before rendering a template

use super::catalog::ProjectKind;
use semver::Version;
use serde::Serialize;
use std::collections::BTreeMap;

/// Validated answers for the project being created
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub kind: ProjectKind,
    pub project_name: String,
    pub class_name: String,
    pub version: String,
    pub description: Option<String>,
}

impl ProjectInfo {
    pub fn new(
        kind: ProjectKind,
        project_name: &str,
        version: &str,
        description: Option<String>,
    ) -> Self {
        Self {
            kind,
            project_name: project_name.to_string(),
            class_name: class_name(project_name),
            version: version.to_string(),
            description,
        }
    }

    /// Values substituted into `<%= key %>` placeholders
    pub fn template_vars(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert("projectName".to_string(), self.project_name.clone());
        vars.insert("className".to_string(), self.class_name.clone());
        vars.insert("version".to_string(), self.version.clone());
        if let Some(description) = &self.description {
            vars.insert("description".to_string(), description.clone());
        }
        vars
    }
}

/// Check a project name
///
/// Must start with a letter and end with a letter or digit; `-` and `_` may
/// only appear singly between letters or digits.
pub fn validate_project_name(name: &str) -> Result<(), String> {
    let chars: Vec<char> = name.chars().collect();

    let (Some(first), Some(last)) = (chars.first(), chars.last()) else {
        return Err("Project name must not be empty".to_string());
    };
    if !first.is_ascii_alphabetic() {
        return Err("Project name must start with a letter".to_string());
    }
    if !last.is_ascii_alphanumeric() {
        return Err("Project name must end with a letter or digit".to_string());
    }

    let is_sep = |c: char| c == '-' || c == '_';
    for pair in chars.windows(2) {
        if is_sep(pair[0]) && is_sep(pair[1]) {
            return Err("Separators '-' and '_' cannot be repeated".to_string());
        }
    }
    if let Some(bad) = chars
        .iter()
        .find(|c| !c.is_ascii_alphanumeric() && !is_sep(**c))
    {
        return Err(format!("Invalid character '{}' in project name", bad));
    }

    Ok(())
}

/// Check a project version; returns the normalized form
pub fn validate_version(version: &str) -> Result<String, String> {
    let cleaned = version.trim().trim_start_matches('v');
    Version::parse(cleaned)
        .map(|v| v.to_string())
        .map_err(|e| format!("Invalid version '{}': {}", version, e))
}

/// Kebab-case a project name for use as a package/class identifier
pub fn class_name(project_name: &str) -> String {
    let mut out = String::with_capacity(project_name.len() + 4);
    for c in project_name.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '_' {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["a", "app", "my-app", "my_app2", "MyApp", "a-b_c"] {
            assert!(validate_project_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "1app", "-app", "app-", "my--app", "my-_app", "my app", "app!"] {
            assert!(validate_project_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn test_validate_version() {
        assert_eq!(validate_version("v1.0.0").unwrap(), "1.0.0");
        assert!(validate_version("1.0").is_err());
    }

    #[test]
    fn test_class_name() {
        assert_eq!(class_name("MyApp"), "my-app");
        assert_eq!(class_name("admin_panel"), "admin-panel");
        assert_eq!(class_name("vue-admin"), "vue-admin");
    }

    #[test]
    fn test_template_vars() {
        let info = ProjectInfo::new(
            ProjectKind::Component,
            "FancyButton",
            "0.1.0",
            Some("A button".to_string()),
        );
        let vars = info.template_vars();
        assert_eq!(vars["className"], "fancy-button");
        assert_eq!(vars["version"], "0.1.0");
        assert_eq!(vars["description"], "A button");
    }
}
