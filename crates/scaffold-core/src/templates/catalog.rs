//! Template catalog types and fetching
//!
//! The catalog is a YAML document listing the template packages a user can
//! pick from. It is read from a remote URL or a local file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tokio::fs;
use url::Url;

/// Catalog source - either remote URL or local file
#[derive(Debug, Clone)]
pub enum CatalogSource {
    Remote(Url),
    Local(PathBuf),
}

impl CatalogSource {
    /// Interpret a string as a URL when it parses as one, otherwise as a path
    pub fn parse(value: &str) -> Self {
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            _ => Self::Local(PathBuf::from(value)),
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Remote(url) => write!(f, "{}", url),
            CatalogSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// How a template is turned into a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// Copy and render the package's `template/` directory
    #[default]
    Normal,
    /// Run the package's own entry point
    Custom,
}

/// What the user is creating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Project,
    Component,
}

impl ProjectKind {
    /// Catalog tag selecting templates for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            ProjectKind::Project => "project",
            ProjectKind::Component => "component",
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectKind::Project => "Project",
            ProjectKind::Component => "Component",
        };
        write!(f, "{}", name)
    }
}

/// One template package in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    /// Display name
    pub name: String,

    /// Registry package name
    pub npm_name: String,

    /// Concrete or floor version
    pub version: String,

    #[serde(default, rename = "type")]
    pub kind: TemplateKind,

    #[serde(default)]
    pub install_command: Option<String>,

    #[serde(default)]
    pub start_command: Option<String>,

    /// Globs excluded from placeholder rendering
    #[serde(default)]
    pub ignore: Vec<String>,

    /// `project` and/or `component`; untagged templates count as projects
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TemplateDescriptor {
    /// Whether this template can create the given kind
    pub fn supports(&self, kind: ProjectKind) -> bool {
        if self.tags.is_empty() {
            return kind == ProjectKind::Project;
        }
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(kind.tag()))
    }
}

/// The list of available templates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub templates: Vec<TemplateDescriptor>,
}

impl Catalog {
    /// Parse a catalog document
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse template catalog")
    }

    /// Templates usable for a kind, in catalog order
    pub fn for_kind(&self, kind: ProjectKind) -> Vec<&TemplateDescriptor> {
        self.templates.iter().filter(|t| t.supports(kind)).collect()
    }

    /// Look a template up by registry package name
    pub fn find(&self, npm_name: &str) -> Option<&TemplateDescriptor> {
        self.templates.iter().find(|t| t.npm_name == npm_name)
    }
}

/// Fetch the catalog from its source
pub async fn fetch_catalog(source: &CatalogSource, user_agent: &str) -> Result<Catalog> {
    let catalog = match source {
        CatalogSource::Remote(url) => {
            let client = reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .context("Failed to create HTTP client")?;
            let response = client
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("Failed to fetch template catalog from {}", url))?;

            if !response.status().is_success() {
                anyhow::bail!(
                    "Failed to fetch template catalog from {}: HTTP {}",
                    url,
                    response.status()
                );
            }

            Catalog::from_yaml(&response.text().await?)?
        }
        CatalogSource::Local(path) => {
            let content = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Catalog::from_yaml(&content)?
        }
    };

    if catalog.templates.is_empty() {
        anyhow::bail!("No templates found in catalog.");
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
templates:
  - name: Vue admin
    npm_name: "@acme/template-vue-admin"
    version: 1.0.0
    install_command: npm install
    start_command: npm run serve
    ignore: ["**/public/**"]
    tags: [project]
  - name: Button
    npm_name: "@acme/template-button"
    version: 0.2.0
    type: custom
    tags: [component]
  - name: Plain
    npm_name: plain-template
    version: 2.0.0
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        assert_eq!(catalog.templates.len(), 3);

        let vue = catalog.find("@acme/template-vue-admin").unwrap();
        assert_eq!(vue.kind, TemplateKind::Normal);
        assert_eq!(vue.install_command.as_deref(), Some("npm install"));
        assert_eq!(vue.ignore, vec!["**/public/**"]);

        let button = catalog.find("@acme/template-button").unwrap();
        assert_eq!(button.kind, TemplateKind::Custom);
        assert!(button.start_command.is_none());
    }

    #[test]
    fn test_filter_by_kind() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();

        let projects: Vec<_> = catalog
            .for_kind(ProjectKind::Project)
            .iter()
            .map(|t| t.npm_name.as_str())
            .collect();
        assert_eq!(projects, vec!["@acme/template-vue-admin", "plain-template"]);

        let components = catalog.for_kind(ProjectKind::Component);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name, "Button");
    }

    #[test]
    fn test_catalog_source_parse() {
        assert!(matches!(
            CatalogSource::parse("https://example.com/templates.yaml"),
            CatalogSource::Remote(_)
        ));
        assert!(matches!(
            CatalogSource::parse("./templates.yaml"),
            CatalogSource::Local(_)
        ));
        assert_eq!(
            CatalogSource::parse("./templates.yaml").to_string(),
            "./templates.yaml"
        );
    }

    #[tokio::test]
    async fn test_fetch_remote_catalog() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/templates.yaml")
            .with_status(200)
            .with_body(CATALOG)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/templates.yaml", server.url())).unwrap();
        let catalog = fetch_catalog(&CatalogSource::Remote(url), "scaffold-test")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(catalog.templates.len(), 3);
    }

    #[tokio::test]
    async fn test_remote_catalog_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/templates.yaml")
            .with_status(404)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/templates.yaml", server.url())).unwrap();
        let err = fetch_catalog(&CatalogSource::Remote(url), "scaffold-test")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("templates.yaml");
        std::fs::write(&path, "templates: []\n").unwrap();

        assert!(fetch_catalog(&CatalogSource::Local(path), "scaffold-test")
            .await
            .is_err());
    }
}
