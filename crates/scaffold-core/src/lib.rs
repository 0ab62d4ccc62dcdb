//! Scaffold Core - Shared library for the `scaffold` project scaffolding CLI
//!
//! Templates are ordinary registry packages. This library resolves them,
//! keeps them in a version-isolated local cache, and turns them into
//! projects.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Package cache** - registry client, cache paths, the
//!   [`Package`] resource, installer and entry-point lookup
//! - **Layer 2: Workflow** - template catalog, copying and rendering,
//!   runtime checks, command dispatch to package entry points
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based `init` prompts (feature-gated)
//!
//! Configuration arrives as an explicit [`Settings`] value; nothing in this
//! crate reads process environment variables.
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use scaffold_core::{Package, PackageOptions};
//!
//! let mut pkg = Package::new(PackageOptions {
//!     target_path: "/home/dev/.scaffold/template".into(),
//!     store_dir: Some("/home/dev/.scaffold/template/node_modules".into()),
//!     package_name: "@acme/template-vue".to_string(),
//!     package_version: "latest".to_string(),
//!     registry_url: None,
//! })?;
//! pkg.ensure_installed().await?;
//! let entry = pkg.root_file_path()?;
//! ```

pub mod dispatch;
pub mod package;
pub mod runtime;
pub mod settings;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use package::{Package, PackageError, PackageOptions, RegistryClient};
pub use runtime::{check_node, RuntimeInfo};
pub use settings::Settings;
pub use templates::{Catalog, CatalogSource, ProjectInfo, TemplateDescriptor};

#[cfg(feature = "tui")]
pub use tui::run;
