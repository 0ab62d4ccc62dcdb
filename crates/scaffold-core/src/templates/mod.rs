//! Template catalog, project information, copying and rendering
//!
//! This module provides:
//! - Template catalog types (Catalog, TemplateDescriptor) and fetching
//! - Project name/version validation and template variables
//! - Template directory copying with placeholder rendering
//! - Update notices for the CLI itself

pub mod catalog;
pub mod copier;
pub mod project;
pub mod version;

pub use catalog::{
    fetch_catalog, Catalog, CatalogSource, ProjectKind, TemplateDescriptor, TemplateKind,
};
pub use copier::{copy_template, empty_dir, is_dir_empty, render_files, render_placeholders};
pub use project::{validate_project_name, validate_version, ProjectInfo};
pub use version::{check_for_update, update_notice};
