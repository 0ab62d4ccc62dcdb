//! Template directory copying and placeholder rendering

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

/// Globs never rendered, whatever the template says
const DEFAULT_IGNORE: &[&str] = &["**/node_modules/**", "node_modules/**"];

/// Whether a directory is empty, ignoring dotfiles and `node_modules`
pub fn is_dir_empty(dir: &Path) -> Result<bool> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with('.') && name != "node_modules" {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Remove everything inside a directory, keeping the directory itself
pub async fn empty_dir(dir: &Path) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let removed = if entry.file_type().await?.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        removed.with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Copy every file under `source_dir` into `target_dir`
///
/// Returns the copied paths relative to `target_dir`, with `/` separators.
pub async fn copy_template(source_dir: &Path, target_dir: &Path) -> Result<Vec<String>> {
    if !source_dir.is_dir() {
        anyhow::bail!("Template directory not found: {}", source_dir.display());
    }

    // Ensure target directory exists
    fs::create_dir_all(target_dir)
        .await
        .context("Failed to create target directory")?;

    let mut copied_files = Vec::new();

    for entry in WalkDir::new(source_dir).follow_links(false) {
        let entry = entry.context("Failed to walk template directory")?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .context("Template file outside template directory")?;
        let target_path = target_dir.join(relative);

        // Ensure parent directories exist
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::copy(entry.path(), &target_path)
            .await
            .with_context(|| format!("Failed to write file: {}", target_path.display()))?;

        copied_files.push(relative.to_string_lossy().replace('\\', "/"));
    }

    copied_files.sort();
    Ok(copied_files)
}

/// Render placeholders in copied files, skipping ignored and binary files
///
/// Returns the rendered paths.
pub async fn render_files(
    target_dir: &Path,
    files: &[String],
    ignore: &[String],
    vars: &BTreeMap<String, String>,
) -> Result<Vec<String>> {
    let patterns = ignore_patterns(ignore)?;
    let mut rendered = Vec::new();

    for file in files {
        if is_ignored(file, &patterns) {
            continue;
        }

        let path = target_dir.join(file);
        let bytes = fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let Ok(text) = String::from_utf8(bytes) else {
            continue;
        };

        let output = render_placeholders(&text, vars);
        if output != text {
            fs::write(&path, output)
                .await
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
        }
        rendered.push(file.clone());
    }

    Ok(rendered)
}

/// Replace `<%= key %>` with the value of `key`; unknown keys stay verbatim
pub fn render_placeholders(text: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("<%=") {
        let Some(len) = rest[start..].find("%>") else {
            break;
        };
        let end = start + len + 2;
        let key = rest[start + 3..start + len].trim();

        out.push_str(&rest[..start]);
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..end]),
        }
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

fn ignore_patterns(ignore: &[String]) -> Result<Vec<Pattern>> {
    DEFAULT_IGNORE
        .iter()
        .copied()
        .chain(ignore.iter().map(String::as_str))
        .map(|p| Pattern::new(p).with_context(|| format!("Invalid ignore pattern '{}'", p)))
        .collect()
}

fn is_ignored(file: &str, patterns: &[Pattern]) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    patterns.iter().any(|p| p.matches_with(file, options))
}
