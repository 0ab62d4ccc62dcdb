//! Charm-style `init` prompts using cliclack

use crate::dispatch;
use crate::package::{Package, PackageOptions};
use crate::runtime;
use crate::settings::Settings;
use crate::templates::{
    copier, fetch_catalog, project, Catalog, CatalogSource, ProjectInfo, ProjectKind,
    TemplateDescriptor, TemplateKind,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Default version offered for a new project
const DEFAULT_PROJECT_VERSION: &str = "1.0.0";

/// Subdirectory of a template package holding the files to copy
const TEMPLATE_SUBDIR: &str = "template";

/// CLI arguments for the init command
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    /// Project name
    pub project_name: Option<String>,

    /// Clear a non-empty directory without asking to continue first
    pub force: bool,

    /// Template package to use (registry name)
    pub template: Option<String>,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Options handed to a custom template's entry point
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomTemplateOptions<'a> {
    template_info: &'a TemplateDescriptor,
    project_info: &'a ProjectInfo,
    source_path: String,
    target_path: String,
}

/// Run the init flow with interactive prompts
pub async fn run(settings: &Settings, args: InitArgs, user_agent: &str) -> Result<()> {
    cliclack::intro("scaffold init")?;

    let target_dir = std::env::current_dir().context("Failed to read current directory")?;

    // Step 1: Make sure the target directory may be used
    if !prepare_directory(&target_dir, &args).await? {
        cliclack::outro_cancel("Setup cancelled.")?;
        return Ok(());
    }

    // Step 2: Load the catalog
    let catalog = load_catalog(settings, user_agent).await?;

    // Step 3: Collect project information
    let info = collect_project_info(&args)?;

    // Step 4: Pick a template
    let template = select_template(&catalog, info.kind, args.template.as_deref(), args.yes)?;

    // Step 5: Download the template package
    let package = download_template(settings, template).await?;

    // Step 6: Install the template into the directory
    match template.kind {
        TemplateKind::Normal => install_normal(&package, template, &info, &target_dir).await?,
        TemplateKind::Custom => install_custom(&package, template, &info, &target_dir).await?,
    }

    cliclack::outro("Happy coding!")?;
    Ok(())
}

/// Returns false when the user declines to use a non-empty directory
async fn prepare_directory(dir: &Path, args: &InitArgs) -> Result<bool> {
    if copier::is_dir_empty(dir)? {
        return Ok(true);
    }

    let proceed = if args.force || args.yes {
        true
    } else {
        cliclack::confirm("Current directory is not empty. Continue creating the project?")
            .initial_value(false)
            .interact()?
    };
    if !proceed {
        return Ok(false);
    }

    // Non-interactive runs only clear with --force
    let clear = if args.yes {
        args.force
    } else {
        cliclack::confirm(format!("Remove all files in {}?", dir.display()))
            .initial_value(false)
            .interact()?
    };

    if clear {
        copier::empty_dir(dir).await?;
        cliclack::log::info(format!("Cleared {}", dir.display()))?;
    }
    Ok(true)
}

async fn load_catalog(settings: &Settings, user_agent: &str) -> Result<Catalog> {
    let spinner = cliclack::spinner();
    spinner.start("Loading templates...");

    match fetch_catalog(settings.catalog(), user_agent).await {
        Ok(catalog) => {
            spinner.stop(format!("Loaded {} templates", catalog.templates.len()));
            Ok(catalog)
        }
        Err(e) => {
            spinner.stop("Failed to load templates");
            Err(e.context(catalog_hint(settings.catalog())))
        }
    }
}

fn catalog_hint(source: &CatalogSource) -> String {
    format!(
        "Could not load the template catalog from {}. \
         Point to another one with --catalog <url|file> or SCAFFOLD_CATALOG",
        source
    )
}

fn collect_project_info(args: &InitArgs) -> Result<ProjectInfo> {
    if args.yes {
        let name = args
            .project_name
            .clone()
            .ok_or_else(|| anyhow::anyhow!("A project name is required with --yes"))?;
        project::validate_project_name(&name).map_err(|e| anyhow::anyhow!(e))?;
        return Ok(ProjectInfo::new(
            ProjectKind::Project,
            &name,
            DEFAULT_PROJECT_VERSION,
            None,
        ));
    }

    let kind: ProjectKind = cliclack::select("What would you like to create?")
        .item(ProjectKind::Project, "Project", "")
        .item(ProjectKind::Component, "Component", "")
        .interact()?;

    // A valid name from the command line skips the prompt
    let name = match &args.project_name {
        Some(name) if project::validate_project_name(name).is_ok() => {
            cliclack::log::info(format!("{} name: {}", kind, name))?;
            name.clone()
        }
        _ => cliclack::input(format!("{} name", kind))
            .validate(|input: &String| project::validate_project_name(input))
            .interact()?,
    };

    let version: String = cliclack::input(format!("{} version", kind))
        .default_input(DEFAULT_PROJECT_VERSION)
        .validate(|input: &String| project::validate_version(input).map(|_| ()))
        .interact()?;
    let version = project::validate_version(&version).map_err(|e| anyhow::anyhow!(e))?;

    let description = if kind == ProjectKind::Component {
        let text: String = cliclack::input("Component description")
            .validate(|input: &String| {
                if input.trim().is_empty() {
                    Err("Description must not be empty")
                } else {
                    Ok(())
                }
            })
            .interact()?;
        Some(text)
    } else {
        None
    };

    Ok(ProjectInfo::new(kind, &name, &version, description))
}

fn select_template<'a>(
    catalog: &'a Catalog,
    kind: ProjectKind,
    specified: Option<&str>,
    yes: bool,
) -> Result<&'a TemplateDescriptor> {
    // If a template was specified via --template flag, use it directly
    if let Some(npm_name) = specified {
        let template = catalog.find(npm_name).ok_or_else(|| {
            let available: Vec<&str> = catalog
                .templates
                .iter()
                .map(|t| t.npm_name.as_str())
                .collect();
            anyhow::anyhow!(
                "Template '{}' not found. Available templates: {}",
                npm_name,
                available.join(", ")
            )
        })?;
        cliclack::log::info(format!("Using template: {}", template.name))?;
        return Ok(template);
    }

    let candidates = catalog.for_kind(kind);
    if candidates.is_empty() {
        anyhow::bail!("No {} templates found.", kind.tag());
    }

    // If only one template, or non-interactive, use the first one
    if candidates.len() == 1 || yes {
        let template = candidates[0];
        cliclack::log::info(format!("Using template: {}", template.name))?;
        return Ok(template);
    }

    // Build select prompt - use indices to avoid borrow issues
    let mut select = cliclack::select("Select a template");
    for (idx, template) in candidates.iter().enumerate() {
        select = select.item(idx, &template.name, &template.npm_name);
    }
    let selected_idx: usize = select.interact()?;

    Ok(candidates[selected_idx])
}

async fn download_template(settings: &Settings, template: &TemplateDescriptor) -> Result<Package> {
    let mut package = Package::new(PackageOptions {
        target_path: settings.template_dir(),
        store_dir: Some(settings.template_store()),
        package_name: template.npm_name.clone(),
        package_version: template.version.clone(),
        registry_url: Some(settings.registry_url().to_string()),
    })?;

    let spinner = cliclack::spinner();
    spinner.start("Downloading template...");

    let result = async {
        if package.exists().await? {
            package.update().await?;
            Ok::<_, anyhow::Error>("Template updated")
        } else {
            package.install().await?;
            Ok("Template downloaded")
        }
    }
    .await;

    match result {
        Ok(message) => {
            spinner.stop(format!(
                "{} ({}@{})",
                message,
                package.name(),
                package.resolved_version().unwrap_or_default()
            ));
            Ok(package)
        }
        Err(e) => {
            spinner.stop("Failed to download template");
            Err(e)
        }
    }
}

async fn install_normal(
    package: &Package,
    template: &TemplateDescriptor,
    info: &ProjectInfo,
    target_dir: &Path,
) -> Result<()> {
    let source_dir = package.package_dir()?.join(TEMPLATE_SUBDIR);
    debug!(source = %source_dir.display(), "copying template");

    let spinner = cliclack::spinner();
    spinner.start("Creating project...");

    let files = match copier::copy_template(&source_dir, target_dir).await {
        Ok(files) => files,
        Err(e) => {
            spinner.stop("Failed to copy template");
            return Err(e);
        }
    };
    let rendered =
        copier::render_files(target_dir, &files, &template.ignore, &info.template_vars()).await?;

    spinner.stop(format!(
        "Created {} files ({} rendered) in {}",
        files.len(),
        rendered.len(),
        target_dir.display()
    ));

    if let Some(command) = &template.install_command {
        runtime::run_command(command, target_dir)
            .await
            .context("Dependency installation failed")?;
    }
    if let Some(command) = &template.start_command {
        runtime::run_command(command, target_dir)
            .await
            .context("Start command failed")?;
    }

    Ok(())
}

async fn install_custom(
    package: &Package,
    template: &TemplateDescriptor,
    info: &ProjectInfo,
    target_dir: &Path,
) -> Result<()> {
    let entry = package.root_file_path()?.ok_or_else(|| {
        anyhow::anyhow!(
            "Custom template {} declares no entry point",
            template.npm_name
        )
    })?;

    let options = CustomTemplateOptions {
        template_info: template,
        project_info: info,
        source_path: package
            .package_dir()?
            .join(TEMPLATE_SUBDIR)
            .to_string_lossy()
            .replace('\\', "/"),
        target_path: target_dir.to_string_lossy().replace('\\', "/"),
    };

    cliclack::log::info(format!("Running custom template {}", template.name))?;
    let code = dispatch::run_entry(&entry, &options, target_dir).await?;
    if code != 0 {
        anyhow::bail!("Custom template exited with code {}", code);
    }
    Ok(())
}
