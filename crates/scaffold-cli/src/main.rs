//! scaffold - Project scaffolding from registry template packages

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use scaffold_core::package::default_registry_url;
use scaffold_core::settings::{DEFAULT_CLI_HOME, SELF_PACKAGE};
use scaffold_core::templates::check_for_update;
use scaffold_core::tui::InitArgs;
use scaffold_core::{dispatch, CatalogSource, RegistryClient, Settings};
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "scaffold")]
#[command(about = "Create projects and components from registry template packages")]
#[command(version)]
pub struct Args {
    /// Print debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Local checkout of a command package to run instead of the cache (for development use)
    #[arg(long = "target-path", global = true, env = "SCAFFOLD_TARGET_PATH")]
    pub target_path: Option<PathBuf>,

    /// Registry to resolve and download packages from
    #[arg(long, global = true, env = "SCAFFOLD_REGISTRY")]
    pub registry: Option<String>,

    /// Use the upstream npm registry instead of the mirror
    #[arg(long = "use-original-registry", global = true)]
    pub use_original_registry: bool,

    /// Cache directory, relative to the home directory unless absolute
    #[arg(long = "cli-home", global = true, env = "SCAFFOLD_HOME", default_value = DEFAULT_CLI_HOME)]
    pub cli_home: PathBuf,

    /// Template catalog URL or local YAML file
    #[arg(long, global = true, env = "SCAFFOLD_CATALOG")]
    pub catalog: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project or component in the current directory
    Init(CliInitArgs),
    /// Run a command through its package entry point
    Exec(ExecArgs),
}

#[derive(Parser, Debug, Default)]
pub struct CliInitArgs {
    /// Project name
    pub project_name: Option<String>,

    /// Continue in a non-empty directory without asking
    #[arg(short, long)]
    pub force: bool,

    /// Template package to use (registry name)
    #[arg(short, long)]
    pub template: Option<String>,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliInitArgs> for InitArgs {
    fn from(args: CliInitArgs) -> Self {
        InitArgs {
            project_name: args.project_name,
            force: args.force,
            template: args.template,
            yes: args.yes,
        }
    }
}

impl CliInitArgs {
    /// Arguments as handed to the init package entry point
    fn to_command_args(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(name) = &self.project_name {
            out.push(name.clone());
        }
        if self.force {
            out.push("--force".to_string());
        }
        if self.yes {
            out.push("--yes".to_string());
        }
        if let Some(template) = &self.template {
            out.push("--template".to_string());
            out.push(template.clone());
        }
        out
    }
}

#[derive(Parser, Debug)]
pub struct ExecArgs {
    /// Command name
    pub command: String,

    /// Arguments passed through to the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

fn build_settings(args: &Args) -> Result<Settings> {
    let home = dirs::home_dir().context("Could not determine the user home directory")?;
    if !home.is_dir() {
        anyhow::bail!("User home directory {} does not exist", home.display());
    }

    let registry = args
        .registry
        .clone()
        .unwrap_or_else(|| default_registry_url(args.use_original_registry).to_string());

    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    let mut settings = Settings::new(home)
        .with_cli_home(&args.cli_home)
        .with_target_path(resolve_target_path(args.target_path.clone(), &cwd))
        .with_registry_url(registry);
    if let Some(catalog) = &args.catalog {
        settings = settings.with_catalog(CatalogSource::parse(catalog));
    }
    Ok(settings)
}

/// Anchor a relative target path at `cwd`
fn resolve_target_path(path: Option<PathBuf>, cwd: &Path) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty()).map(|p| {
        if p.is_absolute() {
            p
        } else {
            cwd.join(p)
        }
    })
}

/// Warn when a newer release of the tool is published
async fn print_update_notice(settings: &Settings) {
    let notice = match RegistryClient::new(settings.registry_url()) {
        Ok(registry) => check_for_update(&registry, SELF_PACKAGE, CLI_VERSION).await,
        Err(e) => Err(e.into()),
    };
    match notice {
        Ok(Some(message)) => eprintln!("{}", message.yellow()),
        Ok(None) => {}
        Err(e) => debug!(error = %e, "update check failed"),
    }
}

async fn run_init(settings: &Settings, args: CliInitArgs) -> Result<i32> {
    // A local init checkout takes over from the built-in flow
    if settings.target_path().is_some() {
        return dispatch::exec_command(settings, "init", &args.to_command_args()).await;
    }

    let user_agent = format!("scaffold/{}", CLI_VERSION);
    let result = scaffold_core::run(settings, args.into(), &user_agent).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result.map(|_| 0)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    logging::init(args.debug);
    debug!(version = CLI_VERSION, "scaffold starting");

    let settings = build_settings(&args)?;
    debug!(?settings, "settings");

    print_update_notice(&settings).await;

    let code = match args.command {
        Some(Command::Init(init_args)) => run_init(&settings, init_args).await?,
        Some(Command::Exec(exec_args)) => {
            dispatch::exec_command(&settings, &exec_args.command, &exec_args.args).await?
        }
        // No subcommand provided, default to init (interactive mode)
        None => run_init(&settings, CliInitArgs::default()).await?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
