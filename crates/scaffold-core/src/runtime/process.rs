//! Child process execution with inherited stdio
//!
//! Template install/start commands come from remote catalogs, so only a
//! fixed set of package-manager programs may be launched from them.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;
use tracing::debug;

/// Programs a template command line may start
pub const COMMAND_WHITELIST: &[&str] = &["npm", "cnpm", "yarn", "pnpm", "node"];

/// Split a command line and check its program against the whitelist
pub fn parse_command(command_line: &str) -> Result<(String, Vec<String>)> {
    let mut parts = command_line.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty command"))?;

    if !COMMAND_WHITELIST.contains(&program.as_str()) {
        anyhow::bail!(
            "Command '{}' is not allowed (allowed: {})",
            program,
            COMMAND_WHITELIST.join(", ")
        );
    }

    Ok((program, parts.collect()))
}

/// Run a whitelisted command line in `cwd`, failing on a non-zero exit
pub async fn run_command(command_line: &str, cwd: &Path) -> Result<()> {
    let (program, args) = parse_command(command_line)?;

    println!();
    println!("{} {}", "Running:".dimmed(), command_line.yellow());
    println!();

    let code = spawn_inherited(&program, &args, cwd).await?;
    if code != 0 {
        anyhow::bail!(
            "Command '{}' failed with exit code: {}",
            command_line,
            code
        );
    }
    Ok(())
}

/// Spawn a program with inherited stdio and wait for its exit code
///
/// On Windows the program is started through `cmd /c` so that `.cmd` shims
/// such as `npm.cmd` resolve.
pub async fn spawn_inherited(program: &str, args: &[String], cwd: &Path) -> Result<i32> {
    let mut command = if cfg!(windows) {
        let mut cmd = TokioCommand::new("cmd");
        cmd.arg("/c").arg(program);
        cmd
    } else {
        TokioCommand::new(program)
    };

    debug!(program, ?args, cwd = %cwd.display(), "spawning child process");
    let status = command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("Failed to start '{}'", program))?;

    // Killed by a signal: report a generic failure
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whitelisted_command() {
        let (program, args) = parse_command("npm install --registry https://r.example").unwrap();
        assert_eq!(program, "npm");
        assert_eq!(args, vec!["install", "--registry", "https://r.example"]);
    }

    #[test]
    fn test_reject_unknown_program() {
        let err = parse_command("rm -rf /").unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_reject_empty_command() {
        assert!(parse_command("   ").is_err());
    }

    #[tokio::test]
    async fn test_rejected_command_is_not_run() {
        let cwd = std::env::temp_dir();
        assert!(run_command("curl https://example.com", &cwd).await.is_err());
    }
}
