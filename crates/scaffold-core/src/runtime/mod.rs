//! Runtime detection and child process execution
//!
//! This module provides:
//! - Node.js detection and minimum version checks
//! - Whitelisted command execution with inherited stdio

pub mod check;
pub mod process;

pub use check::{check_node, require_node, RuntimeInfo, LOWEST_NODE_VERSION};
pub use process::{parse_command, run_command, spawn_inherited, COMMAND_WHITELIST};
