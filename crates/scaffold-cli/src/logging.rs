//! Logging initialization for the CLI.
//!
//! Logging is owned by the CLI crate to keep the core library free of
//! subscriber setup. Interactive progress goes through cliclack; this is
//! for diagnostics on stderr.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the tracing subscriber.
///
/// `debug` raises the level from INFO to DEBUG. `RUST_LOG` adds directives
/// on top.
pub fn init(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(format!("scaffold_core={level}").parse().unwrap_or_default())
        .add_directive(format!("scaffold={level}").parse().unwrap_or_default());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(debug)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}
