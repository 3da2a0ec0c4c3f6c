//! Brot shell - main entry point.
//!
//! Loads the action bindings, registers the sample workspace and editor,
//! and runs a line-oriented palette on stdin against the in-memory index.

mod demo;
mod shell;

use brot_core::{actions_path, ActionsConfig};

use crate::shell::Shell;

/// Initialize tracing with environment-based filtering.
///
/// Log levels can be controlled via the `RUST_LOG` environment variable:
/// - `RUST_LOG=debug` - Enable debug logs for all modules
/// - `RUST_LOG=info,brot=debug` - Info for most, debug for brot crates
///
/// Logs go to stderr so they don't interleave with shell output.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,brot=debug"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();
}

/// Load `actions.toml`, falling back to the built-in bindings when it is
/// missing, unreadable, or defines no palettes.
fn load_config() -> ActionsConfig {
    match ActionsConfig::load_default() {
        Ok(config) if !config.palettes.is_empty() => {
            tracing::info!("Loaded bindings from {:?}", actions_path());
            return config;
        }
        Ok(_) => tracing::info!("No palettes configured, using built-in bindings"),
        Err(e) => tracing::warn!("Failed to load actions.toml: {} - using built-in bindings", e),
    }

    demo::default_config().unwrap_or_else(|e| {
        tracing::error!("Built-in bindings are invalid: {}", e);
        ActionsConfig::default()
    })
}

// =============================================================================
// Entry Point
// =============================================================================

fn main() {
    init_tracing();
    tracing::info!("Brot shell starting...");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut shell = Shell::new(runtime, load_config());
    shell.run(&mut std::io::stdin().lock());
}
