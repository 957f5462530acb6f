//! cli
//!
//! Command-line interface layer for hubscan.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the `tracing` subscriber
//! - Resolve settings once and hand them to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers build the auth components from
//! [`Settings`] and delegate to [`crate::auth`]; they only format output.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use anyhow::{Context as _, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::Settings;
use crate::core::paths::ScanPaths;
use crate::hub::INSTANCE_ENV_VAR;
use crate::ui::output::{self, Verbosity};

/// Per-invocation state derived from global flags.
#[derive(Debug, Clone)]
pub struct Context {
    pub paths: ScanPaths,
    pub verbosity: Verbosity,
    pub interactive: bool,
}

impl Context {
    /// Load settings for this invocation, reporting config warnings.
    pub fn settings(&self) -> Result<Settings> {
        let instance = std::env::var(INSTANCE_ENV_VAR).ok();
        let result = Settings::load(&self.paths, instance.as_deref())
            .context("Failed to load configuration")?;

        for warning in &result.warnings {
            output::warn(&warning.message, self.verbosity);
        }
        if let Some(source) = &result.source {
            output::debug(
                format!("loaded config from {}", source.display()),
                self.verbosity,
            );
        }
        output::debug(
            format!("hub instance: {}", result.settings.instance),
            self.verbosity,
        );
        Ok(result.settings)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    init_tracing(verbosity);

    if let Command::Completion { shell } = cli.command {
        return commands::completion(shell);
    }

    let ctx = Context {
        paths: ScanPaths::resolve(cli.config_dir.clone())
            .context("Failed to locate the Docker config directory")?,
        verbosity,
        interactive: cli.interactive(),
    };

    commands::dispatch(cli.command, &ctx)
}

/// Install the global subscriber. `RUST_LOG` wins over the flags.
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));

    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init();
}
