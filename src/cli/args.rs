//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config-dir <path>`: Docker config directory (default `$DOCKER_CONFIG` or `~/.docker`)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

/// hubscan - Docker Hub ScanID token helper
#[derive(Parser, Debug)]
#[command(name = "hubscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Docker config directory holding scan/tokens.json
    #[arg(long, global = true, value_name = "PATH")]
    pub config_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Prompts are allowed only when stdin is a terminal and output is not quiet.
    pub fn interactive(&self) -> bool {
        !self.quiet && std::io::stdin().is_terminal()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a valid ScanID for a Docker Hub user
    #[command(
        name = "token",
        long_about = "Print a valid ScanID for a Docker Hub user.\n\n\
            The cached token is reused while its signature verifies and it has not \
            expired. Otherwise hubscan logs in to Docker Hub, negotiates a fresh \
            ScanID, and caches it under <config-dir>/scan/tokens.json.",
        after_help = "\
EXAMPLES:
    # Prompt for the password
    hubscan token --username alice

    # Non-interactive
    echo \"$HUB_PASSWORD\" | hubscan token --username alice --password-stdin

    # Against the staging Hub
    DOCKER_SCAN_HUB_INSTANCE=staging hubscan token --username alice"
    )]
    Token {
        /// Docker Hub username
        #[arg(short, long)]
        username: String,

        /// Read the password from stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Check the cached ScanID without contacting Docker Hub
    Status {
        /// Docker Hub username
        #[arg(short, long)]
        username: String,
    },

    /// Remove the cached ScanID for a user
    Logout {
        /// Docker Hub username
        #[arg(short, long)]
        username: String,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    hubscan completion bash > /etc/bash_completion.d/hubscan

    # Zsh
    hubscan completion zsh > \"${fpath[1]}/_hubscan\"

    # Fish
    hubscan completion fish > ~/.config/fish/completions/hubscan.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
