//! core::paths
//!
//! Centralized path routing for scan storage locations.
//!
//! # Storage Layout
//!
//! Everything lives under the Docker CLI configuration directory:
//! - `scan/tokens.json` - cached ScanID per registry username
//! - `scan/auth.toml` - optional overrides for Hub endpoints and timeouts
//!
//! # Config Directory
//!
//! Resolved in order:
//! 1. an explicit directory (the `--config-dir` flag)
//! 2. `$DOCKER_CONFIG` if set and non-empty
//! 3. `~/.docker`
//!
//! # Example
//!
//! ```
//! use hubscan::core::paths::ScanPaths;
//! use std::path::PathBuf;
//!
//! let paths = ScanPaths::new(PathBuf::from("/home/alice/.docker"));
//! assert_eq!(
//!     paths.tokens_path(),
//!     PathBuf::from("/home/alice/.docker/scan/tokens.json")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::core::config::ConfigError;

/// Environment variable overriding the Docker config directory.
pub const DOCKER_CONFIG_ENV_VAR: &str = "DOCKER_CONFIG";

/// Path routing rooted at the Docker config directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPaths {
    /// The Docker CLI config directory.
    pub config_dir: PathBuf,
}

impl ScanPaths {
    /// Route paths under `config_dir`.
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Resolve the config directory from the flag, the environment, and the home directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] when nothing is set and the home
    /// directory cannot be determined.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::resolve_from(
            explicit,
            std::env::var(DOCKER_CONFIG_ENV_VAR).ok(),
            dirs::home_dir(),
        )
    }

    /// Deterministic variant of [`ScanPaths::resolve`].
    pub fn resolve_from(
        explicit: Option<PathBuf>,
        docker_config: Option<String>,
        home: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if let Some(dir) = explicit {
            return Ok(Self::new(dir));
        }
        if let Some(dir) = docker_config.filter(|d| !d.trim().is_empty()) {
            return Ok(Self::new(PathBuf::from(dir)));
        }
        let home = home.ok_or(ConfigError::NoHomeDir)?;
        Ok(Self::new(home.join(".docker")))
    }

    /// The Docker config directory.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// `<config_dir>/scan`
    pub fn scan_dir(&self) -> PathBuf {
        self.config_dir.join("scan")
    }

    /// `<config_dir>/scan/tokens.json`
    pub fn tokens_path(&self) -> PathBuf {
        self.scan_dir().join("tokens.json")
    }

    /// `<config_dir>/scan/auth.toml`
    pub fn auth_config_path(&self) -> PathBuf {
        self.scan_dir().join("auth.toml")
    }
}
