//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values for the selected Hub instance
//! 2. `<config-dir>/scan/auth.toml`
//! 3. `$DOCKER_SCAN_HUB_INSTANCE` (instance selection only)
//!
//! Explicit `hub_url`/`jwks_url` entries in the file win over the URLs of
//! whichever instance ends up selected.
//!
//! The instance variable is read once by the caller and passed in, so
//! loading itself never touches the process environment.
//!
//! # Example
//!
//! ```no_run
//! use hubscan::core::config::Settings;
//! use hubscan::core::paths::ScanPaths;
//!
//! let paths = ScanPaths::resolve(None).unwrap();
//! let instance = std::env::var("DOCKER_SCAN_HUB_INSTANCE").ok();
//! let result = Settings::load(&paths, instance.as_deref()).unwrap();
//! println!("Hub: {}", result.settings.hub_url);
//! ```

pub mod schema;

pub use schema::AuthFileConfig;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::auth::validator::DEFAULT_LEEWAY;
use crate::core::paths::ScanPaths;
use crate::hub::{HubInstance, DEFAULT_REQUEST_TIMEOUT};

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The effective settings.
    pub settings: Settings,
    /// Path of the config file that was read, if any.
    pub source: Option<PathBuf>,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub instance: HubInstance,
    pub hub_url: String,
    pub jwks_url: String,
    pub tokens_path: PathBuf,
    pub leeway: Duration,
    pub request_timeout: Duration,
}

impl Settings {
    /// Defaults for `instance` with storage under `paths`.
    pub fn for_instance(instance: HubInstance, paths: &ScanPaths) -> Self {
        Self {
            instance,
            hub_url: instance.hub_url().to_string(),
            jwks_url: instance.jwks_url().to_string(),
            tokens_path: paths.tokens_path(),
            leeway: DEFAULT_LEEWAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load settings from the config file under `paths`, then apply the
    /// instance selection from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read,
    /// parsed, or validated. A missing file is not an error.
    pub fn load(
        paths: &ScanPaths,
        instance_env: Option<&str>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let config_path = paths.auth_config_path();
        let (file, source) = if config_path.exists() {
            (Self::read_file(&config_path)?, Some(config_path))
        } else {
            (AuthFileConfig::default(), None)
        };
        file.validate()?;

        let mut warnings = Vec::new();
        let settings = Self::resolve(paths, &file, instance_env, &mut warnings);

        Ok(ConfigLoadResult {
            settings,
            source,
            warnings,
        })
    }

    /// Merge defaults, file values and the instance variable.
    pub fn resolve(
        paths: &ScanPaths,
        file: &AuthFileConfig,
        instance_env: Option<&str>,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Self {
        let instance = match instance_env.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => {
                let instance = HubInstance::from_name(Some(value));
                if instance.name() != value && !value.eq_ignore_ascii_case("production") {
                    warnings.push(ConfigWarning {
                        message: format!(
                            "unknown hub instance '{}', using '{}'",
                            value,
                            instance.name()
                        ),
                    });
                }
                instance
            }
            None => file.instance.unwrap_or_default(),
        };

        let mut settings = Self::for_instance(instance, paths);
        if let Some(url) = &file.hub_url {
            settings.hub_url = url.clone();
        }
        if let Some(url) = &file.jwks_url {
            settings.jwks_url = url.clone();
        }
        if let Some(secs) = file.leeway_secs {
            settings.leeway = Duration::from_secs(secs);
        }
        if let Some(secs) = file.request_timeout_secs {
            settings.request_timeout = Duration::from_secs(secs);
        }
        settings
    }

    fn read_file(path: &Path) -> Result<AuthFileConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
